//! Static pattern tables.
//!
//! Tables map a language family to its rules. They are compiled once on
//! first use and never change afterwards.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

use super::Severity;
use crate::language::LanguageFamily;

/// A compiled rule with its description.
pub struct Rule {
    pub regex: Regex,
    pub description: &'static str,
}

/// A security rule tagged with its tier.
pub struct TieredRule {
    pub severity: Severity,
    pub rule: Rule,
}

const PYTHON_SECURITY: &[(Severity, &str, &str)] = &[
    (Severity::Critical, r"eval\s*\(", "Dangerous eval() usage"),
    (Severity::Critical, r"exec\s*\(", "Dangerous exec() usage"),
    (Severity::Critical, r"pickle\.loads?\s*\(", "Unsafe pickle deserialization"),
    (Severity::Critical, r"subprocess\..*shell\s*=\s*True", "Shell injection risk"),
    (Severity::High, r"os\.system\s*\(", "OS command execution"),
    (Severity::High, r"__import__\s*\(", "Dynamic import risk"),
    (Severity::High, r"input\s*\([^)]*\)", "User input without validation"),
    (Severity::Medium, r"yaml\.load\s*\(", "Unsafe YAML loading"),
    (Severity::Medium, r"hashlib\.(md5|sha1)\s*\(", "Weak hash algorithm"),
    (Severity::Medium, r"verify\s*=\s*False", "TLS certificate verification disabled"),
    (Severity::Low, r"^\s*assert\s", "Assert statements are stripped with -O"),
    (Severity::Low, r"tempfile\.mktemp\s*\(", "Insecure temporary file creation"),
];

const JAVASCRIPT_SECURITY: &[(Severity, &str, &str)] = &[
    (Severity::Critical, r"eval\s*\(", "Dangerous eval() usage"),
    (Severity::Critical, r"innerHTML\s*=", "XSS vulnerability risk"),
    (Severity::Critical, r"document\.write\s*\(", "XSS vulnerability risk"),
    (Severity::High, r#"setTimeout\s*\(['"][^'"]*['"]"#, "String-based setTimeout"),
    (Severity::High, r#"setInterval\s*\(['"][^'"]*['"]"#, "String-based setInterval"),
    (Severity::Medium, r"new\s+Function\s*\(", "Dynamic code construction"),
    (Severity::Medium, r"localStorage\.setItem\s*\(", "Sensitive data in local storage"),
    (Severity::Low, r"console\.log\s*\(", "Debug logging left in code"),
    (Severity::Low, r"Math\.random\s*\(", "Non-cryptographic randomness"),
];

const PYTHON_PERFORMANCE: &[(&str, &str)] = &[
    (r"for.*in.*range\(len\(", "Inefficient loop pattern"),
    (r"\.append\s*\(.*\)\s*$", "List append in loop (consider list comprehension)"),
    (r"time\.sleep\s*\(", "Blocking sleep operation"),
    (r"\.join\s*\(\s*\[.*for.*in.*\]", "String join with generator preferred"),
];

const JAVASCRIPT_PERFORMANCE: &[(&str, &str)] = &[
    (r"for\s*\(.*\.length.*\)", "Cache array length in loops"),
    (r"document\.getElementById", "Consider caching DOM elements"),
    (r"setInterval.*\d+ms", "High-frequency intervals"),
    (r"\.forEach\s*\(.*=>", "Consider for-loop for better performance"),
];

const PYTHON_IMPORTS: &[&str] = &[
    r"^import\s+(\w+)",
    r"^from\s+(\w+)\s+import",
    r"^from\s+(\.+\w*)\s+import",
];

const JAVASCRIPT_IMPORTS: &[&str] = &[
    r#"import.*from\s+['"]([^'"]+)['"]"#,
    r#"require\(['"]([^'"]+)['"]\)"#,
    r#"import\s+['"]([^'"]+)['"]"#,
];

/// Substring hints attached to structural findings.
const PYTHON_HINTS: &[(&str, &str)] = &[
    ("eval(", "Use of eval() can be dangerous"),
    ("exec(", "Use of exec() can be dangerous"),
    ("__import__(", "Dynamic imports can be risky"),
    ("subprocess.", "Subprocess calls need validation"),
    ("os.system(", "os.system() is vulnerable to injection"),
    ("pickle.loads(", "Pickle deserialization can be dangerous"),
];

const JAVASCRIPT_HINTS: &[(&str, &str)] = &[
    ("eval(", "Use of eval() can be dangerous"),
    ("innerHTML", "innerHTML can lead to XSS vulnerabilities"),
    ("document.write(", "document.write() can be unsafe"),
    ("setTimeout(", "setTimeout with string parameter can be risky"),
    ("setInterval(", "setInterval with string parameter can be risky"),
];

fn compile(pattern: &str, case_insensitive: bool, multi_line: bool) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .multi_line(multi_line)
        .build()
        .unwrap()
}

fn compile_security(table: &[(Severity, &str, &'static str)]) -> Vec<TieredRule> {
    let mut rules: Vec<TieredRule> = table
        .iter()
        .map(|(severity, pattern, description)| TieredRule {
            severity: *severity,
            rule: Rule {
                regex: compile(pattern, true, true),
                description: *description,
            },
        })
        .collect();
    // Stable sort keeps pattern order within a tier.
    rules.sort_by_key(|r| r.severity);
    rules
}

fn compile_rules(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, description)| Rule {
            regex: compile(pattern, false, true),
            description: *description,
        })
        .collect()
}

fn compile_imports(table: &[&str]) -> Vec<Regex> {
    table.iter().map(|p| compile(p, false, true)).collect()
}

lazy_static::lazy_static! {
    static ref SECURITY: HashMap<LanguageFamily, Vec<TieredRule>> = {
        let mut m = HashMap::new();
        m.insert(LanguageFamily::Python, compile_security(PYTHON_SECURITY));
        m.insert(LanguageFamily::JavaScript, compile_security(JAVASCRIPT_SECURITY));
        m
    };

    static ref PERFORMANCE: HashMap<LanguageFamily, Vec<Rule>> = {
        let mut m = HashMap::new();
        m.insert(LanguageFamily::Python, compile_rules(PYTHON_PERFORMANCE));
        m.insert(LanguageFamily::JavaScript, compile_rules(JAVASCRIPT_PERFORMANCE));
        m
    };

    static ref IMPORTS: HashMap<LanguageFamily, Vec<Regex>> = {
        let mut m = HashMap::new();
        m.insert(LanguageFamily::Python, compile_imports(PYTHON_IMPORTS));
        m.insert(LanguageFamily::JavaScript, compile_imports(JAVASCRIPT_IMPORTS));
        m
    };
}

/// Security rules for a family, critical tier first.
pub fn security_rules(family: LanguageFamily) -> &'static [TieredRule] {
    SECURITY.get(&family).map(Vec::as_slice).unwrap_or(&[])
}

/// Performance anti-pattern rules for a family.
pub fn performance_rules(family: LanguageFamily) -> &'static [Rule] {
    PERFORMANCE.get(&family).map(Vec::as_slice).unwrap_or(&[])
}

/// Import-statement patterns for a family. Capture group 1 is the module.
pub fn import_patterns(family: LanguageFamily) -> &'static [Regex] {
    IMPORTS.get(&family).map(Vec::as_slice).unwrap_or(&[])
}

/// Descriptions of every substring hint present in `content`, in table order.
pub fn security_hints(family: LanguageFamily, content: &str) -> Vec<String> {
    let table = match family {
        LanguageFamily::Python => PYTHON_HINTS,
        LanguageFamily::JavaScript => JAVASCRIPT_HINTS,
    };
    table
        .iter()
        .filter(|(needle, _)| content.contains(needle))
        .map(|(_, description)| description.to_string())
        .collect()
}
