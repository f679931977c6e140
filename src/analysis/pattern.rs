//! Pattern-based structural analysis for languages without a parse tree.
//!
//! Works line by line with plain substring checks. There are no function
//! boundaries under this strategy, so no per-function quality issues are
//! produced.

use crate::detect::rules;
use crate::language::{Language, LanguageFamily};

use super::{count_lines, Strategy, StructuralAnalyzer, StructuralFinding};

/// Upper bound for the estimated complexity.
pub const COMPLEXITY_CAP: u32 = 20;

/// Keyword tables driving the line heuristics for one language family.
#[derive(Debug, Clone, Copy)]
pub struct PatternProfile {
    /// A line with one of these plus both parentheses counts as a function.
    pub declaration_keywords: &'static [&'static str],
    /// A trimmed line starting with this counts as a class.
    pub class_prefix: &'static str,
    /// A line containing any of these counts as an import.
    pub import_tokens: &'static [&'static str],
    /// Every occurrence of these adds one to the complexity estimate.
    pub complexity_tokens: &'static [&'static str],
}

pub const JAVASCRIPT_PROFILE: PatternProfile = PatternProfile {
    declaration_keywords: &["function ", "const ", "let ", "var "],
    class_prefix: "class ",
    import_tokens: &["import ", "require(", "from "],
    complexity_tokens: &["if (", "while (", "for (", "switch (", "catch (", "&&", "||"],
};

/// Used for Python when the tree-sitter feature is disabled.
pub const PYTHON_PROFILE: PatternProfile = PatternProfile {
    declaration_keywords: &["def "],
    class_prefix: "class ",
    import_tokens: &["import ", "from "],
    complexity_tokens: &["if ", "elif ", "for ", "while ", "except", " and ", " or "],
};

/// Heuristic analyzer driven by a [`PatternProfile`].
pub struct PatternAnalyzer {
    profile: PatternProfile,
}

impl PatternAnalyzer {
    pub fn new(profile: PatternProfile) -> Self {
        Self { profile }
    }

    pub fn for_family(family: LanguageFamily) -> Self {
        match family {
            LanguageFamily::Python => Self::new(PYTHON_PROFILE),
            LanguageFamily::JavaScript => Self::new(JAVASCRIPT_PROFILE),
        }
    }

    fn estimate_complexity(&self, content: &str) -> u32 {
        let branches: usize = self
            .profile
            .complexity_tokens
            .iter()
            .map(|token| content.matches(token).count())
            .sum();
        (1 + branches.min(COMPLEXITY_CAP as usize) as u32).min(COMPLEXITY_CAP)
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new(JAVASCRIPT_PROFILE)
    }
}

impl StructuralAnalyzer for PatternAnalyzer {
    fn strategy(&self) -> Strategy {
        Strategy::Heuristic
    }

    fn analyze(&self, filename: &str, language: Language, content: &str) -> StructuralFinding {
        let mut function_count = 0;
        let mut class_count = 0;
        let mut import_count = 0;

        for line in content.split('\n') {
            let line = line.trim();
            let is_declaration = self
                .profile
                .declaration_keywords
                .iter()
                .any(|k| line.contains(k));
            if is_declaration && line.contains('(') && line.contains(')') {
                function_count += 1;
            }
            if line.starts_with(self.profile.class_prefix) {
                class_count += 1;
            }
            if self.profile.import_tokens.iter().any(|t| line.contains(t)) {
                import_count += 1;
            }
        }

        StructuralFinding {
            filename: filename.to_string(),
            language: language.as_str().to_string(),
            function_count,
            class_count,
            import_count,
            complexity_score: self.estimate_complexity(content),
            lines_of_code: count_lines(content),
            quality_issues: Vec::new(),
            security_patterns: rules::security_hints(language.family(), content),
            parsed: true,
            error: None,
        }
    }
}
