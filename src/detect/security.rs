//! Severity-tiered security pattern scanning.

use crate::language::Language;
use crate::score::{self, TierCounts};

use super::rules;
use super::{FileSecurityScan, SecurityFinding, SecurityReport, Severity};

pub const CRITICAL_RECOMMENDATION: &str =
    "URGENT: Address critical security vulnerabilities immediately";
pub const HIGH_RECOMMENDATION: &str = "Review and fix high-risk security patterns";

/// Scan one file against its family's security rules.
///
/// Each rule contributes at most one finding per file. Files whose
/// language is not supported produce an empty scan.
pub fn scan_file(filename: &str, content: &str) -> FileSecurityScan {
    let language = Language::detect(filename);
    let mut findings = Vec::new();
    let mut counts = TierCounts::default();

    if let Some(language) = language {
        for tiered in rules::security_rules(language.family()) {
            if tiered.rule.regex.is_match(content) {
                match tiered.severity {
                    Severity::Critical => counts.critical += 1,
                    Severity::High => counts.high += 1,
                    Severity::Medium => counts.medium += 1,
                    Severity::Low => counts.low += 1,
                }
                findings.push(SecurityFinding {
                    filename: filename.to_string(),
                    pattern: tiered.rule.regex.as_str().to_string(),
                    description: tiered.rule.description.to_string(),
                    severity: tiered.severity,
                });
            }
        }
    }

    FileSecurityScan {
        filename: filename.to_string(),
        language: language
            .map(|l| l.family().as_str())
            .unwrap_or(crate::analysis::UNKNOWN_LANGUAGE)
            .to_string(),
        findings,
        risk_score: score::risk_score(&counts),
        counts,
    }
}

/// Combine per-file scans into a batch report.
pub fn summarize(file_scans: Vec<FileSecurityScan>) -> SecurityReport {
    let mut counts = TierCounts::default();
    let mut overall_risk_score = 0;
    for scan in &file_scans {
        counts.merge(&scan.counts);
        overall_risk_score += scan.risk_score;
    }

    SecurityReport {
        overall_risk_score,
        critical_issues_count: counts.critical,
        high_issues_count: counts.high,
        recommendations: recommendations(&counts),
        counts,
        file_scans,
    }
}

fn recommendations(counts: &TierCounts) -> Vec<String> {
    let mut recs = Vec::new();
    if counts.critical > 0 {
        recs.push(CRITICAL_RECOMMENDATION.to_string());
    }
    if counts.high > 0 {
        recs.push(HIGH_RECOMMENDATION.to_string());
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_and_os_system() {
        let scan = scan_file(
            "tasks.py",
            "import os\nresult = eval(expr)\nos.system(cmd)\n",
        );

        assert_eq!(scan.findings.len(), 2);
        assert_eq!(scan.findings[0].severity, Severity::Critical);
        assert_eq!(scan.findings[0].description, "Dangerous eval() usage");
        assert_eq!(scan.findings[1].severity, Severity::High);
        assert_eq!(scan.findings[1].description, "OS command execution");
        assert_eq!(scan.risk_score, 15);
    }

    #[test]
    fn test_one_finding_per_pattern() {
        let scan = scan_file("a.py", "eval(a)\neval(b)\nEVAL (c)\n");
        assert_eq!(scan.findings.len(), 1);
        assert_eq!(scan.risk_score, 10);
    }

    #[test]
    fn test_case_insensitive() {
        let scan = scan_file("page.js", "el.INNERHTML = html;\n");
        assert_eq!(scan.counts.critical, 1);
    }

    #[test]
    fn test_typescript_uses_javascript_rules() {
        let scan = scan_file("view.tsx", "setTimeout(\"tick()\", 100);\nconsole.log(x);\n");
        assert_eq!(scan.language, "javascript");
        assert_eq!(scan.counts.high, 1);
        assert_eq!(scan.counts.low, 1);
        assert_eq!(scan.risk_score, 6);
    }

    #[test]
    fn test_unsupported_language_is_clean() {
        let scan = scan_file("run.sh", "eval $(cat x)");
        assert_eq!(scan.language, "unknown");
        assert!(scan.findings.is_empty());
        assert_eq!(scan.risk_score, 0);
    }

    #[test]
    fn test_summary_recommendations() {
        let report = summarize(vec![
            scan_file("a.py", "eval(x)\n"),
            scan_file("b.py", "os.system(y)\n"),
            scan_file("c.py", "print('ok')\n"),
        ]);

        assert_eq!(report.overall_risk_score, 15);
        assert_eq!(report.critical_issues_count, 1);
        assert_eq!(report.high_issues_count, 1);
        assert_eq!(
            report.recommendations,
            vec![
                CRITICAL_RECOMMENDATION.to_string(),
                HIGH_RECOMMENDATION.to_string()
            ]
        );
    }

    #[test]
    fn test_summary_is_order_independent() {
        let files = [
            ("a.py", "eval(x)\nyaml.load(f)\n"),
            ("b.js", "document.write(s); console.log(s);\n"),
            ("c.py", "hashlib.md5(b)\nos.system(c)\n"),
        ];
        let forward = summarize(files.iter().map(|(f, c)| scan_file(f, c)).collect());
        let backward = summarize(files.iter().rev().map(|(f, c)| scan_file(f, c)).collect());

        assert_eq!(forward.overall_risk_score, backward.overall_risk_score);
        assert_eq!(forward.counts, backward.counts);
    }

    #[test]
    fn test_clean_batch_has_no_recommendations() {
        let report = summarize(vec![scan_file("a.py", "x = 1\n")]);
        assert_eq!(report.overall_risk_score, 0);
        assert!(report.recommendations.is_empty());
    }
}
