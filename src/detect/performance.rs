//! Performance anti-pattern scanning.

use crate::language::Language;
use crate::score;

use super::rules;
use super::{PerformanceFinding, PerformanceReport};

pub const CLEAN_RECOMMENDATION: &str = "No performance issues detected";
pub const REVIEW_RECOMMENDATION: &str = "Review performance patterns in modified files";
pub const TESTING_RECOMMENDATION: &str = "Consider performance testing for this change";

/// Scan one file. Every match of every rule is recorded.
pub fn scan_file(filename: &str, content: &str) -> Vec<PerformanceFinding> {
    let Some(language) = Language::detect(filename) else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    for rule in rules::performance_rules(language.family()) {
        for mat in rule.regex.find_iter(content) {
            findings.push(PerformanceFinding {
                filename: filename.to_string(),
                pattern: rule.regex.as_str().to_string(),
                description: rule.description.to_string(),
                line: line_of(content, mat.start()),
                snippet: mat.as_str().to_string(),
            });
        }
    }
    findings
}

/// Combine per-file findings (in input order) into a batch report.
pub fn summarize(per_file: Vec<Vec<PerformanceFinding>>) -> PerformanceReport {
    let issues: Vec<PerformanceFinding> = per_file.into_iter().flatten().collect();
    let issue_count = issues.len();

    let mut recommendations = Vec::new();
    if issue_count == 0 {
        recommendations.push(CLEAN_RECOMMENDATION.to_string());
    } else {
        recommendations.push(REVIEW_RECOMMENDATION.to_string());
        if issue_count > score::PERFORMANCE_TESTING_THRESHOLD {
            recommendations.push(TESTING_RECOMMENDATION.to_string());
        }
    }

    PerformanceReport {
        issues,
        issue_count,
        performance_score: score::performance_score(issue_count),
        recommendations,
    }
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_every_match_with_line() {
        let content = "import time\n\nfor i in range(len(xs)):\n    time.sleep(1)\n    time.sleep(2)\n";
        let findings = scan_file("job.py", content);

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].description, "Inefficient loop pattern");
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[1].line, 4);
        assert_eq!(findings[2].line, 5);
        assert_eq!(findings[2].snippet, "time.sleep(");
    }

    #[test]
    fn test_append_anchors_to_line_end() {
        let findings = scan_file("a.py", "out.append(x)\nout.append(y) or z\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 1);
    }

    #[test]
    fn test_javascript_rules() {
        let content = "for (let i = 0; i < items.length; i++) {\n  document.getElementById('a');\n}\nitems.forEach(x => x);\n";
        let findings = scan_file("list.jsx", content);
        let descriptions: Vec<&str> = findings.iter().map(|f| f.description.as_str()).collect();

        assert_eq!(
            descriptions,
            vec![
                "Cache array length in loops",
                "Consider caching DOM elements",
                "Consider for-loop for better performance",
            ]
        );
    }

    #[test]
    fn test_unsupported_file_has_no_findings() {
        assert!(scan_file("notes.txt", "time.sleep(1)").is_empty());
    }

    #[test]
    fn test_clean_batch() {
        let report = summarize(vec![Vec::new(), Vec::new()]);
        assert_eq!(report.issue_count, 0);
        assert_eq!(report.performance_score, 100);
        assert_eq!(report.recommendations, vec![CLEAN_RECOMMENDATION.to_string()]);
    }

    #[test]
    fn test_escalates_above_five_issues() {
        let five = "time.sleep(1)\n".repeat(5);
        let report = summarize(vec![scan_file("a.py", &five)]);
        assert_eq!(report.performance_score, 75);
        assert_eq!(report.recommendations, vec![REVIEW_RECOMMENDATION.to_string()]);

        let six = "time.sleep(1)\n".repeat(6);
        let report = summarize(vec![scan_file("a.py", &six)]);
        assert_eq!(report.performance_score, 70);
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.recommendations[1], TESTING_RECOMMENDATION);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let many = "time.sleep(1)\n".repeat(25);
        let report = summarize(vec![scan_file("a.py", &many)]);
        assert_eq!(report.issue_count, 25);
        assert_eq!(report.performance_score, 0);
    }
}
