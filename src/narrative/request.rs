//! Narrative request rendering.

use std::fmt::Write;

use crate::aggregate::AggregateReport;

use super::{ChangeMetadata, FileChange};

/// Pull-request patches this long or longer are left out entirely.
pub const PR_PATCH_CEILING: usize = 1000;

const DEFAULT_EXCERPT_CHARS: usize = 500;
const DEFAULT_MAX_FILES: usize = 20;
const DESCRIPTION_CHARS: usize = 500;

const COMMIT_PREAMBLE: &str = "You are an expert code reviewer and software engineer. \
Please analyze the following code changes and provide a comprehensive review.";

const PULL_REQUEST_PREAMBLE: &str = "You are a senior software architect and security expert \
reviewing a pull request. Provide a comprehensive technical review.";

const COMMIT_SCHEMA: &str = "\
Please provide your analysis in the following structured format:

SUMMARY:
[2-3 sentence overview of what this commit does]

RISK LEVEL: [LOW/MEDIUM/HIGH]

IMPACT AREAS:
[List the main areas of the codebase affected]

CODE QUALITY:
[Assessment of code quality, potential issues, best practices]

SECURITY CONSIDERATIONS:
[Any security implications or concerns]

RECOMMENDATIONS:
[Specific suggestions for improvement or areas to watch]

CHANGE TYPE:
[bug_fix/feature/refactoring/documentation/configuration/other]

Keep your analysis concise but thorough, focusing on practical insights for code review.
";

const PULL_REQUEST_SCHEMA: &str = "\
Provide analysis in this EXACT format:

SUMMARY:
[2-3 sentence overview of what this PR accomplishes]

RISK LEVEL: [LOW/MEDIUM/HIGH]

CHANGE TYPE: [feature/bug_fix/refactoring/documentation/security/performance/other]

IMPACT AREAS:
[List main system components affected]

SECURITY ANALYSIS:
[Security implications, vulnerabilities, or improvements]

CODE QUALITY:
[Assessment of code structure, patterns, and maintainability]

PERFORMANCE IMPACT:
[Potential performance effects]

RECOMMENDATIONS:
[Specific actionable suggestions for improvement]

OVERALL SCORE: [1-10 where 10 is excellent]

Focus on technical depth, security implications, and actionable insights for the development team.
";

/// Renders the bounded text document sent to the narrative service.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder {
    excerpt_chars: usize,
    max_files: usize,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_EXCERPT_CHARS, DEFAULT_MAX_FILES)
    }
}

impl RequestBuilder {
    /// `excerpt_chars` caps each embedded patch; `max_files` caps the
    /// files of a pull-request request. Commit requests embed every file.
    pub fn new(excerpt_chars: usize, max_files: usize) -> Self {
        Self {
            excerpt_chars,
            max_files,
        }
    }

    pub fn build(
        &self,
        metadata: &ChangeMetadata,
        files: &[FileChange],
        report: Option<&AggregateReport>,
    ) -> String {
        let mut out = String::new();
        match metadata {
            ChangeMetadata::Commit {
                sha,
                message,
                author,
                date,
                stats,
            } => {
                let _ = writeln!(out, "{}\n", COMMIT_PREAMBLE);
                let _ = writeln!(out, "COMMIT INFORMATION:");
                let _ = writeln!(out, "- Commit SHA: {}", sha);
                let _ = writeln!(out, "- Message: {}", message);
                let _ = writeln!(out, "- Author: {}", author);
                let _ = writeln!(out, "- Date: {}", date);
                let _ = writeln!(out, "- Total Changes: {} lines", stats.total);
                let _ = writeln!(out, "- Additions: +{}", stats.additions);
                let _ = writeln!(out, "- Deletions: -{}", stats.deletions);

                out.push_str("\nFILES CHANGED:\n");
                for file in files {
                    self.write_file(&mut out, file, file.patch.as_deref(), report);
                }
            }
            ChangeMetadata::PullRequest {
                number,
                title,
                author,
                head_branch,
                base_branch,
                description,
                stats,
            } => {
                let _ = writeln!(out, "{}\n", PULL_REQUEST_PREAMBLE);
                let _ = writeln!(out, "PULL REQUEST INFORMATION:");
                let _ = writeln!(out, "- PR #{}: {}", number, title);
                let _ = writeln!(out, "- Author: {}", author);
                let _ = writeln!(out, "- Branches: {} → {}", head_branch, base_branch);
                let _ = writeln!(out, "- Files Changed: {}", stats.total_files);
                let _ = writeln!(out, "- Total Changes: {} lines", stats.total_changes);
                let _ = writeln!(out, "- Additions: +{}", stats.additions);
                let _ = writeln!(out, "- Deletions: -{}", stats.deletions);

                let description = description
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .map(|d| truncate(d, DESCRIPTION_CHARS))
                    .unwrap_or_else(|| "No description provided".to_string());
                let _ = writeln!(out, "\nDESCRIPTION:\n{}", description);

                out.push_str("\nFILES CHANGED:\n");
                for file in files.iter().take(self.max_files) {
                    let patch = file
                        .patch
                        .as_deref()
                        .filter(|p| p.chars().count() < PR_PATCH_CEILING);
                    self.write_file(&mut out, file, patch, report);
                }
                if files.len() > self.max_files {
                    let _ = writeln!(
                        out,
                        "\n({} more files not shown)",
                        files.len() - self.max_files
                    );
                }
            }
        }

        if let Some(report) = report {
            write_static_analysis(&mut out, report);
        }

        out.push('\n');
        out.push_str(if metadata.is_pull_request() {
            PULL_REQUEST_SCHEMA
        } else {
            COMMIT_SCHEMA
        });
        out
    }

    fn write_file(
        &self,
        out: &mut String,
        file: &FileChange,
        patch: Option<&str>,
        report: Option<&AggregateReport>,
    ) {
        let _ = writeln!(out, "\nFile: {}", file.filename);
        let _ = writeln!(out, "Status: {}", file.status);
        let _ = writeln!(out, "Changes: +{} -{}", file.additions, file.deletions);
        if let Some(patch) = patch.filter(|p| !p.is_empty()) {
            let _ = writeln!(out, "Code diff:\n{}...", truncate(patch, self.excerpt_chars));
        }
        if let Some(line) = report.and_then(|r| analysis_line(r, &file.filename)) {
            let _ = writeln!(out, "{}", line);
        }
    }
}

/// One-line structural summary of a file, if the report covers it.
fn analysis_line(report: &AggregateReport, filename: &str) -> Option<String> {
    let metrics = report.file(filename)?;
    let finding = &metrics.finding;
    if !finding.parsed {
        return Some(format!(
            "Analysis: {}, not analyzed ({})",
            finding.language,
            finding.error.as_deref().unwrap_or("unknown error")
        ));
    }

    let mut security: Vec<&str> = finding.security_patterns.iter().map(String::as_str).collect();
    if let Some(scan) = report.security_scan(filename) {
        for f in &scan.findings {
            if !security.contains(&f.description.as_str()) {
                security.push(&f.description);
            }
        }
    }

    Some(format!(
        "Analysis: {}, {} functions, {} classes, complexity {}; security: {}; quality: {}",
        finding.language,
        finding.function_count,
        finding.class_count,
        finding.complexity_score,
        join_or_none(&security),
        join_or_none(
            &finding
                .quality_issues
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
        ),
    ))
}

fn write_static_analysis(out: &mut String, report: &AggregateReport) {
    let s = &report.structure;
    let _ = writeln!(out, "\nSTATIC ANALYSIS:");
    let _ = writeln!(
        out,
        "- Files analyzed: {} ({} parsed)",
        s.total_files_analyzed, s.parsed_files
    );
    let _ = writeln!(
        out,
        "- Functions: {}, classes: {}, average complexity: {:.1}",
        s.total_functions, s.total_classes, s.average_complexity
    );
    let high: Vec<&str> = s.high_complexity_files.iter().map(String::as_str).collect();
    let _ = writeln!(out, "- High complexity files: {}", join_or_none(&high));
    let _ = writeln!(
        out,
        "- Average maintainability: {:.1}, technical debt: {:.1}",
        report.average_maintainability, report.average_technical_debt
    );
    let _ = writeln!(
        out,
        "- Security risk score: {} ({} critical, {} high)",
        report.security.overall_risk_score,
        report.security.critical_issues_count,
        report.security.high_issues_count
    );
    let _ = writeln!(
        out,
        "- Performance score: {} ({} issues)",
        report.performance.performance_score, report.performance.issue_count
    );
    let _ = writeln!(
        out,
        "- Cross-file connections: {}",
        report.dependencies.cross_file_connections.len()
    );
    let risks: Vec<&str> = report.dependencies.risks.iter().map(String::as_str).collect();
    let _ = writeln!(out, "- Dependency risks: {}", join_or_none(&risks));
}

fn join_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregator, FileScan};
    use crate::analysis::AnalyzerSet;
    use crate::detect::{performance, security, DependencyReport};
    use crate::narrative::{CommitStats, PullRequestStats};

    fn commit() -> ChangeMetadata {
        ChangeMetadata::Commit {
            sha: "9f2c1e".to_string(),
            message: "Tighten validation".to_string(),
            author: "dev".to_string(),
            date: "2024-05-01T10:00:00Z".to_string(),
            stats: CommitStats {
                total: 12,
                additions: 10,
                deletions: 2,
            },
        }
    }

    fn pull_request(description: Option<String>) -> ChangeMetadata {
        ChangeMetadata::PullRequest {
            number: 7,
            title: "Add cache".to_string(),
            author: "dev".to_string(),
            head_branch: "feat/cache".to_string(),
            base_branch: "main".to_string(),
            description,
            stats: PullRequestStats::default(),
        }
    }

    fn change(name: &str, patch: Option<String>) -> FileChange {
        FileChange {
            filename: name.to_string(),
            status: "modified".to_string(),
            additions: 1,
            deletions: 0,
            patch,
        }
    }

    #[test]
    fn test_commit_request() {
        let patch = "x".repeat(800);
        let text = RequestBuilder::default().build(&commit(), &[change("a.py", Some(patch))], None);

        assert!(text.contains("- Commit SHA: 9f2c1e"));
        assert!(text.contains("- Total Changes: 12 lines"));
        assert!(text.contains(&format!("Code diff:\n{}...\n", "x".repeat(500))));
        assert!(!text.contains(&"x".repeat(501)));
        assert!(!text.contains("STATIC ANALYSIS:"));
        assert!(text.contains("SECURITY CONSIDERATIONS:"));
        assert!(text.trim_end().ends_with("focusing on practical insights for code review."));
        assert!(!text.contains("OVERALL SCORE:"));
    }

    #[test]
    fn test_pull_request_caps_files_and_patches() {
        let mut files: Vec<FileChange> = (0..25)
            .map(|i| change(&format!("f{}.js", i), Some("short".to_string())))
            .collect();
        files[0].patch = Some("y".repeat(PR_PATCH_CEILING));

        let text = RequestBuilder::default().build(&pull_request(None), &files, None);

        assert_eq!(text.matches("\nFile: ").count(), 20);
        assert!(!text.contains("f20.js"));
        assert!(text.contains("(5 more files not shown)"));
        assert!(!text.contains("yyyy"));
        assert_eq!(text.matches("Code diff:\nshort...").count(), 19);
        assert!(text.contains("No description provided"));
        assert!(text.contains("- Branches: feat/cache → main"));
        assert!(text.contains("OVERALL SCORE: [1-10 where 10 is excellent]"));
    }

    #[test]
    fn test_pull_request_description_truncated() {
        let description = "d".repeat(700);
        let text = RequestBuilder::default().build(&pull_request(Some(description)), &[], None);
        assert!(text.contains(&format!("DESCRIPTION:\n{}\n", "d".repeat(500))));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let patch = "é".repeat(600);
        let text = RequestBuilder::new(3, 20).build(&commit(), &[change("a.py", Some(patch))], None);
        assert!(text.contains("Code diff:\nééé...\n"));
    }

    #[test]
    fn test_analysis_line_and_static_block() {
        let content = "import os\n\ndef run(cmd):\n    if cmd:\n        os.system(cmd)\n";
        let analyzers = AnalyzerSet::new();
        let scan = FileScan {
            structure: analyzers.analyze("tool.py", content),
            security: security::scan_file("tool.py", content),
            performance: performance::scan_file("tool.py", content),
        };
        let report = Aggregator::default().aggregate(vec![scan], DependencyReport::default());

        let text = RequestBuilder::default().build(
            &commit(),
            &[change("tool.py", None), change("README.md", None)],
            Some(&report),
        );

        assert!(text.contains(
            "Analysis: python, 1 functions, 0 classes, complexity 2; \
             security: os.system() is vulnerable to injection, OS command execution; quality: none"
        ));
        assert_eq!(text.matches("Analysis: ").count(), 1);
        assert!(text.contains("STATIC ANALYSIS:\n- Files analyzed: 1 (1 parsed)"));
        assert!(text.contains("- Security risk score: 5 (0 critical, 1 high)"));
        assert!(text.find("STATIC ANALYSIS:") < text.find("SUMMARY:"));
    }
}
