//! Label-anchored extraction of typed fields from a narrative reply.
//!
//! The reply is free text. Enumerated and numeric fields are found by
//! searching the uppercased text; paragraph and list fields come from a
//! line state machine where every known label opens a section and ends the
//! previous one. Extraction never fails: each field has a default.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ChangeMetadata;

pub const DEFAULT_OVERALL_SCORE: u8 = 7;
const COMMIT_SUMMARY_FALLBACK: &str = "Code changes analyzed";
const MAX_LIST_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Match order; the first value found wins.
    const PRIORITY: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::High, RiskLevel::Medium];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    BugFix,
    Feature,
    Refactoring,
    Documentation,
    Configuration,
    Security,
    Performance,
    Other,
}

impl ChangeType {
    const COMMIT: [ChangeType; 5] = [
        ChangeType::BugFix,
        ChangeType::Feature,
        ChangeType::Refactoring,
        ChangeType::Documentation,
        ChangeType::Configuration,
    ];

    const PULL_REQUEST: [ChangeType; 6] = [
        ChangeType::Feature,
        ChangeType::BugFix,
        ChangeType::Refactoring,
        ChangeType::Documentation,
        ChangeType::Security,
        ChangeType::Performance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::BugFix => "bug_fix",
            ChangeType::Feature => "feature",
            ChangeType::Refactoring => "refactoring",
            ChangeType::Documentation => "documentation",
            ChangeType::Configuration => "configuration",
            ChangeType::Security => "security",
            ChangeType::Performance => "performance",
            ChangeType::Other => "other",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed fields extracted from a narrative reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub summary: String,
    pub risk_level: RiskLevel,
    pub change_type: ChangeType,
    /// Present for pull-request reviews only.
    pub overall_score: Option<u8>,
    pub impact_areas: Vec<String>,
    pub recommendations: Vec<String>,
    /// The reply, verbatim.
    pub full_analysis: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Summary,
    RiskLevel,
    ChangeType,
    ImpactAreas,
    SecurityAnalysis,
    SecurityConsiderations,
    CodeQuality,
    PerformanceImpact,
    Recommendations,
    OverallScore,
}

impl Label {
    const ALL: [Label; 10] = [
        Label::Summary,
        Label::RiskLevel,
        Label::ChangeType,
        Label::ImpactAreas,
        Label::SecurityAnalysis,
        Label::SecurityConsiderations,
        Label::CodeQuality,
        Label::PerformanceImpact,
        Label::Recommendations,
        Label::OverallScore,
    ];

    fn marker(&self) -> &'static str {
        match self {
            Label::Summary => "SUMMARY:",
            Label::RiskLevel => "RISK LEVEL:",
            Label::ChangeType => "CHANGE TYPE:",
            Label::ImpactAreas => "IMPACT AREAS:",
            Label::SecurityAnalysis => "SECURITY ANALYSIS:",
            Label::SecurityConsiderations => "SECURITY CONSIDERATIONS:",
            Label::CodeQuality => "CODE QUALITY:",
            Label::PerformanceImpact => "PERFORMANCE IMPACT:",
            Label::Recommendations => "RECOMMENDATIONS:",
            Label::OverallScore => "OVERALL SCORE:",
        }
    }

    /// The label a line opens, with the text that follows it on that line.
    fn find(line: &str) -> Option<(Label, &str)> {
        let upper = line.to_uppercase();
        let (label, end) = Label::ALL
            .iter()
            .filter_map(|label| {
                let start = upper.find(label.marker())?;
                Some((*label, start, start + label.marker().len()))
            })
            .min_by_key(|(_, start, _)| *start)
            .map(|(label, _, end)| (label, end))?;
        // Uppercasing can shift byte offsets for some scripts.
        Some((label, line.get(end..).unwrap_or("")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Summary,
    ImpactAreas,
    Recommendations,
    /// A section whose content is not collected.
    Skipped,
}

#[derive(Default)]
struct Sections {
    summary: Vec<String>,
    impact_areas: Vec<String>,
    recommendations: Vec<String>,
}

impl Sections {
    fn collect(reply: &str) -> Self {
        let mut sections = Sections::default();
        let mut state = Section::None;
        let mut visited: Vec<Section> = Vec::new();

        for line in reply.lines() {
            if let Some((label, rest)) = Label::find(line) {
                let next = match label {
                    Label::Summary => Section::Summary,
                    Label::ImpactAreas => Section::ImpactAreas,
                    Label::Recommendations => Section::Recommendations,
                    _ => Section::Skipped,
                };
                // Only the first occurrence of a collected section counts.
                state = if visited.contains(&next) {
                    Section::Skipped
                } else {
                    visited.push(next);
                    next
                };
                // List sections start on the line after their label.
                if state == Section::Summary {
                    sections.push(state, clean_trailing(rest));
                }
                continue;
            }
            sections.push(state, line.trim());
        }
        sections
    }

    fn push(&mut self, state: Section, text: &str) {
        if text.is_empty() {
            return;
        }
        match state {
            Section::Summary => self.summary.push(text.to_string()),
            Section::ImpactAreas => self.impact_areas.push(strip_bullet(text)),
            Section::Recommendations => self.recommendations.push(strip_bullet(text)),
            Section::None | Section::Skipped => {}
        }
    }
}

fn clean_trailing(rest: &str) -> &str {
    rest.trim_matches(|c: char| c == '*' || c.is_whitespace())
}

fn strip_bullet(text: &str) -> String {
    text.strip_prefix('-')
        .or_else(|| text.strip_prefix('•'))
        .unwrap_or(text)
        .trim()
        .to_string()
}

lazy_static! {
    static ref OVERALL_SCORE: Regex = Regex::new(r"OVERALL SCORE:\s*(\d+)").unwrap();
}

/// Whether `upper` holds `LABEL:` followed (after optional whitespace) by `value`.
fn labelled_value(upper: &str, label: Label, value: &str) -> bool {
    let marker = label.marker();
    upper.match_indices(marker).any(|(start, _)| {
        upper[start + marker.len()..]
            .trim_start()
            .starts_with(value)
    })
}

fn risk_level(upper: &str) -> RiskLevel {
    RiskLevel::PRIORITY
        .into_iter()
        .find(|level| labelled_value(upper, Label::RiskLevel, &level.as_str().to_uppercase()))
        .unwrap_or(RiskLevel::Medium)
}

fn change_type(upper: &str, candidates: &[ChangeType]) -> ChangeType {
    candidates
        .iter()
        .copied()
        .find(|ct| {
            let value = ct.as_str().to_uppercase();
            labelled_value(upper, Label::ChangeType, &value)
                || labelled_value(upper, Label::ChangeType, &value.replace('_', " "))
        })
        .unwrap_or(ChangeType::Other)
}

fn overall_score(upper: &str) -> u8 {
    OVERALL_SCORE
        .captures(upper)
        .and_then(|caps| caps.get(1))
        .map(|digits| match digits.as_str().parse::<u64>() {
            Ok(n) => n.clamp(1, 10) as u8,
            // Only overflow gets here: too many digits to parse.
            Err(_) => 10,
        })
        .unwrap_or(DEFAULT_OVERALL_SCORE)
}

fn summary_fallback(metadata: &ChangeMetadata) -> String {
    match metadata {
        ChangeMetadata::Commit { .. } => COMMIT_SUMMARY_FALLBACK.to_string(),
        ChangeMetadata::PullRequest { number, title, .. } => {
            format!("Analysis of PR #{}: {}", number, title)
        }
    }
}

/// Extract typed fields from a narrative reply.
pub fn extract(reply: &str, metadata: &ChangeMetadata) -> Narrative {
    let upper = reply.to_uppercase();
    let sections = Sections::collect(reply);

    let summary = if sections.summary.is_empty() {
        summary_fallback(metadata)
    } else {
        sections.summary.join(" ")
    };

    let (change_type, overall_score) = if metadata.is_pull_request() {
        (
            change_type(&upper, &ChangeType::PULL_REQUEST),
            Some(overall_score(&upper)),
        )
    } else {
        (change_type(&upper, &ChangeType::COMMIT), None)
    };

    let mut impact_areas = sections.impact_areas;
    impact_areas.truncate(MAX_LIST_ITEMS);
    let mut recommendations = sections.recommendations;
    recommendations.truncate(MAX_LIST_ITEMS);

    Narrative {
        summary,
        risk_level: risk_level(&upper),
        change_type,
        overall_score,
        impact_areas,
        recommendations,
        full_analysis: reply.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::{CommitStats, PullRequestStats};

    fn commit() -> ChangeMetadata {
        ChangeMetadata::Commit {
            sha: "abc123".to_string(),
            message: "Fix login".to_string(),
            author: "dev".to_string(),
            date: "2024-05-01".to_string(),
            stats: CommitStats::default(),
        }
    }

    fn pull_request() -> ChangeMetadata {
        ChangeMetadata::PullRequest {
            number: 17,
            title: "Add caching".to_string(),
            author: "dev".to_string(),
            head_branch: "cache".to_string(),
            base_branch: "main".to_string(),
            description: None,
            stats: PullRequestStats::default(),
        }
    }

    #[test]
    fn test_risk_level_high() {
        let n = extract("SUMMARY: ok\nRISK LEVEL: HIGH\n", &commit());
        assert_eq!(n.risk_level, RiskLevel::High);
        assert_eq!(n.risk_level.as_str(), "high");
    }

    #[test]
    fn test_risk_level_defaults_to_medium() {
        let n = extract("SUMMARY: fine\n", &commit());
        assert_eq!(n.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_risk_level_is_case_insensitive_and_prioritized() {
        let n = extract("Risk Level: low\nrisk level: high\n", &commit());
        assert_eq!(n.risk_level, RiskLevel::Low);

        let n = extract("RISK LEVEL: [LOW/MEDIUM/HIGH]\n", &commit());
        assert_eq!(n.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_summary_paragraph() {
        let reply = "SUMMARY: Adds a cache\nlayer for lookups.\n\nand warms it on start.\nRISK LEVEL: LOW\nmore text\n";
        let n = extract(reply, &commit());
        assert_eq!(n.summary, "Adds a cache layer for lookups. and warms it on start.");
    }

    #[test]
    fn test_summary_on_following_lines() {
        let reply = "**SUMMARY:**\nRefactors the parser.\nIMPACT AREAS:\n- parser\n";
        let n = extract(reply, &commit());
        assert_eq!(n.summary, "Refactors the parser.");
    }

    #[test]
    fn test_summary_terminated_by_any_label() {
        let reply = "SUMMARY:\nFirst.\nSECURITY CONSIDERATIONS: none\nSecond.\n";
        let n = extract(reply, &commit());
        assert_eq!(n.summary, "First.");
    }

    #[test]
    fn test_summary_fallbacks() {
        assert_eq!(extract("nothing useful", &commit()).summary, "Code changes analyzed");
        assert_eq!(
            extract("nothing useful", &pull_request()).summary,
            "Analysis of PR #17: Add caching"
        );
    }

    #[test]
    fn test_recommendations_truncated_and_unbulleted() {
        let reply = "RECOMMENDATIONS:\n- one\n• two\n- three\nfour\n- five\n- six\n- seven\nOVERALL SCORE: 8\n";
        let n = extract(reply, &pull_request());
        assert_eq!(n.recommendations, vec!["one", "two", "three", "four", "five"]);
        assert_eq!(n.overall_score, Some(8));
    }

    #[test]
    fn test_list_label_line_text_is_not_an_item() {
        let reply = "RECOMMENDATIONS: Overall looks good, a few notes:\n- one\n- two\n";
        let n = extract(reply, &pull_request());
        assert_eq!(n.recommendations, vec!["one", "two"]);

        let reply = "IMPACT AREAS: several\n- auth\n";
        let n = extract(reply, &commit());
        assert_eq!(n.impact_areas, vec!["auth"]);
    }

    #[test]
    fn test_leftmost_label_opens_the_section() {
        let reply = "RECOMMENDATIONS: see SUMMARY: above\n- cache results\n";
        let n = extract(reply, &pull_request());
        assert_eq!(n.recommendations, vec!["cache results"]);
        assert_eq!(n.summary, "Analysis of PR #17: Add caching");
    }

    #[test]
    fn test_impact_areas() {
        let reply = "IMPACT AREAS:\n- auth\n- session store\n\nCODE QUALITY:\nGood.\n";
        let n = extract(reply, &commit());
        assert_eq!(n.impact_areas, vec!["auth", "session store"]);
    }

    #[test]
    fn test_commit_change_type() {
        let n = extract("CHANGE TYPE:\nbug fix\n", &commit());
        assert_eq!(n.change_type, ChangeType::BugFix);

        let n = extract("CHANGE TYPE: configuration\n", &commit());
        assert_eq!(n.change_type, ChangeType::Configuration);

        // security is not a commit change type
        let n = extract("CHANGE TYPE: security\n", &commit());
        assert_eq!(n.change_type, ChangeType::Other);
    }

    #[test]
    fn test_pull_request_change_type() {
        let n = extract("CHANGE TYPE: PERFORMANCE\n", &pull_request());
        assert_eq!(n.change_type, ChangeType::Performance);

        let n = extract("CHANGE TYPE: bug_fix\n", &pull_request());
        assert_eq!(n.change_type, ChangeType::BugFix);

        let n = extract("no label here: feature", &pull_request());
        assert_eq!(n.change_type, ChangeType::Other);
    }

    #[test]
    fn test_overall_score_clamped() {
        assert_eq!(extract("OVERALL SCORE: 42", &pull_request()).overall_score, Some(10));
        assert_eq!(extract("overall score: 0/10", &pull_request()).overall_score, Some(1));
        assert_eq!(extract("OVERALL SCORE: n/a", &pull_request()).overall_score, Some(7));
        assert_eq!(extract("OVERALL SCORE: 9", &commit()).overall_score, None);
    }

    #[test]
    fn test_malformed_reply_uses_defaults() {
        let reply = ":::\n\u{0}\nRECOMMENDATIONS:";
        let n = extract(reply, &pull_request());
        assert_eq!(n.risk_level, RiskLevel::Medium);
        assert_eq!(n.change_type, ChangeType::Other);
        assert_eq!(n.overall_score, Some(DEFAULT_OVERALL_SCORE));
        assert!(n.recommendations.is_empty());
        assert_eq!(n.full_analysis, reply);
    }
}
