//! Core types for scanner results.

use serde::{Deserialize, Serialize};

use crate::score::TierCounts;

/// Security severity tiers, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// All tiers in scan order.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// One matched security pattern in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub filename: String,
    pub pattern: String,
    pub description: String,
    pub severity: Severity,
}

/// Security scan of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSecurityScan {
    pub filename: String,
    /// Language family tag, or "unknown" when no rules apply.
    pub language: String,
    /// Findings in tier order, then pattern order.
    pub findings: Vec<SecurityFinding>,
    pub counts: TierCounts,
    pub risk_score: u32,
}

impl FileSecurityScan {
    /// Findings for a single tier.
    pub fn tier(&self, severity: Severity) -> impl Iterator<Item = &SecurityFinding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }
}

/// Security scan of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub file_scans: Vec<FileSecurityScan>,
    pub overall_risk_score: u32,
    pub critical_issues_count: usize,
    pub high_issues_count: usize,
    pub counts: TierCounts,
    pub recommendations: Vec<String>,
}

/// One matched performance anti-pattern occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceFinding {
    pub filename: String,
    pub pattern: String,
    pub description: String,
    /// 1-indexed line where the match starts.
    pub line: usize,
    /// The matched text.
    pub snippet: String,
}

/// Performance scan of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub issues: Vec<PerformanceFinding>,
    pub issue_count: usize,
    pub performance_score: u32,
    pub recommendations: Vec<String>,
}
