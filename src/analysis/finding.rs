//! Per-file structural findings and the metrics derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::score;

/// Language tag recorded for files the classifier does not support.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Structural metrics for a single file.
///
/// Created once per file and never mutated afterwards. When `parsed` is
/// false only `filename`, `language` and `error` carry meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralFinding {
    pub filename: String,
    pub language: String,
    pub function_count: usize,
    pub class_count: usize,
    pub import_count: usize,
    /// Cyclomatic complexity, never below 1.
    pub complexity_score: u32,
    pub lines_of_code: usize,
    pub quality_issues: Vec<String>,
    pub security_patterns: Vec<String>,
    pub parsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StructuralFinding {
    /// A finding for a file that could not be structurally analyzed.
    pub fn unparsed(filename: &str, language: &str, error: impl Into<String>) -> Self {
        Self {
            filename: filename.to_string(),
            language: language.to_string(),
            function_count: 0,
            class_count: 0,
            import_count: 0,
            complexity_score: 1,
            lines_of_code: 0,
            quality_issues: Vec::new(),
            security_patterns: Vec::new(),
            parsed: false,
            error: Some(error.into()),
        }
    }

    /// A finding for a file whose extension is not supported.
    pub fn unsupported(filename: &str) -> Self {
        Self::unparsed(filename, UNKNOWN_LANGUAGE, "Unsupported file type")
    }

    /// Derive maintainability and debt metrics from this finding.
    pub fn advanced_metrics(self) -> AdvancedMetrics {
        AdvancedMetrics::from_finding(self)
    }
}

/// Count of `\n`-separated segments, matching how editors number lines
/// when the file ends with a newline.
pub fn count_lines(content: &str) -> usize {
    content.split('\n').count()
}

/// How urgently a file should be refactored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefactoringPriority {
    Low,
    Medium,
    High,
}

impl RefactoringPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefactoringPriority::Low => "low",
            RefactoringPriority::Medium => "medium",
            RefactoringPriority::High => "high",
        }
    }
}

impl fmt::Display for RefactoringPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structural finding extended with maintainability metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedMetrics {
    #[serde(flatten)]
    pub finding: StructuralFinding,
    /// 0-100, higher is better.
    pub maintainability_index: u32,
    /// 0-100, higher is worse.
    pub technical_debt_ratio: u32,
    pub code_smell_count: usize,
    pub refactoring_priority: RefactoringPriority,
}

impl AdvancedMetrics {
    pub fn from_finding(finding: StructuralFinding) -> Self {
        let maintainability_index =
            score::maintainability_index(finding.complexity_score, finding.lines_of_code);
        Self {
            technical_debt_ratio: score::technical_debt_ratio(finding.complexity_score),
            code_smell_count: finding.quality_issues.len(),
            refactoring_priority: score::refactoring_priority(maintainability_index),
            maintainability_index,
            finding,
        }
    }
}
