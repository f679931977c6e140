//! Scoring formulas shared by the scanners and the aggregator.
//!
//! All scores are deterministic functions of counts, so permuting the
//! files of a batch never changes a total.

use crate::analysis::RefactoringPriority;

/// Point weights for each security severity tier.
pub mod points {
    pub const CRITICAL: u32 = 10;
    pub const HIGH: u32 = 5;
    pub const MEDIUM: u32 = 2;
    pub const LOW: u32 = 1;
}

/// Points subtracted from the performance score per issue.
pub const PERFORMANCE_PENALTY: u32 = 5;

/// Performance issue count above which load testing is recommended.
pub const PERFORMANCE_TESTING_THRESHOLD: usize = 5;

/// Maintainability thresholds for refactoring priority.
pub mod priority {
    pub const HIGH_BELOW: u32 = 30;
    pub const MEDIUM_BELOW: u32 = 70;
}

/// Counts of findings per security tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TierCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierCounts {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    /// Add another set of counts into this one.
    pub fn merge(&mut self, other: &TierCounts) {
        self.critical += other.critical;
        self.high += other.high;
        self.medium += other.medium;
        self.low += other.low;
    }
}

/// Weighted security risk score for a set of tier counts.
pub fn risk_score(counts: &TierCounts) -> u32 {
    counts.critical as u32 * points::CRITICAL
        + counts.high as u32 * points::HIGH
        + counts.medium as u32 * points::MEDIUM
        + counts.low as u32 * points::LOW
}

/// Batch performance score, 100 with no issues and floored at 0.
pub fn performance_score(issue_count: usize) -> u32 {
    let penalty = (issue_count as u64).saturating_mul(PERFORMANCE_PENALTY as u64);
    100u64.saturating_sub(penalty) as u32
}

/// Maintainability index: `max(0, 100 - complexity*2 - loc/10)`.
pub fn maintainability_index(complexity: u32, lines_of_code: usize) -> u32 {
    let penalty = complexity as u64 * 2 + lines_of_code as u64 / 10;
    100u64.saturating_sub(penalty) as u32
}

/// Technical debt ratio: `min(100, complexity*5)`.
pub fn technical_debt_ratio(complexity: u32) -> u32 {
    (complexity as u64 * 5).min(100) as u32
}

/// Map a maintainability index onto a refactoring priority.
pub fn refactoring_priority(maintainability_index: u32) -> RefactoringPriority {
    match maintainability_index {
        mi if mi < priority::HIGH_BELOW => RefactoringPriority::High,
        mi if mi < priority::MEDIUM_BELOW => RefactoringPriority::Medium,
        _ => RefactoringPriority::Low,
    }
}
