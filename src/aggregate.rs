//! Batch-level rollup of per-file results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analysis::{AdvancedMetrics, StructuralFinding};
use crate::detect::{
    performance, security, DependencyReport, FileSecurityScan, PerformanceFinding,
    PerformanceReport, SecurityReport,
};

/// Default complexity above which a file is listed as high complexity.
pub const DEFAULT_HIGH_COMPLEXITY: u32 = 10;

/// Everything the per-file stage produces for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScan {
    pub structure: StructuralFinding,
    pub security: FileSecurityScan,
    pub performance: Vec<PerformanceFinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralSummary {
    pub total_files_analyzed: usize,
    pub parsed_files: usize,
    pub total_functions: usize,
    pub total_classes: usize,
    /// Mean over parsed files; 0 when none parsed.
    pub average_complexity: f64,
    pub languages_used: Vec<String>,
    pub high_complexity_files: Vec<String>,
    pub parse_failures: Vec<ParseFailure>,
}

/// The full analysis of one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Per-file metrics in input order, unparsed files included.
    pub files: Vec<AdvancedMetrics>,
    pub structure: StructuralSummary,
    pub security: SecurityReport,
    pub performance: PerformanceReport,
    pub dependencies: DependencyReport,
    pub average_maintainability: f64,
    pub average_technical_debt: f64,
    pub recommendations: Vec<String>,
}

impl AggregateReport {
    /// Metrics for a file, if it was part of the batch.
    pub fn file(&self, filename: &str) -> Option<&AdvancedMetrics> {
        self.files.iter().find(|m| m.finding.filename == filename)
    }

    /// Security scan for a file, if it was part of the batch.
    pub fn security_scan(&self, filename: &str) -> Option<&FileSecurityScan> {
        self.security
            .file_scans
            .iter()
            .find(|s| s.filename == filename)
    }
}

/// Joins per-file scans and the dependency report.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    high_complexity_threshold: u32,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HIGH_COMPLEXITY)
    }
}

impl Aggregator {
    pub fn new(high_complexity_threshold: u32) -> Self {
        Self {
            high_complexity_threshold,
        }
    }

    pub fn aggregate(&self, scans: Vec<FileScan>, dependencies: DependencyReport) -> AggregateReport {
        let mut findings = Vec::with_capacity(scans.len());
        let mut security_scans = Vec::with_capacity(scans.len());
        let mut performance_findings = Vec::with_capacity(scans.len());
        for scan in scans {
            findings.push(scan.structure);
            security_scans.push(scan.security);
            performance_findings.push(scan.performance);
        }

        let structure = self.summarize(&findings);
        let files: Vec<AdvancedMetrics> = findings
            .into_iter()
            .map(StructuralFinding::advanced_metrics)
            .collect();

        let parsed: Vec<&AdvancedMetrics> = files.iter().filter(|m| m.finding.parsed).collect();
        let average_maintainability =
            mean(parsed.iter().map(|m| m.maintainability_index as f64), parsed.len());
        let average_technical_debt =
            mean(parsed.iter().map(|m| m.technical_debt_ratio as f64), parsed.len());

        let security = security::summarize(security_scans);
        let performance = performance::summarize(performance_findings);

        let recommendations = security
            .recommendations
            .iter()
            .chain(&performance.recommendations)
            .chain(&dependencies.risks)
            .cloned()
            .collect();

        AggregateReport {
            files,
            structure,
            security,
            performance,
            dependencies,
            average_maintainability,
            average_technical_debt,
            recommendations,
        }
    }

    fn summarize(&self, findings: &[StructuralFinding]) -> StructuralSummary {
        let mut summary = StructuralSummary {
            total_files_analyzed: findings.len(),
            ..Default::default()
        };
        let mut languages = BTreeSet::new();
        let mut complexity_total = 0u64;

        for finding in findings {
            if !finding.parsed {
                summary.parse_failures.push(ParseFailure {
                    filename: finding.filename.clone(),
                    error: finding.error.clone().unwrap_or_default(),
                });
                continue;
            }
            summary.parsed_files += 1;
            summary.total_functions += finding.function_count;
            summary.total_classes += finding.class_count;
            complexity_total += u64::from(finding.complexity_score);
            languages.insert(finding.language.clone());
            if finding.complexity_score > self.high_complexity_threshold {
                summary.high_complexity_files.push(finding.filename.clone());
            }
        }

        summary.languages_used = languages.into_iter().collect();
        summary.average_complexity = if summary.parsed_files == 0 {
            0.0
        } else {
            complexity_total as f64 / summary.parsed_files as f64
        };
        summary
    }
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}
