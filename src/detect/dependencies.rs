//! Import extraction and cross-file reference detection.
//!
//! Imports are pulled out with the family's regex table and split into
//! external and internal (relative) sets. Cross-file connections are found
//! by a [`ConnectionDetector`]; the default [`StemReferenceDetector`] is a
//! plain substring heuristic, so a short stem like `a` or `io` will match
//! incidentally. That is a known limitation of the heuristic.

use std::collections::BTreeSet;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::UNKNOWN_LANGUAGE;
use crate::language::Language;
use crate::record::FileRecord;

use super::rules;

pub const CIRCULAR_RISK: &str = "Potential circular dependencies detected";

/// Files with more imports than this are flagged as highly coupled.
pub const HIGH_COUPLING_IMPORTS: usize = 10;

/// Number of external names sampled into the summary.
const EXTERNAL_SAMPLE: usize = 5;

/// Imports of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub filename: String,
    pub language: String,
    pub imports: BTreeSet<String>,
    pub external_imports: BTreeSet<String>,
    pub internal_imports: BTreeSet<String>,
}

impl DependencyRecord {
    pub fn import_count(&self) -> usize {
        self.imports.len()
    }
}

/// A directed textual reference from one file to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossFileConnection {
    pub from_file: String,
    pub to_file: String,
    pub connection_type: String,
    pub strength: String,
}

impl CrossFileConnection {
    fn import_reference(from: &str, to: &str) -> Self {
        Self {
            from_file: from.to_string(),
            to_file: to.to_string(),
            connection_type: "import_reference".to_string(),
            strength: "direct".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySummary {
    pub total_files_analyzed: usize,
    pub total_imports: usize,
    pub unique_external_dependencies: usize,
    pub unique_internal_dependencies: usize,
    pub most_imported_external: Vec<String>,
    pub languages_detected: Vec<String>,
}

/// Dependency analysis of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub file_dependencies: Vec<DependencyRecord>,
    pub cross_file_connections: Vec<CrossFileConnection>,
    pub summary: DependencySummary,
    pub risks: Vec<String>,
}

/// Finds references between files of one batch.
pub trait ConnectionDetector: Send + Sync {
    /// Connections in (from, to) input order.
    fn detect(&self, files: &[FileRecord]) -> Vec<CrossFileConnection>;
}

/// Connects A to B when B's file stem occurs anywhere in A's content.
#[derive(Debug, Clone, Copy, Default)]
pub struct StemReferenceDetector;

impl ConnectionDetector for StemReferenceDetector {
    fn detect(&self, files: &[FileRecord]) -> Vec<CrossFileConnection> {
        let stems: Vec<Option<&str>> = files
            .iter()
            .map(|f| {
                Path::new(&f.filename)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|s| !s.is_empty())
            })
            .collect();

        files
            .par_iter()
            .filter(|from| !from.content.is_empty())
            .flat_map_iter(|from| {
                files
                    .iter()
                    .zip(stems.iter())
                    .filter(move |(to, _)| to.filename != from.filename)
                    .filter_map(move |(to, stem)| match stem {
                        Some(stem) if from.content.contains(stem) => Some(
                            CrossFileConnection::import_reference(&from.filename, &to.filename),
                        ),
                        _ => None,
                    })
            })
            .collect()
    }
}

/// Extract the imports of one file.
pub fn extract(filename: &str, content: &str) -> DependencyRecord {
    let language = Language::detect(filename);
    let mut record = DependencyRecord {
        filename: filename.to_string(),
        language: language
            .map(|l| l.as_str())
            .unwrap_or(UNKNOWN_LANGUAGE)
            .to_string(),
        ..Default::default()
    };

    let Some(language) = language else {
        return record;
    };

    for regex in rules::import_patterns(language.family()) {
        for caps in regex.captures_iter(content) {
            if let Some(module) = caps.get(1) {
                record.imports.insert(module.as_str().to_string());
            }
        }
    }
    for import in &record.imports {
        if import.starts_with('.') {
            record.internal_imports.insert(import.clone());
        } else {
            record.external_imports.insert(import.clone());
        }
    }
    record
}

/// Analyze the dependencies of a full batch.
///
/// Needs every file of the batch, so callers run it after the per-file
/// scans have joined. Files with empty content are skipped.
pub fn analyze_batch(files: &[FileRecord], detector: &dyn ConnectionDetector) -> DependencyReport {
    let file_dependencies: Vec<DependencyRecord> = files
        .par_iter()
        .filter(|f| !f.content.is_empty())
        .map(|f| extract(&f.filename, &f.content))
        .collect();
    let cross_file_connections = detector.detect(files);

    let summary = summarize(&file_dependencies);
    let risks = risks(&file_dependencies, &cross_file_connections);

    tracing::debug!(
        files = file_dependencies.len(),
        connections = cross_file_connections.len(),
        "dependency analysis complete"
    );

    DependencyReport {
        file_dependencies,
        cross_file_connections,
        summary,
        risks,
    }
}

fn summarize(records: &[DependencyRecord]) -> DependencySummary {
    let mut external = BTreeSet::new();
    let mut internal = BTreeSet::new();
    let mut languages = BTreeSet::new();
    for record in records {
        external.extend(record.external_imports.iter().cloned());
        internal.extend(record.internal_imports.iter().cloned());
        languages.insert(record.language.clone());
    }

    DependencySummary {
        total_files_analyzed: records.len(),
        total_imports: records.iter().map(DependencyRecord::import_count).sum(),
        unique_external_dependencies: external.len(),
        unique_internal_dependencies: internal.len(),
        most_imported_external: external.into_iter().take(EXTERNAL_SAMPLE).collect(),
        languages_detected: languages.into_iter().collect(),
    }
}

fn risks(records: &[DependencyRecord], connections: &[CrossFileConnection]) -> Vec<String> {
    let mut risks = Vec::new();
    if connections.len() > records.len() {
        risks.push(CIRCULAR_RISK.to_string());
    }

    let coupled: Vec<&str> = records
        .iter()
        .filter(|r| r.import_count() > HIGH_COUPLING_IMPORTS)
        .map(|r| r.filename.as_str())
        .collect();
    if !coupled.is_empty() {
        risks.push(format!("High coupling detected in: {}", coupled.join(", ")));
    }
    risks
}
