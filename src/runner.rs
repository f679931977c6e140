//! Batch pipeline.
//!
//! ```text
//! validate ─▶ per-file scans (parallel) ─▶ join ─▶ dependencies ─▶ aggregate
//!                                                                    │
//!                                            (optional) narrative ◀──┘
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{AggregateReport, Aggregator, FileScan};
use crate::analysis::AnalyzerSet;
use crate::config::{AnalysisConfig, ConfigError};
use crate::detect::{dependencies, performance, security, ConnectionDetector, StemReferenceDetector};
use crate::narrative::{
    self, ChangeMetadata, FileChange, Narrative, NarrativeError, NarrativeService, RequestBuilder,
};
use crate::record::FileRecord;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("no files to analyze")]
    EmptyBatch,
    #[error("file #{index} has an empty filename")]
    EmptyFilename { index: usize },
    #[error("building worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("narrative request for {identifier} failed: {source}")]
    Narrative {
        identifier: String,
        #[source]
        source: NarrativeError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Static report plus the narrative built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub metadata: ChangeMetadata,
    pub report: AggregateReport,
    pub narrative: Narrative,
}

/// Run every per-file scan for one record.
pub fn scan_file(analyzers: &AnalyzerSet, record: &FileRecord) -> FileScan {
    FileScan {
        structure: analyzers.analyze(&record.filename, &record.content),
        security: security::scan_file(&record.filename, &record.content),
        performance: performance::scan_file(&record.filename, &record.content),
    }
}

/// Executes the analysis pipeline over a batch of files.
pub struct Runner {
    analyzers: AnalyzerSet,
    detector: Box<dyn ConnectionDetector>,
    aggregator: Aggregator,
    workers: usize,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            analyzers: AnalyzerSet::new(),
            detector: Box::new(StemReferenceDetector),
            aggregator: Aggregator::default(),
            workers: 0,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new()
            .workers(config.workers)
            .high_complexity_threshold(config.high_complexity_threshold)
    }

    /// Worker threads for the per-file stage; 0 uses the rayon default.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn high_complexity_threshold(mut self, threshold: u32) -> Self {
        self.aggregator = Aggregator::new(threshold);
        self
    }

    /// Replace the cross-file connection heuristic.
    pub fn connection_detector(mut self, detector: Box<dyn ConnectionDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Analyze a batch and aggregate the results.
    pub fn analyze(&self, files: &[FileRecord]) -> Result<AggregateReport, ReviewError> {
        validate(files)?;
        tracing::info!(files = files.len(), workers = self.workers, "analyzing batch");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let scans: Vec<FileScan> = pool.install(|| {
            files
                .par_iter()
                .map(|record| scan_file(&self.analyzers, record))
                .collect()
        });

        for scan in scans.iter().filter(|s| !s.structure.parsed) {
            tracing::debug!(
                file = %scan.structure.filename,
                error = scan.structure.error.as_deref().unwrap_or(""),
                "structural analysis skipped"
            );
        }

        // Every file must be scanned before cross-file comparison starts.
        let dependencies =
            pool.install(|| dependencies::analyze_batch(files, self.detector.as_ref()));

        let report = self.aggregator.aggregate(scans, dependencies);
        tracing::info!(
            parsed = report.structure.parsed_files,
            risk = report.security.overall_risk_score,
            performance = report.performance.performance_score,
            "batch analysis complete"
        );
        Ok(report)
    }

    /// Analyze a batch, then request and extract a narrative review.
    ///
    /// A service failure is returned as an error. No partial narrative
    /// is produced.
    pub async fn review(
        &self,
        metadata: &ChangeMetadata,
        changes: &[FileChange],
        files: &[FileRecord],
        builder: &RequestBuilder,
        service: &dyn NarrativeService,
    ) -> Result<Review, ReviewError> {
        let report = self.analyze(files)?;
        let changes = fill_missing_patches(changes, files);
        let request = builder.build(metadata, &changes, Some(&report));

        tracing::info!(
            change = %metadata.identifier(),
            chars = request.len(),
            "requesting narrative"
        );
        let reply = service
            .generate(&request)
            .await
            .map_err(|source| ReviewError::Narrative {
                identifier: metadata.identifier(),
                source,
            })?;

        Ok(Review {
            narrative: narrative::extract(&reply, metadata),
            metadata: metadata.clone(),
            report,
        })
    }
}

/// Changes without a patch take the diff excerpt of the matching record.
fn fill_missing_patches(changes: &[FileChange], files: &[FileRecord]) -> Vec<FileChange> {
    changes
        .iter()
        .map(|change| {
            let mut change = change.clone();
            if change.patch.is_none() {
                change.patch = files
                    .iter()
                    .find(|f| f.filename == change.filename)
                    .and_then(|f| f.diff_excerpt.clone());
            }
            change
        })
        .collect()
}

fn validate(files: &[FileRecord]) -> Result<(), ReviewError> {
    if files.is_empty() {
        return Err(ReviewError::EmptyBatch);
    }
    if let Some(index) = files.iter().position(|f| f.filename.trim().is_empty()) {
        return Err(ReviewError::EmptyFilename { index });
    }
    Ok(())
}
