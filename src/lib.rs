//! reviewlens - change-set quality review.
//!
//! reviewlens takes the files touched by a commit or pull request and
//! produces a static quality report: structure and complexity per file,
//! security and performance anti-patterns, and import relationships across
//! the batch. The report can be combined with change metadata into a request
//! for a narrative service, whose free-text reply is reduced to a structured
//! [`Narrative`].
//!
//! # Architecture
//!
//! - `language`: extension to language classification
//! - `analysis`: per-file structural analysis (tree-sitter for Python,
//!   line patterns for JavaScript and TypeScript)
//! - `detect`: security, performance and dependency detectors
//! - `score`: scoring formulas shared by the detectors and aggregation
//! - `aggregate`: merges per-file results into one report
//! - `runner`: the parallel batch pipeline
//! - `narrative`: request building, the service client, reply extraction
//! - `config`, `report`, `cli`: configuration, output and the binary
//!
//! # Adding a New Language
//!
//! Add the extension to `language.rs`, then either give it a
//! [`PatternProfile`] or implement [`StructuralAnalyzer`] and register it in
//! `analysis/languages/mod.rs`.

pub mod aggregate;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod language;
pub mod narrative;
pub mod record;
pub mod report;
pub mod runner;
pub mod score;

pub use aggregate::{AggregateReport, Aggregator, FileScan};
pub use analysis::{
    AdvancedMetrics, AnalyzerSet, PatternProfile, RefactoringPriority, StructuralAnalyzer,
    StructuralFinding,
};
pub use config::Config;
pub use detect::{
    ConnectionDetector, DependencyReport, PerformanceReport, SecurityReport, Severity,
};
pub use language::{Language, LanguageFamily};
pub use narrative::{
    ChangeMetadata, ChangeSet, FileChange, GeminiClient, Narrative, NarrativeError,
    NarrativeService, RequestBuilder,
};
pub use record::FileRecord;
pub use runner::{Review, ReviewError, Runner};
