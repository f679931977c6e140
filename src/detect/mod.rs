//! Text-level scanners: security, performance and dependencies.

pub mod dependencies;
pub mod performance;
pub mod rules;
pub mod security;
mod types;

pub use dependencies::{
    ConnectionDetector, CrossFileConnection, DependencyRecord, DependencyReport,
    DependencySummary, StemReferenceDetector,
};
pub use types::{
    FileSecurityScan, PerformanceFinding, PerformanceReport, SecurityFinding, SecurityReport,
    Severity,
};
