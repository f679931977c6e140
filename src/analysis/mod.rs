//! Per-file structural analysis.
//!
//! Produces function/class/import counts, a cyclomatic complexity score,
//! quality smells and maintainability metrics for one file. Two strategies
//! implement the [`StructuralAnalyzer`] trait:
//!
//! - exact: walks a tree-sitter parse tree (Python)
//! - heuristic: line and substring patterns (JavaScript, TypeScript)
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────────┐
//! │ FileRecord  │────▶│ AnalyzerSet  │────▶│ StructuralFinding │
//! └─────────────┘     │ (by family)  │     └───────────────────┘
//!                     └──────────────┘               │
//!                                                    ▼
//!                                          ┌───────────────────┐
//!                                          │  AdvancedMetrics  │
//!                                          └───────────────────┘
//! ```

mod finding;
mod languages;
mod pattern;
mod traits;

pub use finding::{
    count_lines, AdvancedMetrics, RefactoringPriority, StructuralFinding, UNKNOWN_LANGUAGE,
};
pub use languages::AnalyzerSet;
#[cfg(feature = "tree-sitter")]
pub use languages::{PythonAnalyzer, MAX_FUNCTION_LINES, MAX_POSITIONAL_PARAMS};
pub use pattern::{
    PatternAnalyzer, PatternProfile, COMPLEXITY_CAP, JAVASCRIPT_PROFILE, PYTHON_PROFILE,
};
pub use traits::{Strategy, StructuralAnalyzer};
