//! Core traits for structural analysis.

use crate::language::Language;

use super::StructuralFinding;

/// How an analyzer derives its metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Walks a full parse tree.
    Exact,
    /// Line and substring pattern matching.
    Heuristic,
}

/// Turns one file's content into a [`StructuralFinding`].
///
/// Implementations are side-effect free and hold no per-call state, so a
/// single instance can be shared across the worker threads of a batch.
///
/// # Errors
///
/// `analyze` never fails. Parse problems are recorded on the finding as
/// `parsed = false` with an error message.
pub trait StructuralAnalyzer: Send + Sync {
    /// Which strategy this analyzer implements.
    fn strategy(&self) -> Strategy;

    /// Analyze `content` as `language`.
    fn analyze(&self, filename: &str, language: Language, content: &str) -> StructuralFinding;
}
