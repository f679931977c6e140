//! Language-to-strategy lookup.

#[cfg(feature = "tree-sitter")]
mod python;

#[cfg(feature = "tree-sitter")]
pub use python::{PythonAnalyzer, MAX_FUNCTION_LINES, MAX_POSITIONAL_PARAMS};

use super::{PatternAnalyzer, StructuralAnalyzer, StructuralFinding};
use crate::language::{Language, LanguageFamily};

/// The set of structural analyzers for one batch.
///
/// Built explicitly by the caller and shared by reference across workers;
/// there is no process-wide registry.
pub struct AnalyzerSet {
    python: Box<dyn StructuralAnalyzer>,
    javascript: Box<dyn StructuralAnalyzer>,
}

impl AnalyzerSet {
    pub fn new() -> Self {
        Self {
            python: python_analyzer(),
            javascript: Box::new(PatternAnalyzer::for_family(LanguageFamily::JavaScript)),
        }
    }

    /// The analyzer responsible for a language.
    pub fn analyzer_for(&self, language: Language) -> &dyn StructuralAnalyzer {
        match language.family() {
            LanguageFamily::Python => self.python.as_ref(),
            LanguageFamily::JavaScript => self.javascript.as_ref(),
        }
    }

    /// Classify the file and run the matching analyzer.
    pub fn analyze(&self, filename: &str, content: &str) -> StructuralFinding {
        match Language::detect(filename) {
            Some(language) => self.analyzer_for(language).analyze(filename, language, content),
            None => StructuralFinding::unsupported(filename),
        }
    }
}

impl Default for AnalyzerSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tree-sitter")]
fn python_analyzer() -> Box<dyn StructuralAnalyzer> {
    Box::new(PythonAnalyzer::new())
}

#[cfg(not(feature = "tree-sitter"))]
fn python_analyzer() -> Box<dyn StructuralAnalyzer> {
    Box::new(PatternAnalyzer::for_family(LanguageFamily::Python))
}
