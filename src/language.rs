//! Filename-based language classification.
//!
//! Classification is a pure function of the file extension. No content is
//! inspected. Unsupported extensions yield `None`, which callers treat as a
//! "skip deeper analysis" signal rather than an error.

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

/// Language families share rule tables and an analysis strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFamily {
    /// Languages with a full parse tree available.
    Python,
    /// Pattern-only languages (JavaScript and TypeScript).
    JavaScript,
}

/// Extension (lowercase, without dot) to language.
static EXTENSIONS: phf::Map<&'static str, Language> = phf_map! {
    "py" => Language::Python,
    "js" => Language::JavaScript,
    "jsx" => Language::JavaScript,
    "mjs" => Language::JavaScript,
    "cjs" => Language::JavaScript,
    "ts" => Language::TypeScript,
    "tsx" => Language::TypeScript,
};

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    pub fn family(&self) -> LanguageFamily {
        match self {
            Language::Python => LanguageFamily::Python,
            Language::JavaScript | Language::TypeScript => LanguageFamily::JavaScript,
        }
    }

    /// Determine the language from a file extension (without dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS.get(ext.to_ascii_lowercase().as_str()).copied()
    }

    /// Determine the language of a file from its name.
    pub fn detect(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl LanguageFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageFamily::Python => "python",
            LanguageFamily::JavaScript => "javascript",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for LanguageFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(Language::detect("app/main.py"), Some(Language::Python));
        assert_eq!(Language::detect("src/App.jsx"), Some(Language::JavaScript));
        assert_eq!(Language::detect("lib/index.mjs"), Some(Language::JavaScript));
        assert_eq!(Language::detect("src/api.ts"), Some(Language::TypeScript));
        assert_eq!(Language::detect("src/View.tsx"), Some(Language::TypeScript));
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(Language::detect("SETUP.PY"), Some(Language::Python));
        assert_eq!(Language::detect("Widget.TSX"), Some(Language::TypeScript));
    }

    #[test]
    fn test_unsupported_extensions() {
        assert_eq!(Language::detect("README.md"), None);
        assert_eq!(Language::detect("main.go"), None);
        assert_eq!(Language::detect("Makefile"), None);
        assert_eq!(Language::detect(".py"), None);
    }

    #[test]
    fn test_families() {
        assert_eq!(Language::Python.family(), LanguageFamily::Python);
        assert_eq!(Language::JavaScript.family(), LanguageFamily::JavaScript);
        assert_eq!(Language::TypeScript.family(), LanguageFamily::JavaScript);
    }
}
