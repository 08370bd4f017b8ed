//! Source dialect detection and tree-sitter parser selection.
//!
//! The JS-family idiom adapters all walk a tree-sitter syntax tree. The only
//! per-file decision is the grammar: plain JavaScript or TypeScript. Dialects
//! are detected from file extensions and can be forced via options.

use std::path::Path;

use tree_sitter::{Language, Parser, Tree};

use crate::error::TestdexError;

/// Source dialects supported by the tree-walking adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dialect {
    JavaScript,
    TypeScript,
}

impl Dialect {
    /// Detect dialect from file extension.
    ///
    /// Returns `None` for unrecognized extensions.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            _ => None,
        }
    }

    /// Get the tree-sitter `Language` for this dialect.
    fn tree_sitter_language(self) -> Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JavaScript => write!(f, "javascript"),
            Self::TypeScript => write!(f, "typescript"),
        }
    }
}

/// Parse a source file into a syntax tree.
///
/// Errors carry the file path so per-file failures can be logged and skipped
/// without aborting the whole scan.
pub fn parse(source: &str, dialect: Dialect, file: &str) -> Result<Tree, TestdexError> {
    let mut parser = Parser::new();
    parser
        .set_language(&dialect.tree_sitter_language())
        .map_err(|e| TestdexError::ParserSetup {
            detail: e.to_string(),
        })?;

    parser.parse(source, None).ok_or_else(|| TestdexError::Parse {
        file: file.to_owned(),
        detail: format!("tree-sitter returned no tree for {dialect} input"),
    })
}
