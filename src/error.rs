//! Error types for testdex.
//!
//! Defines [`TestdexError`], the unified error type for extraction and
//! synchronization. Each variant is self-contained: the message describes
//! what went wrong and how to fix it, without needing additional context.
//!
//! Fatal variants (exclusive tests, empty titles) abort the run; per-file
//! trouble (parse failures) is surfaced as a variant so callers can log it
//! and continue with the remaining files.

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// TestdexError
// ---------------------------------------------------------------------------

/// Unified error type for testdex operations.
#[derive(Debug)]
pub enum TestdexError {
    /// An `.only`-style exclusivity marker was found in a scanned file.
    ///
    /// Always fatal: exclusivity markers cause partial test execution
    /// downstream, so they are never silently tolerated.
    ExclusiveTests {
        /// File containing the marker.
        file: String,
        /// 1-based line of the marked suite or test.
        line: usize,
    },

    /// One or more tests have titles that are empty once ID/tag tokens are
    /// stripped. Collected across the whole file set and raised together.
    EmptyTitles {
        /// Every offending test position.
        offenders: Vec<Offender>,
    },

    /// A file could not be parsed into a syntax tree.
    ///
    /// Recoverable: the scanner logs this and continues with other files.
    Parse {
        /// File that failed to parse.
        file: String,
        /// Parser diagnostic.
        detail: String,
    },

    /// The tree-sitter parser could not be configured for a dialect.
    ParserSetup {
        /// Underlying language-version diagnostic.
        detail: String,
    },

    /// The file-discovery glob pattern is malformed.
    BadPattern {
        /// The pattern as given.
        pattern: String,
        /// Why it does not parse.
        detail: String,
    },

    /// A configuration file could not be loaded or parsed.
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// The supplied identifier map could not be read or decoded.
    IdMap {
        /// Path to the map file.
        path: PathBuf,
        /// Decode diagnostic.
        detail: String,
    },

    /// An I/O error occurred while reading or writing a source file.
    Io(std::io::Error),
}

/// A single `file:line` position in an aggregate validation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Offender {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for Offender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

// ---------------------------------------------------------------------------
// Display — actionable messages
// ---------------------------------------------------------------------------

impl fmt::Display for TestdexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExclusiveTests { file, line } => {
                write!(
                    f,
                    "Exclusive tests detected at {file}:{line}.\n  An '.only'/focus modifier restricts the run to a subset of tests.\n  To fix: remove the exclusivity marker and re-run the scan."
                )
            }
            Self::EmptyTitles { offenders } => {
                write!(
                    f,
                    "{} test(s) have empty titles once tags are stripped:",
                    offenders.len()
                )?;
                for o in offenders {
                    write!(f, "\n  - {o}")?;
                }
                write!(f, "\n  To fix: give each test a non-empty display name.")
            }
            Self::Parse { file, detail } => {
                write!(
                    f,
                    "failed to parse '{file}': {detail}\n  To fix: check the file for syntax errors, or exclude it from the scan pattern."
                )
            }
            Self::ParserSetup { detail } => {
                write!(
                    f,
                    "parser setup failed: {detail}\n  To fix: this is a grammar/library version mismatch; rebuild with matching tree-sitter versions."
                )
            }
            Self::BadPattern { pattern, detail } => {
                write!(
                    f,
                    "invalid file pattern '{pattern}': {detail}\n  To fix: use a glob pattern such as \"tests/**/*.test.js\"."
                )
            }
            Self::Config { path, detail } => {
                write!(
                    f,
                    "configuration error in '{}': {}\n  To fix: edit the config file and correct the issue.",
                    path.display(),
                    detail
                )
            }
            Self::IdMap { path, detail } => {
                write!(
                    f,
                    "could not read identifier map '{}': {}\n  To fix: supply a JSON file with \"tests\" and \"suites\" objects.",
                    path.display(),
                    detail
                )
            }
            Self::Io(err) => {
                write!(
                    f,
                    "I/O error: {err}\n  To fix: check file permissions and paths."
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error
// ---------------------------------------------------------------------------

impl std::error::Error for TestdexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TestdexError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
