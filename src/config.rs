//! Repository configuration (`testdex.toml`).
//!
//! Defines the typed configuration for an optional `testdex.toml` in the
//! working root. Missing fields use sensible defaults. Missing file → all
//! defaults (no error). CLI flags override config values.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::adapter::Framework;
use crate::error::TestdexError;

/// Name of the config file looked up in the working root.
pub const CONFIG_FILE: &str = "testdex.toml";

// ---------------------------------------------------------------------------
// Runtime scan options
// ---------------------------------------------------------------------------

/// Options threaded through the idiom adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// Merge before/after hook code into each test's snippet.
    pub include_hooks: bool,
    /// Prefix each snippet line with its 1-based source line number.
    pub line_numbers: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_hooks: true,
            line_numbers: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level testdex configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestdexConfig {
    /// Scan settings.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Synchronization settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl TestdexConfig {
    /// Load `testdex.toml` from `dir`, or all defaults when absent.
    pub fn load(dir: &Path) -> Result<Self, TestdexError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path).map_err(|e| TestdexError::Config {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| TestdexError::Config {
            path,
            detail: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// ScanConfig
// ---------------------------------------------------------------------------

/// Scan settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ScanConfig {
    /// Glob pattern for test files, relative to the working root.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Authoring framework whose idiom adapter is used.
    #[serde(default)]
    pub framework: Option<Framework>,

    /// Merge hook code into test snippets (default: `true`).
    #[serde(default = "default_hooks")]
    pub hooks: bool,

    /// Prefix snippet lines with source line numbers (default: `false`).
    #[serde(default)]
    pub line_numbers: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: None,
            framework: None,
            hooks: default_hooks(),
            line_numbers: false,
        }
    }
}

const fn default_hooks() -> bool {
    true
}

impl ScanConfig {
    /// The adapter options this config selects.
    #[must_use]
    pub const fn options(&self) -> ScanOptions {
        ScanOptions {
            include_hooks: self.hooks,
            line_numbers: self.line_numbers,
        }
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Synchronization settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Allow `clean-ids` to strip tokens the supplied map does not know.
    #[serde(default)]
    pub dangerous: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
