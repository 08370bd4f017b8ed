use anyhow::{bail, Result};
use std::str::FromStr;

use crate::model::Decorator;

/// Output format for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain-text tree of suites and tests
    Text,
    /// Markdown bullet tree
    Markdown,
    /// JSON report - machine-parseable
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Text
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => bail!("Invalid format '{}'. Use: text, markdown, or json", s),
        }
    }
}

impl OutputFormat {
    /// Render the aggregated scan results in the requested format
    pub fn render(self, decorator: &Decorator) -> Result<String> {
        match self {
            Self::Text => Ok(decorator.text_list()),
            Self::Markdown => Ok(decorator.markdown_list()),
            Self::Json => serde_json::to_string_pretty(&decorator.report())
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {}", e)),
        }
    }
}
