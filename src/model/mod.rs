//! Canonical test model — records and whole-run aggregation.

pub mod decorator;
pub mod record;

pub use decorator::{Decorator, ScanReport};
pub use record::{strip_tag_tokens, TestRecord};
