//! errors.rs - Custom error types for the nnm-core library.
//!
//! Document primitives have their own [`DomError`](crate::dom::DomError); this enum
//! covers everything else the library can report.
//!
//! License: MIT OR Apache-2.0

use thiserror::Error;

/// All error types surfaced by `nnm-core`.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking callers.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NnmError {
    #[error("Failed to compile phrase rule '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Rule '{0}': {1}")]
    InvalidRule(String, String),

    #[error("Unknown redaction style '{0}'")]
    UnknownStyle(String),

    #[error("Settings are unavailable: {0}")]
    SettingsUnavailable(String),

    #[error("A fatal error occurred: {0}")]
    Fatal(String),
}
