//! Error types for reveal-core.
//!
//! Only strict constructors and parsers return these. Engine paths fall back to
//! safe defaults instead, so a misconfigured animation never breaks a page.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum MotionError {
    #[error("invalid root margin '{input}': {reason}")]
    InvalidRootMargin { input: String, reason: String },

    #[error("threshold must be a finite number in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("variant catalog: {0}")]
    InvalidCatalog(String),

    #[error("config: {0}")]
    InvalidConfig(String),
}
