//! Error types for the Aliev-Panfilov solver.

use thiserror::Error;

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, ApfError>;

/// Errors that can stop a run.
///
/// Numerical divergence is not represented here: the explicit scheme is only
/// bounded when `dt` respects the stability limit, and nothing checks that at
/// runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApfError {
    /// A grid buffer could not be allocated.
    #[error("Failed to allocate grid of {cells} cells")]
    Allocation { cells: usize },

    /// Host and device buffers disagree on length.
    #[error("Transfer size mismatch: expected {expected} samples, got {actual}")]
    Transfer { expected: usize, actual: usize },

    /// Configuration rejected before the run started.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

impl ApfError {
    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
