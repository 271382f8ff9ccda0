//! Error types for the migration library.

use thiserror::Error;

use crate::source::FetchError;
use crate::target::DispatchError;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A hard precondition for the run failed (missing batch data, missing
    /// credentials, empty campaign list). Fatal to the run; nothing was
    /// migrated.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Completion ledger read or write error
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Fetching campaign detail from the source platform failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Creating the destination draft failed
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrateError {
    /// Create a Precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        MigrateError::Precondition(message.into())
    }

    /// Create a Ledger error
    pub fn ledger(message: impl Into<String>) -> Self {
        MigrateError::Ledger(message.into())
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
