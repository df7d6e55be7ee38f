//! Error type for the `radiosync` binary.

use thiserror::Error;

/// Result alias for command handlers.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced to the user by the binary.
///
/// Logging setup failures are not among them: `main` reports those and carries
/// on without logging.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from the core library.
    #[error(transparent)]
    Core(#[from] radiosync_core::Error),

    /// No station with this id in the catalog.
    #[error("No station with id {0}")]
    UnknownStation(i64),

    /// The catalog has no stations to navigate.
    #[error("The catalog has no stations")]
    EmptyCatalog,

    /// Writing command output failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Catalog could not be rendered as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A background task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_display_transparently() {
        let err = CliError::from(radiosync_core::Error::configuration("remote_url is empty"));
        assert_eq!(err.to_string(), "Configuration error: remote_url is empty");
    }

    #[test]
    fn test_unknown_station_display() {
        assert_eq!(
            CliError::UnknownStation(42).to_string(),
            "No station with id 42"
        );
    }
}
