//! Failure taxonomy surfaced by the controller. Every variant is recoverable:
//! the front-end shows the message in its status line and keeps running.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The amount text did not parse as a finite number.
    #[error("Amount must be a number, got \"{0}\".")]
    InvalidAmount(String),

    /// Remove was requested without a row selected in the view.
    #[error("Select a row to delete!")]
    NoSelection,

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error("Export failed: {0:#}")]
    Export(anyhow::Error),
}

impl TrackerError {
    /// Input and selection problems are the user's to fix; the rest are
    /// environment faults worth logging.
    pub fn is_user_error(&self) -> bool {
        matches!(self, TrackerError::InvalidAmount(_) | TrackerError::NoSelection)
    }
}
