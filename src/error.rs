// 🚨 Dashboard Errors
// Typed faults raised by the engine. I/O boundaries use anyhow on top of these.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// A state row in the aggregate has no record in the subset it came from.
    /// Indicates an upstream invariant violation, never a recoverable condition.
    #[error("missing coordinates for state '{state}': no record in the filtered subset")]
    MissingCoordinate { state: String },

    /// A filter selection outside the configured choices
    #[error("invalid {field} selection: {message}")]
    InvalidSelection { field: String, message: String },
}

impl DashboardError {
    pub fn invalid_selection(field: &str, message: impl Into<String>) -> Self {
        DashboardError::InvalidSelection {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
