//! Session error types.

use crate::domain::StationId;

/// Errors returned by session commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The station is not in the directory
    #[error("unknown station: {0}")]
    UnknownStation(StationId),

    /// The session was torn down
    #[error("session has been cancelled")]
    Closed,
}
