//! Calculation epochs and derived per-destination status.

use std::fmt;

use serde::Serialize;

use super::{DestinationId, StationId, TransportMode, WorkingDestination};

/// Sequence number of a calculation epoch.
///
/// Issued monotonically by the session, so selecting the same station and
/// mode again after switching away still yields a distinct epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EpochId(pub u64);

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

/// What an epoch was started for. Two selections with equal keys do not
/// trigger a new epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpochKey {
    pub station: StationId,
    pub mode: TransportMode,
}

impl EpochKey {
    pub fn new(station: StationId, mode: TransportMode) -> Self {
        Self { station, mode }
    }
}

/// Retry bookkeeping for one epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetryState {
    /// Retry passes started so far (0 during the first pass).
    pub attempt: u32,
    /// Whether another pass is waiting on the back-off.
    pub scheduled: bool,
}

/// Derived status of one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationStatus {
    Pending,
    InFlight,
    Complete,
    Failed,
}

impl DestinationStatus {
    pub fn derive(entry: &WorkingDestination, in_flight: Option<DestinationId>) -> Self {
        if entry.is_complete() {
            DestinationStatus::Complete
        } else if in_flight == Some(entry.id) {
            DestinationStatus::InFlight
        } else if entry.attempts > 0 {
            DestinationStatus::Failed
        } else {
            DestinationStatus::Pending
        }
    }
}
