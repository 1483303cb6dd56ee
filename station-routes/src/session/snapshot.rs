//! Session snapshot handed to the presenter.

use serde::Serialize;
use tokio::time::Instant;

use crate::calculator::BatchPhase;
use crate::domain::{
    DestinationId, EpochId, LatLon, RetryState, Station, StationId, TransportMode,
    WorkingDestination,
};

/// The station an epoch is running for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationHeader {
    pub id: StationId,
    pub name: String,
    pub location: String,
    pub position: LatLon,
}

impl From<&Station> for StationHeader {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            location: station.location.clone(),
            position: station.position,
        }
    }
}

/// Latest state of the authoritative epoch.
///
/// Replaced wholesale on every applied batch event, never edited in place
/// by anything but the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// `None` while idle.
    pub epoch: Option<EpochId>,
    pub station: Option<StationHeader>,
    pub mode: TransportMode,
    /// Sorted by distance, missing last.
    pub destinations: Vec<WorkingDestination>,
    pub in_flight: Option<DestinationId>,
    pub retry: RetryState,
    /// When the scheduled retry pass starts, while one is scheduled.
    pub retry_at: Option<Instant>,
    pub max_retries: u32,
    /// `None` while idle.
    pub phase: Option<BatchPhase>,
}
