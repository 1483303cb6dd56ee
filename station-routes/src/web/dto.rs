//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{LatLon, Station, StationId};

/// A station in the station list.
#[derive(Debug, Serialize)]
pub struct StationSummary {
    pub id: StationId,
    pub name: String,
    pub location: String,
    pub position: LatLon,

    /// Number of destinations attached to the station
    pub destination_count: usize,
}

impl StationSummary {
    pub fn from_station(station: &Station) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            location: station.location.clone(),
            position: station.position,
            destination_count: station.destinations.len(),
        }
    }
}

/// Response listing every station.
#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<StationSummary>,
}

/// Response to a station directory reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Stations loaded from the file
    pub stations: usize,
}

/// Request to select a station.
#[derive(Debug, Deserialize)]
pub struct SelectStationRequest {
    pub id: StationId,
}

/// Request to change the transport mode.
#[derive(Debug, Deserialize)]
pub struct SelectModeRequest {
    /// `pedestrian`, `auto` or `motorcycle`
    pub mode: String,
}

/// Request to select a destination, or clear the selection.
#[derive(Debug, Default, Deserialize)]
pub struct SelectDestinationRequest {
    #[serde(default)]
    pub position: Option<LatLon>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
