//! Coordinates and travel modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
///
/// Equality is exact: two positions are the same only if both components
/// compare equal as `f64`. This is what destination selection relies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Bit-exact hashable key for this position.
    pub fn key(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lon.to_bits())
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Error returned when parsing an unknown transport mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport mode: {0:?} (expected pedestrian, auto or motorcycle)")]
pub struct InvalidTransportMode(String);

/// Travel mode, mapped one-to-one onto the routing service's costing profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Pedestrian,
    Auto,
    Motorcycle,
}

impl TransportMode {
    /// The costing profile name sent to the routing service.
    pub fn costing(&self) -> &'static str {
        match self {
            TransportMode::Pedestrian => "pedestrian",
            TransportMode::Auto => "auto",
            TransportMode::Motorcycle => "motorcycle",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.costing())
    }
}

impl FromStr for TransportMode {
    type Err = InvalidTransportMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pedestrian" => Ok(TransportMode::Pedestrian),
            "auto" => Ok(TransportMode::Auto),
            "motorcycle" => Ok(TransportMode::Motorcycle),
            _ => Err(InvalidTransportMode(s.to_string())),
        }
    }
}
