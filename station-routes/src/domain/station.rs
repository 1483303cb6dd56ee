//! Stations, destinations and the per-epoch working copy.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::LatLon;

/// Identifier of a station in the station directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate destination reachable from a station.
///
/// `distance` (meters) and `duration` (seconds) are absent until a route
/// has been computed for the current epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub position: LatLon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Destination {
    pub fn new(name: impl Into<String>, position: LatLon) -> Self {
        Self {
            name: name.into(),
            position,
            image: None,
            distance: None,
            duration: None,
        }
    }

    /// Returns true once both distance and duration are known.
    pub fn is_complete(&self) -> bool {
        self.distance.is_some() && self.duration.is_some()
    }

    /// Copy of this destination with any computed route removed.
    pub fn without_route(&self) -> Self {
        Self {
            distance: None,
            duration: None,
            ..self.clone()
        }
    }
}

/// A station record as held by the station directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub location: String,
    pub position: LatLon,
    #[serde(default)]
    pub destinations: Vec<Destination>,
}

/// Position of a destination in its station's list.
///
/// Stable across transport-mode hand-offs, and used as the tie-breaker
/// when sorting by distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(pub usize);

/// One entry of an epoch's working copy.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingDestination {
    pub id: DestinationId,
    pub destination: Destination,
    /// Route requests made for this destination in the current epoch.
    pub attempts: u32,
}

impl WorkingDestination {
    /// Seed a fresh working copy from a station's destination list.
    ///
    /// Previously computed values are dropped: they are only valid for the
    /// epoch that produced them.
    pub fn seed(destinations: &[Destination]) -> Vec<Self> {
        destinations
            .iter()
            .enumerate()
            .map(|(idx, d)| WorkingDestination {
                id: DestinationId(idx),
                destination: d.without_route(),
                attempts: 0,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.destination.is_complete()
    }
}

/// Compare two optional distances, treating a missing one as infinite.
pub fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(f64::INFINITY)
        .total_cmp(&b.unwrap_or(f64::INFINITY))
}

/// Sort ascending by distance; missing distances go last.
///
/// The sort is stable, so equal or missing distances keep their current
/// relative order.
pub fn sort_by_distance(entries: &mut [WorkingDestination]) {
    entries.sort_by(|a, b| compare_distance(a.destination.distance, b.destination.distance));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(name: &str, distance: Option<f64>) -> Destination {
        Destination {
            distance,
            duration: distance.map(|d| d / 2.0),
            ..Destination::new(name, LatLon::new(0.0, 0.0))
        }
    }

    #[test]
    fn seed_drops_previous_routes() {
        let source = vec![dest("A", Some(100.0)), dest("B", None)];
        let working = WorkingDestination::seed(&source);

        assert_eq!(working.len(), 2);
        assert_eq!(working[0].id, DestinationId(0));
        assert_eq!(working[1].id, DestinationId(1));
        assert!(working.iter().all(|w| w.destination.distance.is_none()));
        assert!(working.iter().all(|w| w.attempts == 0));
        // The source list is untouched.
        assert_eq!(source[0].distance, Some(100.0));
    }

    #[test]
    fn sort_puts_missing_last_and_is_stable() {
        let mut working = WorkingDestination::seed(&[
            dest("none-1", None),
            dest("far", None),
            dest("none-2", None),
            dest("near", None),
        ]);
        working[1].destination.distance = Some(900.0);
        working[3].destination.distance = Some(50.0);

        sort_by_distance(&mut working);

        let names: Vec<_> = working.iter().map(|w| w.destination.name.as_str()).collect();
        assert_eq!(names, vec!["near", "far", "none-1", "none-2"]);
    }

    #[test]
    fn destination_json_omits_missing_image() {
        let json = serde_json::to_value(Destination::new("Monas", LatLon::new(-6.17, 106.82)))
            .unwrap();
        assert!(json.get("image").is_none());
        assert_eq!(json["distance"], serde_json::Value::Null);
    }

    #[test]
    fn station_deserializes_without_destinations() {
        let station: Station = serde_json::from_str(
            r#"{"id":"dukuh-atas","name":"Dukuh Atas","location":"Jakarta",
                "position":{"lat":-6.2009,"lon":106.8229}}"#,
        )
        .unwrap();
        assert_eq!(station.id.as_str(), "dukuh-atas");
        assert!(station.destinations.is_empty());
    }
}
