//! View model derivation.
//!
//! Turns a session snapshot into what the station sidebar shows: the
//! destinations sorted nearest first with display labels and status, plus
//! overall progress. Everything here is a pure function of its inputs.

use serde::Serialize;
use tokio::time::Instant;

use crate::calculator::BatchPhase;
use crate::domain::{DestinationId, DestinationStatus, LatLon, TransportMode, compare_distance};
use crate::session::{SessionSnapshot, StationHeader};

/// Placeholder shown for values that are not known yet.
pub const MISSING: &str = "-";

/// What the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewModel {
    pub station: Option<StationHeader>,
    pub mode: TransportMode,
    /// Nearest first; unknown distances last.
    pub destinations: Vec<DestinationView>,
    /// Destinations still missing a distance or duration.
    pub incomplete_count: usize,
    pub progress: Progress,
}

/// One destination row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationView {
    pub id: DestinationId,
    pub name: String,
    pub position: LatLon,
    pub image: Option<String>,
    /// Meters.
    pub distance: Option<f64>,
    /// Seconds.
    pub duration: Option<f64>,
    pub distance_label: String,
    pub duration_label: String,
    pub status: DestinationStatus,
    pub is_selected: bool,
}

/// Overall progress of the current epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub attempt: u32,
    pub max_retries: u32,
    pub retry_scheduled: bool,
    /// Seconds left until the scheduled retry pass, rounded up.
    pub retry_in_secs: Option<u64>,
    /// The batch stopped scheduling work (complete or retries exhausted).
    pub finished: bool,
}

/// Derive the view model for a snapshot.
///
/// `selected` marks the destination whose position matches exactly. The
/// retry countdown is measured from `now`.
pub fn present(snapshot: &SessionSnapshot, selected: Option<LatLon>, now: Instant) -> ViewModel {
    let mut destinations: Vec<DestinationView> = snapshot
        .destinations
        .iter()
        .map(|entry| {
            let d = &entry.destination;
            DestinationView {
                id: entry.id,
                name: d.name.clone(),
                position: d.position,
                image: d.image.clone(),
                distance: d.distance,
                duration: d.duration,
                distance_label: format_distance(d.distance),
                duration_label: format_duration(d.duration),
                status: DestinationStatus::derive(entry, snapshot.in_flight),
                is_selected: selected == Some(d.position),
            }
        })
        .collect();

    // Stable: ties keep their snapshot order.
    destinations.sort_by(|a, b| compare_distance(a.distance, b.distance));

    let incomplete_count = destinations
        .iter()
        .filter(|d| d.distance.is_none() || d.duration.is_none())
        .count();

    let retry_in_secs = match (snapshot.phase, snapshot.retry_at) {
        (Some(BatchPhase::RetryScheduled { .. }), Some(at)) => {
            let remaining = at.saturating_duration_since(now);
            Some(remaining.as_millis().div_ceil(1000) as u64)
        }
        _ => None,
    };

    let progress = Progress {
        completed: destinations.len() - incomplete_count,
        total: destinations.len(),
        attempt: snapshot.retry.attempt,
        max_retries: snapshot.max_retries,
        retry_scheduled: snapshot.retry.scheduled,
        retry_in_secs,
        finished: snapshot.phase.is_some_and(|p| p.is_terminal()),
    };

    ViewModel {
        station: snapshot.station.clone(),
        mode: snapshot.mode,
        destinations,
        incomplete_count,
        progress,
    }
}

/// Format a duration in seconds as `minutes:seconds`.
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() => {
            let total = s.max(0.0).floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => MISSING.to_string(),
    }
}

/// Format a distance in meters as kilometers.
pub fn format_distance(meters: Option<f64>) -> String {
    match meters {
        Some(m) if m.is_finite() => format!("{:.2} km", m / 1000.0),
        _ => MISSING.to_string(),
    }
}
