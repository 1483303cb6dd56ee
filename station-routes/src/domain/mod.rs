//! Domain types for the route engine.
//!
//! Stations and destinations as read from the station directory, the
//! per-epoch working copy the calculator updates, and the small value
//! types shared by every layer.

mod epoch;
mod geo;
mod station;

pub use epoch::{DestinationStatus, EpochId, EpochKey, RetryState};
pub use geo::{InvalidTransportMode, LatLon, TransportMode};
pub use station::{
    Destination, DestinationId, Station, StationId, WorkingDestination, compare_distance,
    sort_by_distance,
};
