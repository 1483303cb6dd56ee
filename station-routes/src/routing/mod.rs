//! Routing service client.
//!
//! Wraps single point-to-point route requests against an external
//! Valhalla-style routing service:
//! - the request is a JSON document passed in the `json` query parameter
//! - distance comes back in kilometers, duration in seconds
//! - geometry is a polyline encoded at precision 6

mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock;
mod shape;
mod types;

pub use client::{RouteClient, RouteClientConfig, RouteProvider};
pub use error::{FailureCause, RouteError};
pub use shape::{SHAPE_PRECISION, decode_path};
pub use types::{LegSummary, RouteRequest, RouteResponse, RouteSummary, Trip, TripLeg};
