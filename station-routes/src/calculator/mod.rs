//! Batch route calculation for one epoch.
//!
//! Given an origin and a working copy of its destinations, computes a
//! route to every destination through a [`RouteProvider`], one request at
//! a time, and reports progress as snapshots. Failed destinations are
//! retried in later passes; cancellation is cooperative.
//!
//! [`RouteProvider`]: crate::routing::RouteProvider

mod batch;
mod config;
mod signal;

pub use batch::{
    BatchEvent, BatchJob, BatchOutcome, BatchPhase, BatchRouteCalculator, BatchSnapshot,
    SnapshotSink,
};
pub use config::CalculatorConfig;
pub use signal::{CancelToken, RetryTrigger};
