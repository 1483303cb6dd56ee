//! Scripted route provider for tests.
//!
//! Each destination position gets a script of outcomes that is consumed
//! one call at a time; the last outcome repeats once the script runs out.
//! Every call is logged with the (possibly paused) tokio clock so pacing
//! can be checked without wall time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::domain::{LatLon, TransportMode};

use super::client::RouteProvider;
use super::error::{FailureCause, RouteError};
use super::types::RouteSummary;

/// What a scripted call does.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Succeed with (meters, seconds).
    Route(f64, f64),
    /// Fail as if the service had no route.
    Fail,
    /// Wait for the gate to be notified, then succeed with (meters, seconds).
    Gated(Arc<Notify>, f64, f64),
    /// Never answer.
    Hang,
}

/// A logged call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub destination: LatLon,
    pub mode: TransportMode,
    pub at: Instant,
}

#[derive(Default)]
struct MockState {
    scripts: HashMap<(u64, u64), Vec<Outcome>>,
    calls: Vec<MockCall>,
}

/// Route provider that replays scripted outcomes.
#[derive(Clone, Default)]
pub struct MockRouteProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockRouteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcomes for a destination. Unscripted destinations fail.
    pub fn script(&self, destination: LatLon, outcomes: Vec<Outcome>) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(destination.key(), outcomes);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls made for one destination.
    pub fn call_count(&self, destination: LatLon) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.destination == destination)
            .count()
    }

    fn next_outcome(&self, destination: LatLon, mode: TransportMode) -> Outcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall {
            destination,
            mode,
            at: Instant::now(),
        });

        match state.scripts.get_mut(&destination.key()) {
            Some(script) if script.len() > 1 => script.remove(0),
            Some(script) => script.first().cloned().unwrap_or(Outcome::Fail),
            None => Outcome::Fail,
        }
    }
}

fn summary(distance_meters: f64, duration_seconds: f64) -> RouteSummary {
    RouteSummary {
        distance_meters,
        duration_seconds,
        shape: String::new(),
    }
}

impl RouteProvider for MockRouteProvider {
    async fn compute_route(
        &self,
        _origin: LatLon,
        destination: LatLon,
        mode: TransportMode,
    ) -> Result<RouteSummary, RouteError> {
        match self.next_outcome(destination, mode) {
            Outcome::Route(meters, secs) => Ok(summary(meters, secs)),
            Outcome::Fail => Err(FailureCause::NoRouteFound.into()),
            Outcome::Gated(gate, meters, secs) => {
                gate.notified().await;
                Ok(summary(meters, secs))
            }
            Outcome::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_is_consumed_then_last_repeats() {
        let mock = MockRouteProvider::new();
        let origin = LatLon::new(0.0, 0.0);
        let dest = LatLon::new(1.0, 1.0);
        mock.script(dest, vec![Outcome::Fail, Outcome::Route(100.0, 60.0)]);

        let mode = TransportMode::Pedestrian;
        assert!(mock.compute_route(origin, dest, mode).await.is_err());
        assert!(mock.compute_route(origin, dest, mode).await.is_ok());
        assert!(mock.compute_route(origin, dest, mode).await.is_ok());
        assert_eq!(mock.call_count(dest), 3);
    }

    #[tokio::test]
    async fn unscripted_destination_fails() {
        let mock = MockRouteProvider::new();
        let result = mock
            .compute_route(
                LatLon::new(0.0, 0.0),
                LatLon::new(5.0, 5.0),
                TransportMode::Auto,
            )
            .await;
        assert!(result.is_err());
        assert_eq!(mock.calls()[0].mode, TransportMode::Auto);
    }
}
