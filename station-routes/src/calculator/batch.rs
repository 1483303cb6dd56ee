//! Per-epoch batch route calculation.
//!
//! Destinations are routed one at a time with a pacing delay between
//! requests, so a free third-party routing service never sees more than
//! one request from us per epoch. Failed destinations are retried in
//! whole passes after a back-off; completed ones are never requested again.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    DestinationId, EpochId, LatLon, RetryState, TransportMode, WorkingDestination,
    sort_by_distance,
};
use crate::routing::{FailureCause, RouteError, RouteProvider, RouteSummary};

use super::config::CalculatorConfig;
use super::signal::{CancelToken, RetryTrigger};

/// Where a batch is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchPhase {
    /// A pass is running.
    Calculating,
    /// A pass left failures; the next one starts after `delay`.
    RetryScheduled {
        #[serde(rename = "delay_ms", serialize_with = "serialize_millis")]
        delay: Duration,
    },
    /// Every destination has a route.
    Complete,
    /// Retries ran out with some destinations still incomplete.
    Exhausted,
}

impl BatchPhase {
    /// Whether the batch has stopped scheduling work.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchPhase::Complete | BatchPhase::Exhausted)
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Immutable copy of the working destinations at one point in time.
///
/// Destinations are sorted by distance with missing distances last.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSnapshot {
    pub epoch: EpochId,
    pub destinations: Vec<WorkingDestination>,
    pub retry: RetryState,
    pub phase: BatchPhase,
}

/// Progress reported by a running batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// A request for this destination is about to be sent.
    InFlight {
        epoch: EpochId,
        destination: DestinationId,
    },
    /// Updated working copy.
    Snapshot(BatchSnapshot),
}

impl BatchEvent {
    pub fn epoch(&self) -> EpochId {
        match self {
            BatchEvent::InFlight { epoch, .. } => *epoch,
            BatchEvent::Snapshot(snapshot) => snapshot.epoch,
        }
    }
}

/// Receiver of batch progress.
pub trait SnapshotSink: Send + Sync {
    fn emit(&self, event: BatchEvent);
}

impl<F> SnapshotSink for F
where
    F: Fn(BatchEvent) + Send + Sync,
{
    fn emit(&self, event: BatchEvent) {
        self(event)
    }
}

/// Everything one batch run needs.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub epoch: EpochId,
    pub origin: LatLon,
    pub mode: TransportMode,
    /// Working copy in original destination order.
    pub destinations: Vec<WorkingDestination>,
    pub cancel: CancelToken,
    pub retry: RetryTrigger,
    /// Retry passes already used in this epoch.
    pub attempt: u32,
}

/// How a batch run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// The batch stopped on its own.
    Finished {
        destinations: Vec<WorkingDestination>,
        retry: RetryState,
        phase: BatchPhase,
    },
    /// The epoch was cancelled; nothing more was emitted.
    Cancelled,
}

/// Computes routes for every destination of one epoch.
pub struct BatchRouteCalculator<P> {
    provider: Arc<P>,
    config: CalculatorConfig,
}

impl<P: RouteProvider> BatchRouteCalculator<P> {
    pub fn new(provider: Arc<P>, config: CalculatorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Run passes until every destination is complete, retries run out, or
    /// the job is cancelled.
    ///
    /// Route failures never surface from here: they only leave the
    /// destination incomplete. After cancellation nothing more is emitted.
    pub async fn run<S>(&self, job: BatchJob, sink: &S) -> BatchOutcome
    where
        S: SnapshotSink + ?Sized,
    {
        let BatchJob {
            epoch,
            origin,
            mode,
            mut destinations,
            cancel,
            retry,
            attempt,
        } = job;

        let mut retry_state = RetryState {
            attempt,
            scheduled: false,
        };

        loop {
            let Some(failures) = self
                .run_pass(epoch, origin, mode, &mut destinations, retry_state, &cancel, sink)
                .await
            else {
                debug!(%epoch, "Batch cancelled");
                return BatchOutcome::Cancelled;
            };

            let phase = if failures == 0 {
                BatchPhase::Complete
            } else if retry_state.attempt >= self.config.max_retries {
                BatchPhase::Exhausted
            } else {
                retry_state.attempt += 1;
                retry_state.scheduled = true;
                BatchPhase::RetryScheduled {
                    delay: self.config.backoff(),
                }
            };

            sink.emit(BatchEvent::Snapshot(snapshot(
                epoch,
                &destinations,
                retry_state,
                phase,
            )));

            if phase.is_terminal() {
                match phase {
                    BatchPhase::Exhausted => warn!(
                        %epoch,
                        incomplete = failures,
                        attempt = retry_state.attempt,
                        "Retries exhausted, destinations left incomplete"
                    ),
                    _ => info!(%epoch, "All destinations routed"),
                }
                return BatchOutcome::Finished {
                    destinations,
                    retry: retry_state,
                    phase,
                };
            }

            if !self.wait_for_retry(&cancel, &retry).await {
                debug!(%epoch, "Batch cancelled during back-off");
                return BatchOutcome::Cancelled;
            }
            retry_state.scheduled = false;
        }
    }

    /// One sequential pass over the incomplete destinations.
    ///
    /// Returns the number of failures, or `None` if cancelled.
    #[allow(clippy::too_many_arguments)]
    async fn run_pass<S>(
        &self,
        epoch: EpochId,
        origin: LatLon,
        mode: TransportMode,
        destinations: &mut [WorkingDestination],
        retry_state: RetryState,
        cancel: &CancelToken,
        sink: &S,
    ) -> Option<usize>
    where
        S: SnapshotSink + ?Sized,
    {
        let pending: Vec<usize> = destinations
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.is_complete())
            .map(|(idx, _)| idx)
            .collect();

        info!(
            %epoch,
            %mode,
            attempt = retry_state.attempt,
            pending = pending.len(),
            skipped = destinations.len() - pending.len(),
            "Starting route pass"
        );

        let interval = self.config.snapshot_interval();
        let mut failures = 0;

        for (n, &idx) in pending.iter().enumerate() {
            if n > 0 && !cancel.sleep(self.config.pacing()).await {
                return None;
            }
            if cancel.is_cancelled() {
                return None;
            }

            let id = destinations[idx].id;
            let target = destinations[idx].destination.position;
            sink.emit(BatchEvent::InFlight {
                epoch,
                destination: id,
            });

            let result = self.request(origin, target, mode).await;

            if cancel.is_cancelled() {
                debug!(%epoch, destination = id.0, "Dropping response for cancelled epoch");
                return None;
            }

            let entry = &mut destinations[idx];
            entry.attempts += 1;
            match result {
                Ok(summary) => {
                    entry.destination.distance = Some(summary.distance_meters);
                    entry.destination.duration = Some(summary.duration_seconds);
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        %epoch,
                        destination = %entry.destination.name,
                        attempts = entry.attempts,
                        error = %e,
                        "Route request failed"
                    );
                }
            }

            let processed = n + 1;
            if processed % interval == 0 && processed < pending.len() {
                sink.emit(BatchEvent::Snapshot(snapshot(
                    epoch,
                    destinations,
                    retry_state,
                    BatchPhase::Calculating,
                )));
            }
        }

        Some(failures)
    }

    /// One route request bounded by the per-request deadline.
    async fn request(
        &self,
        origin: LatLon,
        target: LatLon,
        mode: TransportMode,
    ) -> Result<RouteSummary, RouteError> {
        let deadline = self.config.request_timeout();
        match tokio::time::timeout(deadline, self.provider.compute_route(origin, target, mode))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(FailureCause::TimedOut(deadline).into()),
        }
    }

    /// Wait out the back-off, or less if a manual retry arrives.
    ///
    /// Returns `false` if cancelled.
    async fn wait_for_retry(&self, cancel: &CancelToken, retry: &RetryTrigger) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.config.backoff()) => {}
            _ = retry.fired() => debug!("Manual retry, skipping back-off"),
            _ = cancel.cancelled() => return false,
        }
        !cancel.is_cancelled()
    }
}

fn snapshot(
    epoch: EpochId,
    destinations: &[WorkingDestination],
    retry: RetryState,
    phase: BatchPhase,
) -> BatchSnapshot {
    let mut sorted = destinations.to_vec();
    sort_by_distance(&mut sorted);

    BatchSnapshot {
        epoch,
        destinations: sorted,
        retry,
        phase,
    }
}
