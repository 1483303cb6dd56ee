//! Selection state machine.
//!
//! The session owns the one authoritative epoch. Selecting a station or a
//! transport mode hands off to a fresh epoch: the old cancel token is
//! tripped, the working copy is replaced with a fresh seed, and a new batch
//! task is spawned. Batch events carry their epoch id, which is compared
//! under the session lock at the moment they are applied; events from any
//! other epoch are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::calculator::{
    BatchEvent, BatchJob, BatchPhase, BatchRouteCalculator, CalculatorConfig, CancelToken,
    RetryTrigger, SnapshotSink,
};
use crate::domain::{
    EpochId, EpochKey, LatLon, RetryState, Station, StationId, TransportMode,
    WorkingDestination, sort_by_distance,
};
use crate::presenter::{ViewModel, present};
use crate::routing::RouteProvider;
use crate::stations::StationDirectory;

use super::error::SessionError;
use super::snapshot::{SessionSnapshot, StationHeader};

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No station selected yet.
    Idle,
    /// An epoch is authoritative. Its batch may have finished.
    Running(EpochId),
    /// Torn down; late batch events are being discarded.
    Cancelling,
}

/// The authoritative epoch.
struct ActiveEpoch {
    id: EpochId,
    key: EpochKey,
    origin: LatLon,
    cancel: CancelToken,
    retry: RetryTrigger,
    /// A batch task is running for this epoch.
    batch_live: bool,
}

impl ActiveEpoch {
    /// One more pass over the incomplete destinations of `snapshot`, with
    /// the attempt counter left where it is.
    fn extra_pass(&self, snapshot: &SessionSnapshot) -> BatchJob {
        let mut destinations = snapshot.destinations.clone();
        destinations.sort_by_key(|d| d.id);
        BatchJob {
            epoch: self.id,
            origin: self.origin,
            mode: self.key.mode,
            destinations,
            cancel: self.cancel.clone(),
            retry: self.retry.clone(),
            attempt: snapshot.retry.attempt,
        }
    }
}

enum Lifecycle {
    Idle,
    Running(ActiveEpoch),
    Cancelling,
}

struct Inner {
    lifecycle: Lifecycle,
    last_epoch: u64,
    mode: TransportMode,
    station: Option<Arc<Station>>,
    selected: Option<LatLon>,
    snapshot: SessionSnapshot,
}

/// What applying a batch event did.
#[derive(Debug)]
enum Applied {
    /// The event belongs to another epoch or arrived after teardown.
    Stale,
    Applied,
    /// Applied, and a manual retry is owed an extra pass.
    Rerun(BatchJob),
}

/// State shared between the session and its batch tasks.
struct Shared {
    inner: Mutex<Inner>,
    views: watch::Sender<ViewModel>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Nothing panics while holding the lock; recover rather than propagate.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.views.send_replace(present(&inner.snapshot, inner.selected, Instant::now()));
    }

    /// Apply a batch event if it belongs to the authoritative epoch.
    fn apply(&self, event: BatchEvent) -> Applied {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let active = match &mut inner.lifecycle {
            Lifecycle::Running(active) if active.id == event.epoch() => active,
            _ => {
                debug!(epoch = %event.epoch(), "Dropping event from stale epoch");
                return Applied::Stale;
            }
        };

        let mut applied = Applied::Applied;
        match event {
            BatchEvent::InFlight { destination, .. } => {
                inner.snapshot.in_flight = Some(destination);
            }
            BatchEvent::Snapshot(snapshot) => {
                let phase = snapshot.phase;
                inner.snapshot.destinations = snapshot.destinations;
                inner.snapshot.retry = snapshot.retry;
                inner.snapshot.in_flight = None;
                inner.snapshot.retry_at = match phase {
                    BatchPhase::RetryScheduled { delay } => Some(Instant::now() + delay),
                    _ => None,
                };
                inner.snapshot.phase = Some(phase);

                // A retry requested during the final pass had no back-off to cut short.
                if phase.is_terminal() {
                    if active.retry.take_pending() && phase == BatchPhase::Exhausted {
                        info!(epoch = %active.id, "Manual retry pass");
                        applied = Applied::Rerun(active.extra_pass(&inner.snapshot));
                        inner.snapshot.phase = Some(BatchPhase::Calculating);
                    } else {
                        active.batch_live = false;
                    }
                }
            }
        }

        self.publish(inner);
        applied
    }
}

/// Batch event sink bound to the session.
struct SessionSink<P> {
    shared: Arc<Shared>,
    calculator: Arc<BatchRouteCalculator<P>>,
}

impl<P: RouteProvider> SnapshotSink for SessionSink<P> {
    fn emit(&self, event: BatchEvent) {
        if let Applied::Rerun(job) = self.shared.apply(event) {
            spawn_batch(&self.calculator, &self.shared, job);
        }
    }
}

/// Run `job` on its own task, reporting into the session.
fn spawn_batch<P: RouteProvider>(
    calculator: &Arc<BatchRouteCalculator<P>>,
    shared: &Arc<Shared>,
    job: BatchJob,
) {
    let sink = SessionSink {
        shared: Arc::clone(shared),
        calculator: Arc::clone(calculator),
    };
    tokio::spawn(async move {
        sink.calculator.run(job, &sink).await;
    });
}

/// Reacts to selection changes and owns the current epoch.
///
/// Dropping the session cancels the current epoch.
pub struct CalculationSession<P> {
    calculator: Arc<BatchRouteCalculator<P>>,
    stations: StationDirectory,
    shared: Arc<Shared>,
}

impl<P: RouteProvider> CalculationSession<P> {
    pub fn new(provider: Arc<P>, config: CalculatorConfig, stations: StationDirectory) -> Self {
        let mode = TransportMode::default();
        let snapshot = SessionSnapshot {
            mode,
            max_retries: config.max_retries,
            ..SessionSnapshot::default()
        };
        let (views, _rx) = watch::channel(present(&snapshot, None, Instant::now()));

        Self {
            calculator: Arc::new(BatchRouteCalculator::new(provider, config)),
            stations,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    lifecycle: Lifecycle::Idle,
                    last_epoch: 0,
                    mode,
                    station: None,
                    selected: None,
                    snapshot,
                }),
                views,
            }),
        }
    }

    /// Stream of view models, updated on every applied snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.shared.views.subscribe()
    }

    /// The latest view model, with the retry countdown as of now.
    pub fn view(&self) -> ViewModel {
        let inner = self.shared.lock();
        present(&inner.snapshot, inner.selected, Instant::now())
    }

    /// The latest snapshot of the authoritative epoch.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().snapshot.clone()
    }

    pub fn state(&self) -> SessionState {
        match &self.shared.lock().lifecycle {
            Lifecycle::Idle => SessionState::Idle,
            Lifecycle::Running(active) => SessionState::Running(active.id),
            Lifecycle::Cancelling => SessionState::Cancelling,
        }
    }

    pub fn mode(&self) -> TransportMode {
        self.shared.lock().mode
    }

    pub fn stations(&self) -> &StationDirectory {
        &self.stations
    }

    /// Select a station, starting a new epoch unless the same station is
    /// already running in the current mode.
    pub async fn select_station(&self, id: &StationId) -> Result<(), SessionError> {
        let station = self
            .stations
            .get(id)
            .await
            .ok_or_else(|| SessionError::UnknownStation(id.clone()))?;

        let mut guard = self.shared.lock();
        if matches!(guard.lifecycle, Lifecycle::Cancelling) {
            return Err(SessionError::Closed);
        }

        let key = EpochKey::new(station.id.clone(), guard.mode);
        if matches!(&guard.lifecycle, Lifecycle::Running(active) if active.key == key) {
            debug!(station = %key.station, "Station already selected");
            return Ok(());
        }

        self.start_epoch(&mut guard, station);
        Ok(())
    }

    /// Change the transport mode.
    ///
    /// Distances are mode-specific, so with a station selected this hands
    /// off to a fresh epoch and every previous result is discarded.
    pub fn set_transport_mode(&self, mode: TransportMode) -> Result<(), SessionError> {
        let mut guard = self.shared.lock();
        if matches!(guard.lifecycle, Lifecycle::Cancelling) {
            return Err(SessionError::Closed);
        }
        if guard.mode == mode {
            return Ok(());
        }

        guard.mode = mode;
        match guard.station.clone() {
            Some(station) => self.start_epoch(&mut guard, station),
            None => {
                guard.snapshot.mode = mode;
                self.shared.publish(&guard);
            }
        }
        Ok(())
    }

    /// Force another pass for the current epoch.
    ///
    /// While the batch is running this cuts the next back-off short, or,
    /// when the running pass is the last one allowed, earns one more pass
    /// after it. Once the batch has finished it runs one more pass over the
    /// incomplete destinations. The retry ceiling is not reset.
    pub fn retry_now(&self) -> Result<(), SessionError> {
        let mut guard = self.shared.lock();
        let inner = &mut *guard;

        let active = match &mut inner.lifecycle {
            Lifecycle::Cancelling => return Err(SessionError::Closed),
            Lifecycle::Idle => return Ok(()),
            Lifecycle::Running(active) => active,
        };

        if active.batch_live {
            debug!(epoch = %active.id, "Manual retry requested");
            active.retry.fire();
            return Ok(());
        }

        let job = active.extra_pass(&inner.snapshot);
        active.batch_live = true;
        info!(epoch = %active.id, "Manual retry pass");

        inner.snapshot.phase = Some(BatchPhase::Calculating);
        self.shared.publish(inner);
        self.spawn_batch(job);
        Ok(())
    }

    /// Mark the destination at `position` as selected, or clear the selection.
    pub fn select_destination(&self, position: Option<LatLon>) -> Result<(), SessionError> {
        let mut guard = self.shared.lock();
        if matches!(guard.lifecycle, Lifecycle::Cancelling) {
            return Err(SessionError::Closed);
        }
        guard.selected = position;
        self.shared.publish(&guard);
        Ok(())
    }

    /// Tear the session down. No snapshot is applied afterwards.
    pub fn cancel(&self) {
        let mut guard = self.shared.lock();
        if let Lifecycle::Running(active) = &guard.lifecycle {
            active.cancel.cancel();
            info!(epoch = %active.id, "Session cancelled");
        }
        guard.lifecycle = Lifecycle::Cancelling;
    }

    fn start_epoch(&self, inner: &mut Inner, station: Arc<Station>) {
        if let Lifecycle::Running(old) = &inner.lifecycle {
            old.cancel.cancel();
            debug!(epoch = %old.id, "Cancelled previous epoch");
        }

        inner.last_epoch += 1;
        let id = EpochId(inner.last_epoch);
        let key = EpochKey::new(station.id.clone(), inner.mode);
        let destinations = WorkingDestination::seed(&station.destinations);
        let cancel = CancelToken::new();
        let retry = RetryTrigger::new();

        info!(
            epoch = %id,
            station = %key.station,
            mode = %key.mode,
            destinations = destinations.len(),
            "Starting epoch"
        );

        let mut sorted = destinations.clone();
        sort_by_distance(&mut sorted);
        inner.snapshot = SessionSnapshot {
            epoch: Some(id),
            station: Some(StationHeader::from(station.as_ref())),
            mode: key.mode,
            destinations: sorted,
            in_flight: None,
            retry: RetryState::default(),
            retry_at: None,
            max_retries: self.calculator.config().max_retries,
            phase: Some(BatchPhase::Calculating),
        };

        let job = BatchJob {
            epoch: id,
            origin: station.position,
            mode: key.mode,
            destinations,
            cancel: cancel.clone(),
            retry: retry.clone(),
            attempt: 0,
        };

        inner.lifecycle = Lifecycle::Running(ActiveEpoch {
            id,
            key,
            origin: station.position,
            cancel,
            retry,
            batch_live: true,
        });
        inner.station = Some(station);

        self.shared.publish(inner);
        self.spawn_batch(job);
    }

    fn spawn_batch(&self, job: BatchJob) {
        spawn_batch(&self.calculator, &self.shared, job);
    }
}

impl<P> Drop for CalculationSession<P> {
    fn drop(&mut self) {
        let mut guard = self.shared.lock();
        if let Lifecycle::Running(active) = &guard.lifecycle {
            active.cancel.cancel();
        }
        guard.lifecycle = Lifecycle::Cancelling;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::BatchSnapshot;
    use crate::domain::{Destination, DestinationId};
    use crate::routing::mock::{MockRouteProvider, Outcome};

    fn station() -> Station {
        Station {
            id: StationId::new("dukuh-atas"),
            name: "Dukuh Atas".to_string(),
            location: "Jakarta".to_string(),
            position: LatLon::new(-6.2009, 106.8229),
            destinations: vec![Destination::new("Monas", LatLon::new(-6.1754, 106.8272))],
        }
    }

    fn session(mock: &MockRouteProvider) -> CalculationSession<MockRouteProvider> {
        CalculationSession::new(
            Arc::new(mock.clone()),
            CalculatorConfig::new(1, 60_000, 5, 2, 5_000),
            StationDirectory::from_stations(vec![station()]),
        )
    }

    #[tokio::test]
    async fn events_from_other_epochs_are_dropped() {
        let mock = MockRouteProvider::new();
        mock.script(
            LatLon::new(-6.1754, 106.8272),
            vec![Outcome::Gated(Arc::new(tokio::sync::Notify::new()), 1.0, 1.0)],
        );
        let session = session(&mock);
        session
            .select_station(&StationId::new("dukuh-atas"))
            .await
            .unwrap();
        let before = session.snapshot();

        let stale = BatchEvent::Snapshot(BatchSnapshot {
            epoch: EpochId(999),
            destinations: vec![],
            retry: RetryState::default(),
            phase: BatchPhase::Complete,
        });
        assert!(matches!(session.shared.apply(stale), Applied::Stale));
        assert!(matches!(
            session.shared.apply(BatchEvent::InFlight {
                epoch: EpochId(0),
                destination: DestinationId(0),
            }),
            Applied::Stale
        ));

        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test]
    async fn nothing_applies_after_cancel() {
        let mock = MockRouteProvider::new();
        let session = session(&mock);
        session
            .select_station(&StationId::new("dukuh-atas"))
            .await
            .unwrap();
        let Some(epoch) = session.snapshot().epoch else {
            panic!("epoch should be set");
        };

        session.cancel();
        assert_eq!(session.state(), SessionState::Cancelling);
        assert!(matches!(
            session.shared.apply(BatchEvent::InFlight {
                epoch,
                destination: DestinationId(0),
            }),
            Applied::Stale
        ));
    }
}
