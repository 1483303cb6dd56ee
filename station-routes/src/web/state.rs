//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedRouteClient;
use crate::calculator::CancelToken;
use crate::routing::{RouteClient, RouteProvider};
use crate::session::CalculationSession;
use crate::stations::StationDirectory;

/// Route provider used by the server.
pub type LiveProvider = CachedRouteClient<RouteClient>;

/// Shared application state.
pub struct AppState<P = LiveProvider> {
    /// The one calculation session this server drives
    pub session: Arc<CalculationSession<P>>,

    /// Station directory (shared with the session)
    pub stations: StationDirectory,

    /// Tripped on shutdown so open event streams end
    pub shutdown: CancelToken,
}

impl<P: RouteProvider> AppState<P> {
    /// Create a new app state around a session.
    pub fn new(session: CalculationSession<P>) -> Self {
        let stations = session.stations().clone();
        Self {
            session: Arc::new(session),
            stations,
            shutdown: CancelToken::new(),
        }
    }
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            stations: self.stations.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}
