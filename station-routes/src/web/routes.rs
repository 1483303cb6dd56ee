//! HTTP route handlers.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use futures::stream::{self, Stream};
use tracing::info;

use crate::domain::TransportMode;
use crate::presenter::ViewModel;
use crate::routing::RouteProvider;

use super::dto::*;
use super::error::AppError;
use super::state::AppState;

/// Create the application router.
pub fn create_router<P: RouteProvider>(state: AppState<P>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(list_stations::<P>))
        .route("/api/stations/reload", post(reload_stations::<P>))
        .route("/api/view", get(current_view::<P>))
        .route("/api/view/stream", get(view_stream::<P>))
        .route("/api/station", post(select_station::<P>))
        .route("/api/mode", post(select_mode::<P>))
        .route("/api/destination", post(select_destination::<P>))
        .route("/api/retry", post(retry_now::<P>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All stations, ordered by name.
async fn list_stations<P: RouteProvider>(
    State(state): State<AppState<P>>,
) -> Json<StationsResponse> {
    let stations = state
        .stations
        .list()
        .await
        .iter()
        .map(|s| StationSummary::from_station(s))
        .collect();

    Json(StationsResponse { stations })
}

/// Re-read the station file.
async fn reload_stations<P: RouteProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<ReloadResponse>, AppError> {
    let stations = state.stations.reload().await?;
    info!(stations, "Reloaded station directory");
    Ok(Json(ReloadResponse { stations }))
}

/// The current view model.
async fn current_view<P: RouteProvider>(State(state): State<AppState<P>>) -> Json<ViewModel> {
    Json(state.session.view())
}

/// Server-sent events carrying every new view model.
///
/// The current view is sent first. The stream ends on shutdown.
async fn view_stream<P: RouteProvider>(
    State(state): State<AppState<P>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.session.subscribe();
    let shutdown = state.shutdown.clone();

    let events = stream::unfold((rx, shutdown, true), |(mut rx, shutdown, first)| async move {
        if !first {
            tokio::select! {
                changed = rx.changed() => changed.ok()?,
                _ = shutdown.cancelled() => return None,
            }
        }
        let view = rx.borrow_and_update().clone();
        let event = Event::default()
            .event("view")
            .json_data(&view)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Some((Ok(event), (rx, shutdown, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Select a station and start calculating its routes.
async fn select_station<P: RouteProvider>(
    State(state): State<AppState<P>>,
    Json(req): Json<SelectStationRequest>,
) -> Result<Json<ViewModel>, AppError> {
    state.session.select_station(&req.id).await?;
    Ok(Json(state.session.view()))
}

/// Change the transport mode.
async fn select_mode<P: RouteProvider>(
    State(state): State<AppState<P>>,
    Json(req): Json<SelectModeRequest>,
) -> Result<Json<ViewModel>, AppError> {
    let mode: TransportMode = req
        .mode
        .parse()
        .map_err(|e: crate::domain::InvalidTransportMode| AppError::BadRequest(e.to_string()))?;
    state.session.set_transport_mode(mode)?;
    Ok(Json(state.session.view()))
}

/// Select a destination, or clear the selection.
async fn select_destination<P: RouteProvider>(
    State(state): State<AppState<P>>,
    Json(req): Json<SelectDestinationRequest>,
) -> Result<Json<ViewModel>, AppError> {
    state.session.select_destination(req.position)?;
    Ok(Json(state.session.view()))
}

/// Retry incomplete destinations now.
async fn retry_now<P: RouteProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<ViewModel>, AppError> {
    state.session.retry_now()?;
    Ok(Json(state.session.view()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::CalculatorConfig;
    use crate::domain::{Destination, LatLon, Station, StationId};
    use crate::routing::mock::{MockRouteProvider, Outcome};
    use crate::session::CalculationSession;
    use crate::stations::StationDirectory;
    use std::sync::Arc;

    fn state(mock: &MockRouteProvider) -> AppState<MockRouteProvider> {
        let monas = LatLon::new(-6.1754, 106.8272);
        mock.script(monas, vec![Outcome::Route(2900.0, 2100.0)]);
        let stations = StationDirectory::from_stations(vec![Station {
            id: StationId::new("dukuh-atas"),
            name: "Dukuh Atas".to_string(),
            location: "Jakarta Pusat".to_string(),
            position: LatLon::new(-6.2009, 106.8229),
            destinations: vec![Destination::new("Monas", monas)],
        }]);
        AppState::new(CalculationSession::new(
            Arc::new(mock.clone()),
            CalculatorConfig::default(),
            stations,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn select_station_returns_view() {
        let mock = MockRouteProvider::new();
        let state = state(&mock);

        let Json(view) = select_station(
            State(state.clone()),
            Json(SelectStationRequest {
                id: StationId::new("dukuh-atas"),
            }),
        )
        .await
        .unwrap();
        assert_eq!(view.station.map(|s| s.name), Some("Dukuh Atas".to_string()));
        assert_eq!(view.destinations.len(), 1);

        let mut rx = state.session.subscribe();
        let view = rx.wait_for(|v| v.progress.finished).await.unwrap().clone();
        assert_eq!(view.destinations[0].distance_label, "2.90 km");
        assert_eq!(view.destinations[0].duration_label, "35:00");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_station_is_not_found() {
        let mock = MockRouteProvider::new();
        let result = select_station(
            State(state(&mock)),
            Json(SelectStationRequest {
                id: StationId::new("tanah-abang"),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_mode_is_bad_request() {
        let mock = MockRouteProvider::new();
        let result = select_mode(
            State(state(&mock)),
            Json(SelectModeRequest {
                mode: "bicycle".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let Json(view) = select_mode(
            State(state(&mock)),
            Json(SelectModeRequest {
                mode: "Auto".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(view.mode, TransportMode::Auto);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_after_shutdown_are_unavailable() {
        let mock = MockRouteProvider::new();
        let state = state(&mock);
        state.session.cancel();

        let result = retry_now(State(state)).await;
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn stations_are_listed() {
        let mock = MockRouteProvider::new();
        let Json(response) = list_stations(State(state(&mock))).await;
        assert_eq!(response.stations.len(), 1);
        assert_eq!(response.stations[0].destination_count, 1);
    }

    #[test]
    fn router_builds() {
        let mock = MockRouteProvider::new();
        let _router = create_router(state(&mock));
    }
}
