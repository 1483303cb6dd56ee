//! Routing service HTTP client.
//!
//! One request computes one point-to-point route. Retries and pacing are
//! the caller's business; this client reports each failure once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::{LatLon, TransportMode};

use super::error::{FailureCause, RouteError};
use super::types::{RouteRequest, RouteResponse, RouteSummary, classify_error};

/// Default public routing endpoint.
const DEFAULT_BASE_URL: &str = "https://valhalla1.openstreetmap.de";

/// Default narrative language.
const DEFAULT_LANGUAGE: &str = "id";

/// Default request timeout. The service itself sets none.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_USER_AGENT: &str = concat!("station-routes/", env!("CARGO_PKG_VERSION"));

/// Configuration for the routing client.
#[derive(Debug, Clone)]
pub struct RouteClientConfig {
    /// Base URL of the routing service (the client appends `/route`)
    pub base_url: String,
    /// Language requested for narrative output
    pub language: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl RouteClientConfig {
    /// Create a config pointing at the default public endpoint.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom base URL (for testing or a self-hosted instance).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the narrative language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for RouteClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of point-to-point routes.
///
/// The batch calculator is generic over this so it can run against the
/// live client, a cached client, or scripted test data.
pub trait RouteProvider: Send + Sync + 'static {
    fn compute_route(
        &self,
        origin: LatLon,
        destination: LatLon,
        mode: TransportMode,
    ) -> impl Future<Output = Result<RouteSummary, RouteError>> + Send;
}

/// Routing service client.
#[derive(Debug, Clone)]
pub struct RouteClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl RouteClient {
    /// Create a new routing client with the given configuration.
    pub fn new(config: RouteClientConfig) -> Result<Self, RouteError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language,
        })
    }

    /// Compute the route between two points.
    ///
    /// Uses the first leg of the returned trip: distance is converted from
    /// kilometers to meters, duration is in seconds.
    pub async fn compute_route(
        &self,
        origin: LatLon,
        destination: LatLon,
        mode: TransportMode,
    ) -> Result<RouteSummary, RouteError> {
        let request = RouteRequest::new(origin, destination, mode, &self.language);
        let json = serde_json::to_string(&request).map_err(|e| FailureCause::Malformed {
            message: format!("failed to encode request: {e}"),
        })?;

        let url = format!("{}/route", self.base_url);
        debug!(%origin, %destination, %mode, "Requesting route");

        let response = self.http.get(&url).query(&[("json", json)]).send().await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), body).into());
        }

        let body = response.text().await?;

        let parsed: RouteResponse =
            serde_json::from_str(&body).map_err(|e| FailureCause::Malformed {
                message: e.to_string(),
            })?;

        Ok(RouteSummary::try_from(parsed)?)
    }
}

impl RouteProvider for RouteClient {
    async fn compute_route(
        &self,
        origin: LatLon,
        destination: LatLon,
        mode: TransportMode,
    ) -> Result<RouteSummary, RouteError> {
        RouteClient::compute_route(self, origin, destination, mode).await
    }
}

impl<P: RouteProvider> RouteProvider for Arc<P> {
    async fn compute_route(
        &self,
        origin: LatLon,
        destination: LatLon,
        mode: TransportMode,
    ) -> Result<RouteSummary, RouteError> {
        P::compute_route(self, origin, destination, mode).await
    }
}
