//! Application configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::CacheConfig;
use crate::calculator::CalculatorConfig;
use crate::routing::RouteClientConfig;

/// Errors reading the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub routing: RouteClientConfig,
    pub calculator: CalculatorConfig,
    pub cache: CacheConfig,
    pub stations_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read the configuration from process environment variables.
    ///
    /// Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut routing = RouteClientConfig::new();
        if let Some(url) = lookup("ROUTING_BASE_URL") {
            routing = routing.with_base_url(url);
        }
        if let Some(language) = lookup("ROUTING_LANGUAGE") {
            routing = routing.with_language(language);
        }
        if let Some(secs) = parse::<u64>(&lookup, "ROUTING_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "ROUTING_TIMEOUT_SECS",
                    value: "0".to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            routing = routing.with_timeout(secs);
        }

        let defaults = CalculatorConfig::default();
        let calculator = CalculatorConfig::new(
            parse(&lookup, "PACING_MS")?.unwrap_or(defaults.pacing_ms),
            parse(&lookup, "BACKOFF_MS")?.unwrap_or(defaults.backoff_ms),
            parse(&lookup, "MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            defaults.snapshot_every,
            routing.timeout_secs * 1000,
        );

        let stations_path = lookup("STATIONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/stations.json"));

        let bind_addr = parse(&lookup, "BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        Ok(Self {
            routing,
            calculator,
            cache: CacheConfig::default(),
            stations_path,
            bind_addr,
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
