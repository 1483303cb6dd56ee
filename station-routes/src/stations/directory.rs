//! Station directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::{LatLon, Station, StationId};

use super::error::StationError;

/// Thread-safe, read-only lookup of stations and their destinations.
///
/// Loaded from a JSON file holding an array of stations. The engine only
/// reads from it; computed routes are never written back.
#[derive(Clone)]
pub struct StationDirectory {
    inner: Arc<RwLock<HashMap<StationId, Arc<Station>>>>,
    source: Option<PathBuf>,
}

impl StationDirectory {
    /// Build a directory from in-memory stations.
    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(build_map(stations))),
            source: None,
        }
    }

    /// Load the directory from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StationError> {
        let path = path.as_ref();
        let stations = read_stations(path)?;

        Ok(Self {
            inner: Arc::new(RwLock::new(build_map(stations))),
            source: Some(path.to_path_buf()),
        })
    }

    /// Look up a station by id.
    pub async fn get(&self, id: &StationId) -> Option<Arc<Station>> {
        let guard = self.inner.read().await;
        guard.get(id).cloned()
    }

    /// All stations, ordered by name.
    pub async fn list(&self) -> Vec<Arc<Station>> {
        let guard = self.inner.read().await;
        let mut stations: Vec<_> = guard.values().cloned().collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        stations
    }

    /// Get the number of stations in the directory.
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    /// Check if the directory is empty.
    pub async fn is_empty(&self) -> bool {
        let guard = self.inner.read().await;
        guard.is_empty()
    }

    /// Re-read the backing file.
    ///
    /// On success, replaces the current contents. On failure, the existing
    /// contents are preserved and the error is returned. Sessions keep the
    /// station record they started their epoch with.
    pub async fn reload(&self) -> Result<usize, StationError> {
        let path = self.source.as_ref().ok_or(StationError::NoSource)?;
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StationError::Io {
                path: path.clone(),
                source,
            })?;
        let map = build_map(parse_stations(path, &contents)?);
        let count = map.len();

        let mut guard = self.inner.write().await;
        *guard = map;

        Ok(count)
    }
}

fn read_stations(path: &Path) -> Result<Vec<Station>, StationError> {
    let contents = std::fs::read_to_string(path).map_err(|source| StationError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_stations(path, &contents)
}

fn parse_stations(path: &Path, contents: &str) -> Result<Vec<Station>, StationError> {
    serde_json::from_str(contents).map_err(|e| StationError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn valid_position(p: &LatLon) -> bool {
    p.lat.is_finite()
        && p.lon.is_finite()
        && (-90.0..=90.0).contains(&p.lat)
        && (-180.0..=180.0).contains(&p.lon)
}

/// Build the id → station map.
///
/// Stations with an invalid position are skipped, as are destinations with
/// one. The first station wins when ids repeat.
fn build_map(stations: Vec<Station>) -> HashMap<StationId, Arc<Station>> {
    let mut map = HashMap::with_capacity(stations.len());

    for mut station in stations {
        if !valid_position(&station.position) {
            warn!(station = %station.id, "Skipping station with invalid position");
            continue;
        }

        station.destinations.retain(|d| {
            let ok = valid_position(&d.position);
            if !ok {
                warn!(
                    station = %station.id,
                    destination = %d.name,
                    "Skipping destination with invalid position"
                );
            }
            ok
        });

        if map.contains_key(&station.id) {
            warn!(station = %station.id, "Duplicate station id, keeping the first");
            continue;
        }
        map.insert(station.id.clone(), Arc::new(station));
    }

    map
}
