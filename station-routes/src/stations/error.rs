//! Station directory error types.

use std::path::PathBuf;

/// Errors that can occur when loading the station directory.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// The station file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The station file is not valid JSON for a station list
    #[error("failed to parse {}: {message}", path.display())]
    Json { path: PathBuf, message: String },

    /// The directory was built in memory and has no file to reload from
    #[error("station directory has no backing file")]
    NoSource,
}
