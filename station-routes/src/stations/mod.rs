//! Station and destination store.
//!
//! Provides id → station lookup, loaded from a JSON file at startup and
//! reloadable on demand. Read-only from the engine's point of view.

mod directory;
mod error;

pub use directory::StationDirectory;
pub use error::StationError;
