//! Web layer for the station route engine.
//!
//! Exposes the session over a small JSON API: station and mode selection,
//! manual retry, and the current view model as a document or an event
//! stream.

mod dto;
mod error;
mod routes;
mod state;

pub use dto::*;
pub use error::AppError;
pub use routes::create_router;
pub use state::{AppState, LiveProvider};
