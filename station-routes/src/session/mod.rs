//! Calculation session.
//!
//! Turns station and transport mode selections into calculation epochs,
//! owns the authoritative working copy, and publishes a fresh view model
//! whenever the current epoch reports progress.

mod error;
mod machine;
mod snapshot;

pub use error::SessionError;
pub use machine::{CalculationSession, SessionState};
pub use snapshot::{SessionSnapshot, StationHeader};
