//! Route geometry decoding.
//!
//! Shapes use the common polyline encoding (5-bit groups, zig-zag sign,
//! `0x20` continuation bit) at six decimal places of precision.

use crate::domain::LatLon;

use super::error::FailureCause;

/// Decimal places encoded in route shapes (scale factor 1e6).
pub const SHAPE_PRECISION: u32 = 6;

/// Decode an encoded route shape into coordinates.
pub fn decode_path(encoded: &str) -> Result<Vec<LatLon>, FailureCause> {
    let line = ::polyline::decode_polyline(encoded, SHAPE_PRECISION).map_err(|e| {
        FailureCause::Malformed {
            message: format!("invalid route shape: {e}"),
        }
    })?;

    Ok(line.coords().map(|c| LatLon::new(c.y, c.x)).collect())
}
