//! Routing service request and response DTOs.
//!
//! The request is sent as a JSON document in the `json` query parameter.
//! Response fields are `Option` wherever the service may omit them, so a
//! missing trip or leg is reported as a failure rather than a parse error.

use serde::{Deserialize, Serialize};

use crate::domain::{LatLon, TransportMode};

use super::error::FailureCause;
use super::shape::decode_path;

/// Error codes the service uses for "these points cannot be connected".
const NO_ROUTE_ERROR_CODES: [u32; 2] = [171, 442];

/// Body of a route request.
#[derive(Debug, Serialize)]
pub struct RouteRequest<'a> {
    pub locations: [LatLon; 2],
    pub costing: &'static str,
    pub directions_options: DirectionsOptions<'a>,
}

/// Narrative options. Only the language is set.
#[derive(Debug, Serialize)]
pub struct DirectionsOptions<'a> {
    pub language: &'a str,
}

impl<'a> RouteRequest<'a> {
    pub fn new(
        origin: LatLon,
        destination: LatLon,
        mode: TransportMode,
        language: &'a str,
    ) -> Self {
        Self {
            locations: [origin, destination],
            costing: mode.costing(),
            directions_options: DirectionsOptions { language },
        }
    }
}

/// Top-level route response.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteResponse {
    pub trip: Option<Trip>,
}

/// The computed trip. We only ever ask for one.
#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    pub legs: Option<Vec<TripLeg>>,
}

/// One leg of a trip.
#[derive(Debug, Clone, Deserialize)]
pub struct TripLeg {
    pub summary: LegSummary,

    /// Encoded polyline (precision 6).
    #[serde(default)]
    pub shape: String,
}

/// Leg totals.
#[derive(Debug, Clone, Deserialize)]
pub struct LegSummary {
    /// Length in kilometers.
    pub length: f64,

    /// Time in seconds.
    pub time: f64,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error_code: Option<u32>,
    pub error: Option<String>,
}

/// Distance and duration of a computed route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// Encoded path geometry, decoded on demand with [`RouteSummary::path`].
    pub shape: String,
}

impl RouteSummary {
    /// Decode the route geometry.
    pub fn path(&self) -> Result<Vec<LatLon>, FailureCause> {
        decode_path(&self.shape)
    }
}

impl TryFrom<RouteResponse> for RouteSummary {
    type Error = FailureCause;

    fn try_from(response: RouteResponse) -> Result<Self, Self::Error> {
        let leg = response
            .trip
            .and_then(|trip| trip.legs)
            .and_then(|legs| legs.into_iter().next())
            .ok_or_else(|| FailureCause::Malformed {
                message: "response has no trip.legs".to_string(),
            })?;

        Ok(RouteSummary {
            distance_meters: leg.summary.length * 1000.0,
            duration_seconds: leg.summary.time,
            shape: leg.shape,
        })
    }
}

/// Classify a non-success response body.
pub fn classify_error(status: u16, body: String) -> FailureCause {
    let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();

    match parsed {
        Some(ErrorBody {
            error_code: Some(code),
            ..
        }) if NO_ROUTE_ERROR_CODES.contains(&code) => FailureCause::NoRouteFound,
        Some(ErrorBody {
            error: Some(message),
            ..
        }) => FailureCause::BadResponse { status, message },
        _ => FailureCause::BadResponse {
            status,
            message: body.chars().take(500).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_expected_document() {
        let request = RouteRequest::new(
            LatLon::new(-6.2009, 106.8229),
            LatLon::new(-6.1754, 106.8272),
            TransportMode::Motorcycle,
            "id",
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "locations": [
                    {"lat": -6.2009, "lon": 106.8229},
                    {"lat": -6.1754, "lon": 106.8272}
                ],
                "costing": "motorcycle",
                "directions_options": {"language": "id"}
            })
        );
    }

    #[test]
    fn summary_from_first_leg() {
        let response: RouteResponse = serde_json::from_str(
            r#"{"trip":{"legs":[
                {"summary":{"length":2.345,"time":1801.5},"shape":"abc"},
                {"summary":{"length":9.0,"time":9.0},"shape":""}
            ],"status":0}}"#,
        )
        .unwrap();

        let summary = RouteSummary::try_from(response).unwrap();
        assert!((summary.distance_meters - 2345.0).abs() < 1e-9);
        assert_eq!(summary.duration_seconds, 1801.5);
        assert_eq!(summary.shape, "abc");
    }

    #[test]
    fn missing_legs_is_a_failure() {
        for body in [r#"{}"#, r#"{"trip":{}}"#, r#"{"trip":{"legs":[]}}"#] {
            let response: RouteResponse = serde_json::from_str(body).unwrap();
            let err = RouteSummary::try_from(response).unwrap_err();
            assert!(matches!(err, FailureCause::Malformed { .. }), "body {body}");
        }
    }

    #[test]
    fn classify_no_route_error() {
        let cause = classify_error(
            400,
            r#"{"error_code":442,"error":"No path could be found for input","status_code":400}"#
                .to_string(),
        );
        assert!(matches!(cause, FailureCause::NoRouteFound));
    }

    #[test]
    fn classify_other_errors() {
        let cause = classify_error(
            400,
            r#"{"error_code":100,"error":"Failed to parse json request"}"#.to_string(),
        );
        match cause {
            FailureCause::BadResponse { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Failed to parse json request");
            }
            other => panic!("unexpected cause: {other:?}"),
        }

        let cause = classify_error(503, "Service Unavailable".to_string());
        match cause {
            FailureCause::BadResponse { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("unexpected cause: {other:?}"),
        }
    }
}
