use crate::error::{AppError, Result};
use crate::models::{Coordinates, RouteSummary, TransportMode};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Network distance/geometry oracle.
#[async_trait]
pub trait RoutingOracle: Send + Sync {
    /// Route through `points` in order. With `round_trip` the path is closed
    /// back to the first point. Fails when no profile produces a route.
    async fn route(
        &self,
        mode: TransportMode,
        points: &[Coordinates],
        round_trip: bool,
    ) -> Result<RouteLeg>;
}

/// One routed path as returned by the oracle
#[derive(Debug, Clone)]
pub struct RouteLeg {
    pub geometry: geojson::Geometry,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub profile: String,
}

impl RouteLeg {
    pub fn into_summary(self) -> RouteSummary {
        RouteSummary {
            geojson: Some(self.geometry),
            distance_km: self.distance_km,
            duration_min: self.duration_min,
            profile: Some(self.profile),
        }
    }
}

#[derive(Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
    forced_profile: Option<String>,
}

impl OsrmClient {
    pub fn new(base_url: String) -> Self {
        OsrmClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            forced_profile: None,
        }
    }

    /// Try `profile` before the mode's own profiles
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.forced_profile = profile;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn forced_profile(&self) -> Option<&str> {
        self.forced_profile.as_deref()
    }

    fn profile_candidates(&self, mode: TransportMode) -> Vec<String> {
        let mut candidates: Vec<String> = self.forced_profile.iter().cloned().collect();
        for profile in mode.osrm_profiles() {
            if !candidates.iter().any(|c| c == profile) {
                candidates.push(profile.to_string());
            }
        }
        candidates
    }

    fn route_url(&self, profile: &str, coords: &[Coordinates]) -> String {
        // OSRM expects "lon,lat;lon,lat;..."
        let coordinates_str = coords
            .iter()
            .map(|c| format!("{},{}", c.lon, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!("{}/route/v1/{}/{}", self.base_url, profile, coordinates_str)
    }

    async fn try_profile(&self, profile: &str, coords: &[Coordinates]) -> Result<RouteLeg> {
        let url = self.route_url(profile, coords);

        tracing::debug!(
            points = coords.len(),
            profile = profile,
            "OSRM request: {} points, profile {}",
            coords.len(),
            profile
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("alternatives", "false"),
                ("steps", "false"),
                ("geometries", "geojson"),
                ("overview", "full"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Routing(format!("Request failed on {}: {}", profile, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let snippet: String = error_text.chars().take(200).collect();
            return Err(AppError::Routing(format!(
                "HTTP {} on {}: {}",
                status, profile, snippet
            )));
        }

        let body: OsrmRouteResponse = response
            .json()
            .await
            .map_err(|e| AppError::Routing(format!("Failed to parse response: {}", e)))?;

        body.into_leg(profile)
    }
}

/// Append the first point when a round trip is not already closed
fn close_loop(points: &[Coordinates], round_trip: bool) -> Vec<Coordinates> {
    let mut coords = points.to_vec();
    if round_trip {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if first != last {
                coords.push(*first);
            }
        }
    }
    coords
}

#[async_trait]
impl RoutingOracle for OsrmClient {
    async fn route(
        &self,
        mode: TransportMode,
        points: &[Coordinates],
        round_trip: bool,
    ) -> Result<RouteLeg> {
        if points.len() < 2 {
            return Err(AppError::InvalidRequest(
                "Need at least 2 points with lat/lon".to_string(),
            ));
        }

        let coords = close_loop(points, round_trip);
        let mut last_error = None;

        for profile in self.profile_candidates(mode) {
            match self.try_profile(&profile, &coords).await {
                Ok(leg) => {
                    tracing::debug!(
                        profile = %profile,
                        distance_km = ?leg.distance_km,
                        "OSRM response: {:?}km via {}",
                        leg.distance_km, profile
                    );
                    return Ok(leg);
                }
                Err(e) => {
                    tracing::warn!(profile = %profile, "OSRM {} failed: {}", profile, e);
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no profile available".to_string());
        tracing::error!("OSRM: all profiles failed for {}: {}", mode, reason);
        Err(AppError::Routing(format!(
            "No route for mode {} (roundTrip: {})",
            mode, round_trip
        )))
    }
}

// OSRM API response types

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64, // meters
    duration: f64, // seconds
    geometry: geojson::Geometry,
}

impl OsrmRouteResponse {
    fn into_leg(self, profile: &str) -> Result<RouteLeg> {
        if self.code != "Ok" {
            return Err(AppError::Routing(format!(
                "OSRM code {} on {}: {}",
                self.code,
                profile,
                self.message.as_deref().unwrap_or("no message")
            )));
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Routing(format!("No route geometry for profile {}", profile)))?;

        if !matches!(route.geometry.value, geojson::Value::LineString(_)) {
            return Err(AppError::Routing(format!(
                "Unexpected geometry type for profile {}",
                profile
            )));
        }

        let positive = |v: f64| (v.is_finite() && v > 0.0).then_some(v);
        Ok(RouteLeg {
            geometry: route.geometry,
            distance_km: positive(route.distance / 1000.0),
            duration_min: positive(route.duration / 60.0),
            profile: profile.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn test_profile_candidates_forced_first_without_duplicates() {
        let client = OsrmClient::new("http://localhost:5001/".to_string())
            .with_profile(Some("foot".to_string()));
        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(
            client.profile_candidates(TransportMode::Walk),
            vec!["foot", "walking"]
        );
        assert_eq!(
            client.profile_candidates(TransportMode::Bike),
            vec!["foot", "cycling", "bike"]
        );
    }

    #[test]
    fn test_route_url_is_lon_lat() {
        let client = OsrmClient::new("http://osrm".to_string());
        let url = client.route_url("cycling", &[c(32.1, 34.8), c(32.2, 34.9)]);
        assert_eq!(url, "http://osrm/route/v1/cycling/34.8,32.1;34.9,32.2");
    }

    #[test]
    fn test_close_loop() {
        let a = c(1.0, 1.0);
        let b = c(2.0, 2.0);
        assert_eq!(close_loop(&[a, b], true), vec![a, b, a]);
        assert_eq!(close_loop(&[a, b, a], true), vec![a, b, a]);
        assert_eq!(close_loop(&[a, b], false), vec![a, b]);
    }

    #[test]
    fn test_response_conversion() {
        let body: OsrmRouteResponse = serde_json::from_str(
            r#"{"code":"Ok","routes":[{"distance":5240.0,"duration":3720.0,
                "geometry":{"type":"LineString","coordinates":[[2.35,48.85],[2.29,48.86]]}}]}"#,
        )
        .unwrap();
        let leg = body.into_leg("walking").unwrap();
        assert_eq!(leg.distance_km, Some(5.24));
        assert_eq!(leg.duration_min, Some(62.0));
        assert_eq!(leg.profile, "walking");

        let summary = leg.into_summary();
        assert!(summary.geojson.is_some());
        assert_eq!(summary.profile.as_deref(), Some("walking"));
    }

    #[test]
    fn test_response_without_routes_is_error() {
        let body: OsrmRouteResponse =
            serde_json::from_str(r#"{"code":"NoRoute","message":"Impossible route"}"#).unwrap();
        match body.into_leg("cycling") {
            Err(AppError::Routing(message)) => {
                assert!(message.contains("NoRoute"), "got {}", message);
                assert!(message.contains("Impossible route"));
            }
            other => panic!("expected routing error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_ok_code_rejected_even_with_routes() {
        let body: OsrmRouteResponse = serde_json::from_str(
            r#"{"code":"InvalidQuery","routes":[{"distance":1000.0,"duration":600.0,
                "geometry":{"type":"LineString","coordinates":[[2.35,48.85],[2.29,48.86]]}}]}"#,
        )
        .unwrap();
        match body.into_leg("walking") {
            Err(AppError::Routing(message)) => assert!(message.contains("InvalidQuery")),
            other => panic!("expected routing error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_route_requires_two_points() {
        let client = OsrmClient::new("http://localhost:1".to_string());
        let result = client.route(TransportMode::Walk, &[c(1.0, 1.0)], true).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }
}
