use crate::constants::SUMMARY_MAX_CHARS;
use crate::models::{Coordinates, RouteSummary, TransportMode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Request/Response types for API endpoints. Loosely-typed fields stay as
// `Value` here and are coerced by the itinerary normalization layer.

/// Keeps an explicit `null` distinguishable from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct AiPlanRequest {
    pub destination: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub mode: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl AiPlanRequest {
    /// Returns the trimmed destination and parsed mode
    pub fn validate(&self) -> Result<(String, TransportMode), String> {
        let destination = self
            .destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| "destination is required".to_string())?;
        let mode = self
            .mode
            .as_deref()
            .ok_or_else(|| "mode must be 'bike' or 'walk'".to_string())?
            .parse::<TransportMode>()
            .map_err(|_| "mode must be 'bike' or 'walk'".to_string())?;
        Ok((destination.to_string(), mode))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTripRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    /// A string, or a list of strings joined with " • "
    #[serde(default)]
    pub notes: Option<Value>,
    pub mode: Option<String>,
    #[serde(default)]
    pub destination: Option<Value>,
    #[serde(default)]
    pub image: Option<Value>,
    #[serde(default)]
    pub days: Option<Value>,
    #[serde(default)]
    pub total_distance_km: Option<f64>,
    #[serde(default)]
    pub map_points: Option<Value>,
    #[serde(default)]
    pub place_descriptions: Option<Value>,
    #[serde(default)]
    pub idem_key: Option<String>,
}

impl CreateTripRequest {
    /// Returns trimmed title, trimmed summary and parsed mode
    pub fn validate(&self) -> Result<(String, String, TransportMode), String> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "Title is required".to_string())?;
        let summary = validate_summary(self.summary.as_deref().unwrap_or(""))?;
        let mode = self
            .mode
            .as_deref()
            .ok_or_else(|| "Invalid mode".to_string())?
            .parse::<TransportMode>()
            .map_err(|_| "Invalid mode".to_string())?;
        Ok((title.to_string(), summary, mode))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTripRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub total_distance_km: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub destination: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub days: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub map_points: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub place_descriptions: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Value>,
}

/// Summary must be non-empty after trimming and at most 200 characters.
pub fn validate_summary(raw: &str) -> Result<String, String> {
    let summary = raw.trim();
    if summary.is_empty() {
        return Err("Summary is required".to_string());
    }
    if summary.chars().count() > SUMMARY_MAX_CHARS {
        return Err(format!(
            "Summary must be ≤ {} characters",
            SUMMARY_MAX_CHARS
        ));
    }
    Ok(summary.to_string())
}

#[derive(Debug, Deserialize)]
pub struct RoutePointInput {
    #[serde(default)]
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default)]
    pub points: Vec<RoutePointInput>,
    #[serde(default, rename = "roundTrip", alias = "round_trip")]
    pub round_trip: bool,
}

impl RouteRequest {
    /// Points that carry valid coordinates, in request order
    pub fn coordinates(&self) -> Vec<Coordinates> {
        self.points
            .iter()
            .filter_map(|p| Coordinates::from_pair(p.lat, p.lon))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    #[serde(flatten)]
    pub route: RouteSummary,
}
