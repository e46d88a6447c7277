use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{BoundingBox, Coordinates};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Circular search bias: results are restricted to a box around `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBias {
    pub center: Coordinates,
    pub radius_km: f64,
}

/// A single free-text place lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeRequest {
    pub place: String,
    /// Appended to the query as ", {context}" when non-empty
    pub context: Option<String>,
    /// Comma-separated language preference, e.g. "he,en"
    pub languages: String,
    pub bias: Option<GeoBias>,
}

impl GeocodeRequest {
    pub fn query(&self) -> String {
        match self.context.as_deref().filter(|c| !c.is_empty()) {
            Some(context) => format!("{}, {}", self.place, context),
            None => self.place.clone(),
        }
    }
}

/// Category search around a center ("park", "town", ...).
#[derive(Debug, Clone, PartialEq)]
pub struct NearbySearch {
    pub center: Coordinates,
    pub query: String,
    pub limit: usize,
    pub radius_km: f64,
    pub languages: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedPlace {
    pub name: String,
    pub coordinates: Coordinates,
}

/// Name → coordinates oracle.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best single match for the request, or `None` when nothing was found.
    async fn geocode(&self, request: &GeocodeRequest) -> Result<Option<Coordinates>>;

    /// Up to `limit` named places matching the query near the center.
    async fn search_nearby(&self, search: &NearbySearch) -> Result<Vec<NamedPlace>>;
}

#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimClient {
    pub fn new(base_url: String, user_agent: String) -> Self {
        NominatimClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
        }
    }

    async fn search(&self, params: &[(&str, String)]) -> Result<Vec<NominatimPlace>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("format", "json")])
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::Geocoding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Geocoding(format!(
                "Nominatim returned HTTP {}",
                response.status()
            )));
        }

        response
            .json::<Vec<NominatimPlace>>()
            .await
            .map_err(|e| AppError::Geocoding(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, request: &GeocodeRequest) -> Result<Option<Coordinates>> {
        let mut params = vec![
            ("limit", "1".to_string()),
            ("accept-language", request.languages.clone()),
            ("q", request.query()),
        ];
        if let Some(bias) = &request.bias {
            let bbox = BoundingBox::around(
                &bias.center,
                bias.radius_km,
                GEOCODE_VIEWBOX_MIN_DEG,
                GEOCODE_VIEWBOX_MAX_DEG,
            );
            params.push(("bounded", "1".to_string()));
            params.push(("viewbox", bbox.to_viewbox()));
        }

        let places = self.search(&params).await?;
        Ok(places.first().and_then(NominatimPlace::coordinates))
    }

    async fn search_nearby(&self, search: &NearbySearch) -> Result<Vec<NamedPlace>> {
        let bbox = BoundingBox::around(
            &search.center,
            search.radius_km,
            NEARBY_VIEWBOX_MIN_DEG,
            NEARBY_VIEWBOX_MAX_DEG,
        );
        let params = vec![
            ("limit", search.limit.to_string()),
            ("accept-language", search.languages.clone()),
            ("bounded", "1".to_string()),
            ("viewbox", bbox.to_viewbox()),
            ("q", search.query.clone()),
        ];

        let places = self.search(&params).await?;
        tracing::debug!(
            query = %search.query,
            found = places.len(),
            "Nearby search '{}' returned {} places",
            search.query,
            places.len()
        );

        Ok(places
            .into_iter()
            .filter_map(|place| place.into_named(&search.query))
            .collect())
    }
}

// Nominatim API response types (coordinates arrive as strings)

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimPlace {
    fn coordinates(&self) -> Option<Coordinates> {
        let lat = self.lat.as_deref()?.trim().parse::<f64>().ok();
        let lon = self.lon.as_deref()?.trim().parse::<f64>().ok();
        Coordinates::from_pair(lat, lon)
    }

    /// Short name is the first comma segment of the display name
    fn into_named(self, fallback: &str) -> Option<NamedPlace> {
        let coordinates = self.coordinates()?;
        let name = self
            .display_name
            .as_deref()
            .and_then(|d| d.split(',').next())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(fallback)
            .to_string();
        Some(NamedPlace { name, coordinates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_appends_context() {
        let mut request = GeocodeRequest {
            place: "Louvre".to_string(),
            context: Some("Paris, France".to_string()),
            languages: "en".to_string(),
            bias: None,
        };
        assert_eq!(request.query(), "Louvre, Paris, France");

        request.context = Some(String::new());
        assert_eq!(request.query(), "Louvre");
    }

    #[test]
    fn test_place_parsing() {
        let places: Vec<NominatimPlace> = serde_json::from_str(
            r#"[{"lat":"48.8606","lon":"2.3376","display_name":"Louvre Museum, Rue de Rivoli, Paris"},
                {"lat":"bogus","lon":"2.0","display_name":"Broken"},
                {"lat":"48.1","lon":"2.1"}]"#,
        )
        .unwrap();

        let mut iter = places.into_iter();
        let louvre = iter.next().unwrap().into_named("museum").unwrap();
        assert_eq!(louvre.name, "Louvre Museum");
        assert!((louvre.coordinates.lat - 48.8606).abs() < 1e-9);

        assert!(iter.next().unwrap().into_named("museum").is_none());

        let unnamed = iter.next().unwrap().into_named("museum").unwrap();
        assert_eq!(unnamed.name, "museum");
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = NominatimClient::new(
            "https://nominatim.example/".to_string(),
            DEFAULT_GEOCODER_USER_AGENT.to_string(),
        );
        assert_eq!(client.base_url, "https://nominatim.example");
    }
}
