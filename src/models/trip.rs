use crate::models::{Coordinates, TransportMode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl Destination {
    pub fn named(name: impl Into<String>) -> Self {
        Destination {
            name: name.into(),
            city: None,
            country: None,
            lat: None,
            lon: None,
        }
    }

    /// Center of the destination when both coordinates are known
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_pair(self.lat, self.lon)
    }

    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.lat = Some(coords.lat);
        self.lon = Some(coords.lon);
    }

    /// "name, city, country" with empty parts skipped; used as geocoding context
    pub fn search_context(&self) -> String {
        [Some(self.name.as_str()), self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A named, possibly unresolved, place on the map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapPoint {
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl MapPoint {
    pub fn resolved(name: impl Into<String>, coords: Coordinates) -> Self {
        MapPoint {
            name: name.into(),
            lat: Some(coords.lat),
            lon: Some(coords.lon),
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        MapPoint {
            name: name.into(),
            lat: None,
            lon: None,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_pair(self.lat, self.lon)
    }

    pub fn is_resolved(&self) -> bool {
        self.coordinates().is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overnight {
    pub city: String,
    pub lodging_suggestion: String,
}

/// One leg of the itinerary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Day {
    pub day: u32,
    pub distance_km: Option<f64>,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub waypoints: Vec<String>,
    #[serde(default)]
    pub overnight: Option<Overnight>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl Day {
    /// Ordered stop names: start, waypoints, end. Empty names are skipped.
    pub fn stop_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.start.as_str())
            .chain(self.waypoints.iter().map(String::as_str))
            .chain(std::iter::once(self.end.as_str()))
            .filter(|name| !name.trim().is_empty())
    }
}

/// Whole-trip routed geometry, independent of the per-day figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RouteSummary {
    pub geojson: Option<geojson::Geometry>,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceDescription {
    pub name: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ImageCredit {
    pub provider: Option<String>,
    pub author: Option<String>,
    pub username: Option<String>,
    pub link: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripImage {
    pub src: String,
    pub alt: Option<String>,
    pub credit: Option<ImageCredit>,
}

/// A planned itinerary, as returned by the AI planning endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub title: String,
    pub summary: String,
    pub destination: Destination,
    pub mode: TransportMode,
    pub total_distance_km: Option<f64>,
    pub days: Vec<Day>,
    pub map_points: Vec<MapPoint>,
    pub notes: Vec<String>,
    pub route: Option<RouteSummary>,
    pub place_descriptions: Vec<PlaceDescription>,
}

/// A stored trip owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub notes: String,
    pub mode: TransportMode,
    pub summary: String,
    pub destination: Destination,
    pub image: Option<TripImage>,
    pub total_distance_km: Option<f64>,
    pub days: Vec<Day>,
    pub map_points: Vec<MapPoint>,
    pub place_descriptions: Vec<PlaceDescription>,
    pub route: Option<RouteSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idem_key: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Trip content ready to be inserted; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub user_id: Uuid,
    pub idem_key: Option<String>,
    pub title: String,
    pub notes: String,
    pub mode: TransportMode,
    pub summary: String,
    pub destination: Destination,
    pub image: Option<TripImage>,
    pub total_distance_km: Option<f64>,
    pub days: Vec<Day>,
    pub map_points: Vec<MapPoint>,
    pub place_descriptions: Vec<PlaceDescription>,
    pub route: Option<RouteSummary>,
}

impl NewTrip {
    pub fn into_trip(self, id: Uuid, now: OffsetDateTime) -> Trip {
        Trip {
            id,
            user_id: self.user_id,
            title: self.title,
            notes: self.notes,
            mode: self.mode,
            summary: self.summary,
            destination: self.destination,
            image: self.image,
            total_distance_km: self.total_distance_km,
            days: self.days,
            map_points: self.map_points,
            place_descriptions: self.place_descriptions,
            route: self.route,
            idem_key: self.idem_key,
            created_at: now,
            updated_at: now,
        }
    }
}
