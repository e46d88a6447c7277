//! Coercion of loosely-typed plan documents (model output, client payloads)
//! into the strict itinerary types. Everything downstream of this module can
//! assume well-formed input.

use crate::constants::{DESCRIPTION_LANG_MAX_CHARS, PLACE_DESCRIPTIONS_MAX};
use crate::error::{AppError, Result};
use crate::models::{
    Day, Destination, ImageCredit, MapPoint, Overnight, PlaceDescription, TripImage,
};
use serde_json::Value;

/// Separator used when notes arrive as a list but are stored as one string
pub const NOTES_SEPARATOR: &str = " • ";

/// A model-produced plan after coercion. Only `days` is mandatory.
#[derive(Debug, Clone, Default)]
pub struct RawPlan {
    pub destination: Option<Destination>,
    pub summary: Option<String>,
    pub days: Vec<Day>,
    pub map_points: Vec<MapPoint>,
    pub notes: Vec<String>,
}

impl RawPlan {
    /// Fails with `BadModelOutput` unless the document is an object with a
    /// `days` array.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AppError::BadModelOutput("plan is not a JSON object".to_string()))?;
        let days = object
            .get("days")
            .filter(|d| d.is_array())
            .ok_or_else(|| AppError::BadModelOutput("plan has no days array".to_string()))?;

        Ok(RawPlan {
            destination: object.get("destination").and_then(destination),
            summary: object.get("summary").and_then(text),
            days: self::days(days),
            map_points: object.get("map_points").map(map_points).unwrap_or_default(),
            notes: object.get("notes").map(string_list).unwrap_or_default(),
        })
    }
}

/// Trimmed, non-empty text. Numbers are accepted and rendered as text.
fn text(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

fn finite(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

/// Both coordinates or neither
fn coordinate_pair(object: &serde_json::Map<String, Value>) -> (Option<f64>, Option<f64>) {
    match (finite(object.get("lat")), finite(object.get("lon"))) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => (None, None),
    }
}

pub fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(text).collect())
        .unwrap_or_default()
}

/// Accepts a plain name or `{name, city, country, lat, lon}`. The name
/// falls back to "city, country".
pub fn destination(value: &Value) -> Option<Destination> {
    match value {
        Value::String(s) => {
            let name = s.trim();
            (!name.is_empty()).then(|| Destination::named(name))
        }
        Value::Object(object) => {
            let city = object.get("city").and_then(text);
            let country = object.get("country").and_then(text);
            let name = object.get("name").and_then(text).or_else(|| {
                let joined = [city.as_deref(), country.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", ");
                (!joined.is_empty()).then_some(joined)
            })?;
            let (lat, lon) = coordinate_pair(object);
            Some(Destination {
                name,
                city,
                country,
                lat,
                lon,
            })
        }
        _ => None,
    }
}

/// Named points with optional coordinates. Nameless entries are dropped.
pub fn map_points(value: &Value) -> Vec<MapPoint> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|object| {
            let name = object.get("name").and_then(text)?;
            let (lat, lon) = coordinate_pair(object);
            Some(MapPoint { name, lat, lon })
        })
        .collect()
}

fn overnight(value: &Value) -> Option<Overnight> {
    let object = value.as_object()?;
    Some(Overnight {
        city: object.get("city").and_then(text).unwrap_or_default(),
        lodging_suggestion: object
            .get("lodging_suggestion")
            .and_then(text)
            .unwrap_or_default(),
    })
}

pub fn days(value: &Value) -> Vec<Day> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(index, object)| {
            let number = object
                .get("day")
                .and_then(Value::as_u64)
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(index as u32 + 1);
            Day {
                day: number,
                distance_km: finite(object.get("distance_km")),
                start: object.get("start").and_then(text).unwrap_or_default(),
                end: object.get("end").and_then(text).unwrap_or_default(),
                waypoints: object.get("waypoints").map(string_list).unwrap_or_default(),
                overnight: object.get("overnight").and_then(overnight),
                highlights: object.get("highlights").map(string_list).unwrap_or_default(),
            }
        })
        .collect()
}

/// Notes as stored on a trip: a string as-is, or a list joined
pub fn notes_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) => string_list(value).join(NOTES_SEPARATOR),
        _ => String::new(),
    }
}

/// Dropped when `src` is missing or blank
pub fn image(value: &Value) -> Option<TripImage> {
    let object = value.as_object()?;
    let src = object.get("src").and_then(Value::as_str).map(str::trim)?;
    if src.is_empty() {
        return None;
    }

    let credit = object.get("credit").and_then(Value::as_object).map(|c| {
        let field = |key: &str| c.get(key).and_then(text);
        ImageCredit {
            provider: field("provider"),
            author: field("author"),
            username: field("username"),
            link: field("link"),
            source: field("source"),
        }
    });

    Some(TripImage {
        src: src.to_string(),
        alt: object.get("alt").and_then(Value::as_str).map(str::to_string),
        credit,
    })
}

/// Entries need a name and a summary; `lang` is cut to a short tag.
pub fn place_descriptions(value: &Value) -> Vec<PlaceDescription> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|object| {
            let string = |key: &str| {
                object
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };
            Some(PlaceDescription {
                name: string("name")?.to_string(),
                summary: string("summary")?.to_string(),
                url: string("url").map(str::to_string),
                lang: string("lang").map(|l| l.chars().take(DESCRIPTION_LANG_MAX_CHARS).collect()),
            })
        })
        .take(PLACE_DESCRIPTIONS_MAX)
        .collect()
}
