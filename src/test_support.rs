//! Deterministic oracle doubles shared by unit and integration tests.

use crate::error::{AppError, Result};
use crate::models::{path_length_km, Coordinates, TransportMode};
use crate::services::geocoder::{GeocodeRequest, Geocoder, NamedPlace, NearbySearch};
use crate::services::llm::{ChatRequest, LlmClient};
use crate::services::osrm::{RouteLeg, RoutingOracle};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers from a fixed gazetteer keyed by the lowercased `place`.
#[derive(Default)]
pub struct StubGeocoder {
    places: HashMap<String, Coordinates>,
    nearby: HashMap<String, Vec<NamedPlace>>,
    failing: bool,
    calls: Mutex<Vec<GeocodeRequest>>,
    nearby_calls: Mutex<Vec<NearbySearch>>,
}

impl StubGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call errors, as if the service were down
    pub fn failing() -> Self {
        StubGeocoder {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_place(mut self, place: &str, coordinates: Coordinates) -> Self {
        self.places.insert(place.trim().to_lowercase(), coordinates);
        self
    }

    pub fn with_nearby(mut self, query: &str, places: Vec<NamedPlace>) -> Self {
        self.nearby.insert(query.to_string(), places);
        self
    }

    pub fn calls(&self) -> Vec<GeocodeRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn nearby_calls(&self) -> Vec<NearbySearch> {
        self.nearby_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, request: &GeocodeRequest) -> Result<Option<Coordinates>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        if self.failing {
            return Err(AppError::Geocoding("stub geocoder is down".to_string()));
        }
        Ok(self.places.get(&request.place.trim().to_lowercase()).copied())
    }

    async fn search_nearby(&self, search: &NearbySearch) -> Result<Vec<NamedPlace>> {
        if let Ok(mut calls) = self.nearby_calls.lock() {
            calls.push(search.clone());
        }
        if self.failing {
            return Err(AppError::Geocoding("stub geocoder is down".to_string()));
        }
        let mut places = self.nearby.get(&search.query).cloned().unwrap_or_default();
        places.truncate(search.limit);
        Ok(places)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteCall {
    pub mode: TransportMode,
    pub points: Vec<Coordinates>,
    pub round_trip: bool,
}

enum RouterBehavior {
    Fixed(f64),
    StraightLine(f64),
    Failing,
}

/// Routing double with a straight-line geometry through the given points.
pub struct StubRouter {
    behavior: RouterBehavior,
    calls: Mutex<Vec<RouteCall>>,
}

impl StubRouter {
    fn with_behavior(behavior: RouterBehavior) -> Self {
        StubRouter {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every route measures `distance_km`
    pub fn fixed(distance_km: f64) -> Self {
        Self::with_behavior(RouterBehavior::Fixed(distance_km))
    }

    /// Haversine length of the (closed, for round trips) path times `factor`
    pub fn straight_line(factor: f64) -> Self {
        Self::with_behavior(RouterBehavior::StraightLine(factor))
    }

    /// Every profile fails
    pub fn failing() -> Self {
        Self::with_behavior(RouterBehavior::Failing)
    }

    pub fn calls(&self) -> Vec<RouteCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RoutingOracle for StubRouter {
    async fn route(
        &self,
        mode: TransportMode,
        points: &[Coordinates],
        round_trip: bool,
    ) -> Result<RouteLeg> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RouteCall {
                mode,
                points: points.to_vec(),
                round_trip,
            });
        }
        if points.len() < 2 {
            return Err(AppError::InvalidRequest(
                "Need at least 2 points with lat/lon".to_string(),
            ));
        }

        let mut path = points.to_vec();
        if round_trip && points.first() != points.last() {
            path.push(points[0]);
        }

        let distance_km = match self.behavior {
            RouterBehavior::Fixed(km) => km,
            RouterBehavior::StraightLine(factor) => path_length_km(&path) * factor,
            RouterBehavior::Failing => {
                return Err(AppError::Routing(format!(
                    "No route for mode {} (roundTrip: {})",
                    mode, round_trip
                )))
            }
        };

        let line = path.iter().map(|c| vec![c.lon, c.lat]).collect();
        Ok(RouteLeg {
            geometry: geojson::Geometry::new(geojson::Value::LineString(line)),
            distance_km: Some(distance_km),
            duration_min: Some(distance_km * 12.0),
            profile: mode.osrm_profiles()[0].to_string(),
        })
    }
}

type Responder = Box<dyn Fn(&ChatRequest) -> Result<Value> + Send + Sync>;

/// Chat double. Description requests (a JSON payload with `places`) are
/// answered with one blurb per place; everything else gets the plan.
pub struct StubLlm {
    responder: Responder,
    calls: Mutex<Vec<ChatRequest>>,
}

impl StubLlm {
    pub fn from_fn(responder: impl Fn(&ChatRequest) -> Result<Value> + Send + Sync + 'static) -> Self {
        StubLlm {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn planning(plan: Value) -> Self {
        Self::from_fn(move |request| {
            Ok(description_places(request)
                .map(|places| echo_descriptions(&places))
                .unwrap_or_else(|| plan.clone()))
        })
    }

    pub fn failing() -> Self {
        Self::from_fn(|_| Err(AppError::Llm("stub model is down".to_string())))
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// Places listed in a description request, if this is one
pub fn description_places(request: &ChatRequest) -> Option<Vec<String>> {
    let user = request.messages.iter().rev().find(|m| m.role == "user")?;
    let payload: Value = serde_json::from_str(&user.content).ok()?;
    let places = payload.get("places")?.as_array()?;
    Some(
        places
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

pub fn echo_descriptions(places: &[String]) -> Value {
    let items: Vec<Value> = places
        .iter()
        .map(|name| json!({"name": name, "summary": format!("{} is worth a stop.", name)}))
        .collect();
    json!({ "items": items })
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn chat_json(&self, request: ChatRequest) -> Result<Value> {
        let answer = (self.responder)(&request);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
        answer
    }
}
