mod day_bounds;
mod extension;
mod linear_bike;
pub mod normalize;
mod outliers;
pub mod points;
mod refine;
pub mod resolver;

use crate::config::PlannerConfig;
use crate::constants::SUMMARY_MAX_CHARS;
use crate::error::{AppError, Result};
use crate::models::{
    round_km, AiPlanRequest, Day, Destination, MapPoint, Plan, RouteSummary, TransportMode,
};
use crate::services::geocoder::Geocoder;
use crate::services::llm::{plan_request, LlmClient};
use crate::services::narrative::{DescriptionRequest, NarrativeWriter};
use crate::services::osrm::RoutingOracle;
use std::sync::Arc;

pub use day_bounds::enforce_day_bounds;
pub use extension::DayExtender;
pub use linear_bike::correct_linear_bike;
pub use normalize::RawPlan;
pub use outliers::clamp_outliers;
pub use points::PointTable;
pub use refine::{overall_route, refine_day_distances, total_distance_km};
pub use resolver::{GeoAnchor, MinIntervalPacer, NoPause, Pacer, PlaceResolver, Resolution};

/// A working itinerary entering a normalization pass.
#[derive(Debug, Clone)]
pub struct Itinerary {
    pub mode: TransportMode,
    pub destination: Destination,
    pub days: Vec<Day>,
    pub map_points: Vec<MapPoint>,
}

/// Output of a normalization pass: coherent geography and bounded distances.
#[derive(Debug, Clone)]
pub struct NormalizedItinerary {
    pub destination: Destination,
    pub days: Vec<Day>,
    pub map_points: Vec<MapPoint>,
    pub total_distance_km: f64,
    pub route: Option<RouteSummary>,
}

/// Truncate to the mode's day count, renumber, then make walks loops and
/// chain bike days end-to-start.
pub fn shape_days(mode: TransportMode, days: &mut Vec<Day>) {
    days.truncate(mode.day_count());

    for (index, day) in days.iter_mut().enumerate() {
        day.day = index as u32 + 1;
    }

    match mode {
        TransportMode::Walk => {
            for day in days.iter_mut() {
                if day.start.is_empty() {
                    day.start = day.end.clone();
                }
                day.end = day.start.clone();
            }
        }
        TransportMode::Bike => {
            for i in 1..days.len() {
                let previous_end = days[i - 1].end.clone();
                if !previous_end.is_empty() {
                    days[i].start = previous_end;
                }
            }
        }
    }
}

/// Final rounding, with every day forced into the band.
fn finalize_distances(mode: TransportMode, days: &mut [Day]) -> f64 {
    let band = mode.daily_band();
    for day in days.iter_mut() {
        let km = day.distance_km.unwrap_or(band.min_km);
        day.distance_km = Some(band.clamp(round_km(km)));
    }
    total_distance_km(days)
}

/// Sequences geocoding, clamping, distance enforcement, routing and day
/// extension over a plan. Oracle failures degrade individual steps and never
/// fail the pass.
pub struct TripPlanner {
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn RoutingOracle>,
    llm: Arc<dyn LlmClient>,
    resolver: PlaceResolver,
    config: PlannerConfig,
}

impl TripPlanner {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn RoutingOracle>,
        llm: Arc<dyn LlmClient>,
        config: PlannerConfig,
    ) -> Self {
        let resolver = PlaceResolver::new(geocoder.clone(), &config);
        TripPlanner {
            geocoder,
            router,
            llm,
            resolver,
            config,
        }
    }

    /// Replace the geocoder pacing policy
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.resolver = self.resolver.with_pacer(pacer);
        self
    }

    pub fn router(&self) -> &dyn RoutingOracle {
        self.router.as_ref()
    }

    /// Geocode a destination when it has no coordinates yet
    pub async fn locate(&self, destination: &mut Destination) -> GeoAnchor {
        self.resolver.locate_destination(destination).await
    }

    /// One full normalization pass.
    pub async fn normalize(&self, itinerary: Itinerary) -> NormalizedItinerary {
        let Itinerary {
            mode,
            mut destination,
            mut days,
            map_points,
        } = itinerary;

        shape_days(mode, &mut days);
        correct_linear_bike(mode, &mut days, map_points.iter().map(|p| p.name.as_str()));

        let anchor = self.resolver.locate_destination(&mut destination).await;
        let center = anchor.center;

        let mut points = PointTable::from_points(map_points);
        clamp_outliers(&mut points, center.as_ref(), mode);
        let resolved = self.resolver.resolve_days(&days, &mut points, &anchor).await;
        clamp_outliers(&mut points, center.as_ref(), mode);

        enforce_day_bounds(&mut days, &points, mode);
        let refined = refine_day_distances(self.router.as_ref(), mode, &mut days, &points).await;

        if self.config.extend_days {
            if let Some(center) = center {
                DayExtender::new(
                    self.geocoder.as_ref(),
                    self.router.as_ref(),
                    &self.config.primary_languages,
                )
                .extend_days(mode, &mut days, &mut points, &center)
                .await;
            }
        }

        let total_distance_km = finalize_distances(mode, &mut days);
        let route = overall_route(self.router.as_ref(), mode, &points).await;

        tracing::info!(
            mode = %mode,
            points = points.len(),
            resolved,
            refined,
            total_distance_km,
            "Normalized {} plan for '{}': {} days, {:.1}km",
            mode,
            destination.name,
            days.len(),
            total_distance_km
        );

        NormalizedItinerary {
            destination,
            days,
            map_points: points.into_points(),
            total_distance_km,
            route,
        }
    }

    /// Ask the model for a plan, normalize it and attach place descriptions.
    pub async fn plan_with_ai(&self, request: &AiPlanRequest) -> Result<Plan> {
        let (destination, mode) = request.validate().map_err(AppError::InvalidRequest)?;
        let notes = request.notes.as_deref().unwrap_or("");

        let reply = self.llm.chat_json(plan_request(&destination, mode, notes)).await?;
        let raw = RawPlan::from_value(&reply)?;
        if raw.days.len() < mode.day_count() {
            return Err(AppError::BadModelOutput(format!(
                "{} plan needs {} days, model returned {}",
                mode,
                mode.day_count(),
                raw.days.len()
            )));
        }

        let plan_destination = raw
            .destination
            .clone()
            .unwrap_or_else(|| Destination::named(destination.as_str()));
        let normalized = self
            .normalize(Itinerary {
                mode,
                destination: plan_destination,
                days: raw.days,
                map_points: raw.map_points,
            })
            .await;

        let names = description_names(&normalized);
        let highlights: Vec<String> = normalized
            .days
            .iter()
            .flat_map(|d| d.highlights.iter().cloned())
            .collect();
        let place_descriptions = NarrativeWriter::new(self.llm.as_ref(), self.config.description_place_limit)
            .describe(DescriptionRequest {
                destination: &normalized.destination.name,
                mode,
                names: &names,
                highlights: &highlights,
            })
            .await?;

        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(normalized.destination.name.as_str())
            .to_string();
        let summary = raw
            .summary
            .map(|s| s.chars().take(SUMMARY_MAX_CHARS).collect())
            .unwrap_or_else(|| fallback_summary(mode, &normalized));

        Ok(Plan {
            title,
            summary,
            mode,
            total_distance_km: Some(normalized.total_distance_km),
            destination: normalized.destination,
            days: normalized.days,
            map_points: normalized.map_points,
            notes: raw.notes,
            route: normalized.route,
            place_descriptions,
        })
    }
}

/// Map point names, or the day stops when the plan has no points
fn description_names(itinerary: &NormalizedItinerary) -> Vec<String> {
    if !itinerary.map_points.is_empty() {
        return itinerary.map_points.iter().map(|p| p.name.clone()).collect();
    }
    let mut table = PointTable::new();
    table.register_days(&itinerary.days);
    table.names().map(str::to_string).collect()
}

fn fallback_summary(mode: TransportMode, itinerary: &NormalizedItinerary) -> String {
    let shape = match mode {
        TransportMode::Walk => "walking loop",
        TransportMode::Bike => "two-day bike ride",
    };
    let summary = format!(
        "A {:.1} km {} around {}.",
        itinerary.total_distance_km, shape, itinerary.destination.name
    );
    summary.chars().take(SUMMARY_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, Overnight};
    use crate::test_support::{StubGeocoder, StubLlm, StubRouter};
    use serde_json::json;

    fn c(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    fn day(start: &str, waypoints: &[&str], end: &str) -> Day {
        Day {
            day: 9,
            distance_km: None,
            start: start.to_string(),
            end: end.to_string(),
            waypoints: waypoints.iter().map(|w| w.to_string()).collect(),
            overnight: None,
            highlights: vec![],
        }
    }

    fn planner(geocoder: StubGeocoder, router: StubRouter, llm: StubLlm) -> TripPlanner {
        TripPlanner::new(
            Arc::new(geocoder),
            Arc::new(router),
            Arc::new(llm),
            PlannerConfig::default(),
        )
        .with_pacer(Arc::new(NoPause))
    }

    #[test]
    fn test_shape_walk_days() {
        let mut days = vec![day("Louvre", &["Seine"], "Eiffel Tower"), day("X", &[], "Y")];
        shape_days(TransportMode::Walk, &mut days);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day, 1);
        assert_eq!(days[0].end, "Louvre");

        let mut days = vec![day("", &[], "Louvre")];
        shape_days(TransportMode::Walk, &mut days);
        assert_eq!((days[0].start.as_str(), days[0].end.as_str()), ("Louvre", "Louvre"));
    }

    #[test]
    fn test_shape_bike_days_chains() {
        let mut days = vec![
            day("Lisbon", &[], "Sintra"),
            day("Cascais", &[], "Ericeira"),
            day("Extra", &[], "Extra"),
        ];
        shape_days(TransportMode::Bike, &mut days);
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].start, "Sintra");
        assert_eq!(days[1].day, 2);
    }

    #[test]
    fn test_finalize_rounds_and_clamps() {
        let mut days = vec![day("A", &[], "B"), day("B", &[], "C")];
        days[0].distance_km = Some(52.345);
        days[1].distance_km = Some(91.0);
        let total = finalize_distances(TransportMode::Bike, &mut days);
        assert_eq!(days[0].distance_km, Some(52.3));
        assert_eq!(days[1].distance_km, Some(75.0));
        assert_eq!(total, 127.3);
    }

    #[tokio::test]
    async fn test_normalize_walk_pass() {
        let paris = c(48.8566, 2.3522);
        let geocoder = StubGeocoder::new()
            .with_place("Paris", paris)
            .with_place("Louvre", c(48.8606, 2.3376))
            .with_place("Pont Neuf", c(48.8570, 2.3410));
        let p = planner(geocoder, StubRouter::straight_line(1.3), StubLlm::failing());

        let result = p
            .normalize(Itinerary {
                mode: TransportMode::Walk,
                destination: Destination::named("Paris"),
                days: vec![day("Louvre", &["Pont Neuf", "Atlantis"], "Somewhere")],
                map_points: vec![MapPoint::resolved("Lyon", c(45.764, 4.8357))],
            })
            .await;

        assert_eq!(result.destination.coordinates(), Some(paris));
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].start, result.days[0].end);
        let km = result.days[0].distance_km.unwrap();
        assert!((5.0..=15.0).contains(&km));
        assert_eq!(result.total_distance_km, km);

        let names: Vec<&str> = result.map_points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Lyon", "Louvre", "Pont Neuf", "Atlantis"]);
        for point in &result.map_points {
            assert_eq!(point.lat.is_some(), point.lon.is_some());
            if let Some(coords) = point.coordinates() {
                assert!(coords.distance_to(&paris) <= 12.0);
            }
        }
        assert!(result.route.is_some());
    }

    #[tokio::test]
    async fn test_plan_with_ai_bike() {
        let plan = json!({
            "destination": "Lisbon",
            "mode": "bike",
            "days": [
                {"day": 1, "start": "Lisbon", "end": "Sintra", "waypoints": ["Belém"],
                 "overnight": {"city": "Sintra", "lodging_suggestion": "Guesthouse"}},
                {"day": 2, "start": "Sintra", "end": "Lisbon", "waypoints": []}
            ],
            "map_points": [{"name": "Lisbon", "lat": null, "lon": null}],
            "notes": ["Bring water"]
        });
        let geocoder = StubGeocoder::new()
            .with_place("Lisbon", c(38.7223, -9.1393))
            .with_place("Sintra", c(38.8029, -9.3817))
            .with_place("Belém", c(38.6970, -9.2064));
        let p = planner(geocoder, StubRouter::straight_line(1.4), StubLlm::planning(plan));

        let request = AiPlanRequest {
            destination: Some("Lisbon".to_string()),
            notes: None,
            mode: Some("bike".to_string()),
            title: None,
        };
        let result = p.plan_with_ai(&request).await.unwrap();

        assert_eq!(result.title, "Lisbon");
        assert_eq!(result.days.len(), 2);
        assert_eq!(result.days[0].end, result.days[1].start);
        assert_ne!(result.days[0].start.to_lowercase(), result.days[1].end.to_lowercase());
        assert_eq!(result.days[1].end, "Belém");
        for d in &result.days {
            let km = d.distance_km.unwrap();
            assert!((45.0..=75.0).contains(&km), "got {}", km);
        }
        let sum: f64 = result.days.iter().filter_map(|d| d.distance_km).sum();
        assert_eq!(result.total_distance_km, Some(round_km(sum)));
        assert_eq!(result.notes, vec!["Bring water"]);
        assert_eq!(result.place_descriptions.len(), result.map_points.len());
        assert_eq!(
            result.days[0].overnight,
            Some(Overnight {
                city: "Sintra".to_string(),
                lodging_suggestion: "Guesthouse".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_plan_with_ai_rejects_bad_output() {
        let p = planner(
            StubGeocoder::new(),
            StubRouter::failing(),
            StubLlm::from_fn(|_| Ok(json!({"raw": "I cannot help"}))),
        );
        let request = AiPlanRequest {
            destination: Some("Paris".to_string()),
            notes: None,
            mode: Some("walk".to_string()),
            title: None,
        };
        assert!(matches!(
            p.plan_with_ai(&request).await,
            Err(AppError::BadModelOutput(_))
        ));

        let p = planner(
            StubGeocoder::new(),
            StubRouter::failing(),
            StubLlm::from_fn(|_| Ok(json!({"days": [{"start": "Lisbon", "end": "Sintra"}]}))),
        );
        let request = AiPlanRequest {
            destination: Some("Lisbon".to_string()),
            notes: None,
            mode: Some("bike".to_string()),
            title: None,
        };
        assert!(matches!(
            p.plan_with_ai(&request).await,
            Err(AppError::BadModelOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_plan_with_ai_validates_request() {
        let p = planner(StubGeocoder::new(), StubRouter::failing(), StubLlm::failing());
        let request = AiPlanRequest {
            destination: Some("Paris".to_string()),
            notes: None,
            mode: Some("car".to_string()),
            title: None,
        };
        assert!(matches!(
            p.plan_with_ai(&request).await,
            Err(AppError::InvalidRequest(_))
        ));
    }
}
