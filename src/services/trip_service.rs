use crate::db::TripRepository;
use crate::error::{AppError, Result};
use crate::models::{
    round_km, validate_summary, AiPlanRequest, CreateTripRequest, Day, Destination, NewTrip, Plan,
    TransportMode, Trip, UpdateTripRequest,
};
use crate::services::itinerary::{normalize, shape_days, Itinerary, TripPlanner};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Trip CRUD on top of a repository, running the normalization pass on
/// client-submitted itineraries unless fast mode is on.
pub struct TripService {
    repo: Arc<dyn TripRepository>,
    planner: Arc<TripPlanner>,
    fast_mode: bool,
}

impl TripService {
    pub fn new(repo: Arc<dyn TripRepository>, planner: Arc<TripPlanner>, fast_mode: bool) -> Self {
        TripService {
            repo,
            planner,
            fast_mode,
        }
    }

    pub fn planner(&self) -> &TripPlanner {
        &self.planner
    }

    pub fn repository(&self) -> &dyn TripRepository {
        self.repo.as_ref()
    }

    pub fn fast_mode(&self) -> bool {
        self.fast_mode
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Trip>> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Trip> {
        self.repo
            .find_for_user(id, user_id)
            .await?
            .ok_or_else(trip_not_found)
    }

    pub async fn plan(&self, request: &AiPlanRequest) -> Result<Plan> {
        self.planner.plan_with_ai(request).await
    }

    /// Create a trip. `client_key` comes from the idempotency headers; the
    /// body `idem_key` is used when no header was sent. Returns the trip and
    /// whether it was newly created.
    pub async fn create(
        &self,
        user_id: Uuid,
        client_key: Option<&str>,
        request: CreateTripRequest,
    ) -> Result<(Trip, bool)> {
        let (title, summary, mode) = request.validate().map_err(AppError::InvalidRequest)?;

        let idem_key = client_key
            .or(request.idem_key.as_deref())
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| format!("{}:{}", user_id, k));

        // A replay never re-runs the pipeline
        if let Some(key) = idem_key.as_deref() {
            if let Some(existing) = self.repo.find_by_idem_key(key).await? {
                tracing::debug!("Replayed create for idempotency key '{}'", key);
                return Ok((existing, false));
            }
        }

        let destination = request
            .destination
            .as_ref()
            .and_then(normalize::destination)
            .unwrap_or_else(|| Destination::named(title.as_str()));
        let days = request.days.as_ref().map(normalize::days).unwrap_or_default();
        let map_points = request
            .map_points
            .as_ref()
            .map(normalize::map_points)
            .unwrap_or_default();

        let mut trip = NewTrip {
            user_id,
            idem_key,
            title,
            notes: request.notes.as_ref().map(normalize::notes_text).unwrap_or_default(),
            mode,
            summary,
            destination,
            image: request.image.as_ref().and_then(normalize::image),
            total_distance_km: None,
            days,
            map_points,
            place_descriptions: request
                .place_descriptions
                .as_ref()
                .map(normalize::place_descriptions)
                .unwrap_or_default(),
            route: None,
        };

        if self.fast_mode {
            trip.total_distance_km = request
                .total_distance_km
                .filter(|km| km.is_finite())
                .or_else(|| positive_total(&trip.days));
        } else {
            let normalized = self
                .planner
                .normalize(Itinerary {
                    mode,
                    destination: trip.destination,
                    days: trip.days,
                    map_points: trip.map_points,
                })
                .await;
            trip.destination = normalized.destination;
            trip.days = normalized.days;
            trip.map_points = normalized.map_points;
            trip.total_distance_km = Some(normalized.total_distance_km);
            trip.route = normalized.route;
        }

        let (stored, created) = self.repo.insert(trip).await?;
        if created {
            tracing::info!("Created {} trip {} for user {}", stored.mode, stored.id, user_id);
        }
        Ok((stored, created))
    }

    /// Partial update. Changing mode, days or map points re-runs the
    /// normalization pass; an explicit `total_distance_km` overrides the
    /// recomputed total.
    pub async fn update(&self, user_id: Uuid, id: Uuid, request: UpdateTripRequest) -> Result<Trip> {
        let mut trip = self.get(user_id, id).await?;

        if let Some(title) = request.title.as_deref() {
            let title = title.trim();
            if title.is_empty() {
                return Err(AppError::InvalidRequest("Title cannot be empty".to_string()));
            }
            trip.title = title.to_string();
        }
        if let Some(summary) = request.summary.as_deref() {
            trip.summary = validate_summary(summary).map_err(AppError::InvalidRequest)?;
        }
        if let Some(notes) = request.notes {
            trip.notes = notes;
        }

        let previous_mode = trip.mode;
        if let Some(mode) = request.mode.as_deref() {
            trip.mode = mode
                .parse::<TransportMode>()
                .map_err(|_| AppError::InvalidRequest("Invalid mode".to_string()))?;
        }

        if let Some(value) = request.destination.as_ref() {
            match normalize::destination(value) {
                Some(mut destination) => {
                    if !self.fast_mode {
                        self.planner.locate(&mut destination).await;
                    }
                    trip.destination = destination;
                }
                None => tracing::debug!("Ignoring unusable destination for trip {}", id),
            }
        }
        if let Some(value) = request.place_descriptions.as_ref() {
            trip.place_descriptions = normalize::place_descriptions(value);
        }
        if let Some(value) = request.image.as_ref() {
            trip.image = normalize::image(value);
        }

        let days = request.days.as_ref().map(normalize::days);
        let map_points = request.map_points.as_ref().map(normalize::map_points);
        let recompute = trip.mode != previous_mode || days.is_some() || map_points.is_some();

        if recompute {
            // New days without new points: rebuild the points from the days
            let map_points = match (&days, map_points) {
                (_, Some(points)) => points,
                (Some(_), None) => Vec::new(),
                (None, None) => std::mem::take(&mut trip.map_points),
            };
            let days = days.unwrap_or_else(|| std::mem::take(&mut trip.days));

            if self.fast_mode {
                trip.days = days;
                shape_days(trip.mode, &mut trip.days);
                trip.map_points = map_points;
                trip.total_distance_km = positive_total(&trip.days);
            } else {
                let normalized = self
                    .planner
                    .normalize(Itinerary {
                        mode: trip.mode,
                        destination: trip.destination.clone(),
                        days,
                        map_points,
                    })
                    .await;
                trip.destination = normalized.destination;
                trip.days = normalized.days;
                trip.map_points = normalized.map_points;
                trip.total_distance_km = Some(normalized.total_distance_km);
                trip.route = normalized.route;
            }
        }

        match request.total_distance_km {
            Some(Value::Null) if !recompute => trip.total_distance_km = None,
            Some(ref value) => {
                if let Some(km) = value.as_f64().filter(|km| km.is_finite()) {
                    trip.total_distance_km = Some(km);
                }
            }
            None => {}
        }

        let updated = self.repo.update(&trip).await?.ok_or_else(trip_not_found)?;
        tracing::info!("Updated trip {} (recomputed: {})", id, recompute);
        Ok(updated)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        if !self.repo.delete(id, user_id).await? {
            return Err(trip_not_found());
        }
        tracing::info!("Deleted trip {} for user {}", id, user_id);
        Ok(())
    }
}

fn trip_not_found() -> AppError {
    AppError::NotFound("Trip not found".to_string())
}

/// Sum of the day distances, `None` unless positive
fn positive_total(days: &[Day]) -> Option<f64> {
    let total = round_km(days.iter().filter_map(|d| d.distance_km).sum());
    (total > 0.0).then_some(total)
}
