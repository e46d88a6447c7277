use super::trip_queries;
use crate::error::{AppError, Result};
use crate::models::{
    Day, Destination, MapPoint, NewTrip, PlaceDescription, RouteSummary, TransportMode, Trip,
    TripImage,
};
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Trip fields read from storage, before the mode is validated.
pub(super) struct RawTripRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub notes: String,
    pub mode: String,
    pub summary: String,
    pub destination: Destination,
    pub image: Option<TripImage>,
    pub total_distance_km: Option<f64>,
    pub days: Vec<Day>,
    pub map_points: Vec<MapPoint>,
    pub place_descriptions: Vec<PlaceDescription>,
    pub route: Option<RouteSummary>,
    pub idem_key: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl RawTripRow {
    pub fn into_trip(self) -> Trip {
        let mode = self.mode.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid mode '{}' for trip {}, defaulting to walk",
                self.mode,
                self.id
            );
            TransportMode::Walk
        });

        Trip {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            notes: self.notes,
            mode,
            summary: self.summary,
            destination: self.destination,
            image: self.image,
            total_distance_km: self.total_distance_km,
            days: self.days,
            map_points: self.map_points,
            place_descriptions: self.place_descriptions,
            route: self.route,
            idem_key: self.idem_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Storage for trips. Every read and write is scoped to the owning user,
/// except the idempotency lookup whose key already embeds the user id.
#[async_trait]
pub trait TripRepository: Send + Sync {
    /// Newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trip>>;

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Trip>>;

    async fn find_by_idem_key(&self, idem_key: &str) -> Result<Option<Trip>>;

    /// Store a new trip unless its idempotency key is taken, in which case
    /// the existing trip is returned. The flag is true when a row was created.
    async fn insert(&self, trip: NewTrip) -> Result<(Trip, bool)>;

    /// Overwrite the editable fields; `None` when the trip is gone.
    async fn update(&self, trip: &Trip) -> Result<Option<Trip>>;

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn health_check(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

pub struct PgTripRepository {
    pool: sqlx::PgPool,
}

impl PgTripRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trip>> {
        Ok(trip_queries::list_trips_for_user(&self.pool, user_id).await?)
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Trip>> {
        Ok(trip_queries::find_trip_for_user(&self.pool, id, user_id).await?)
    }

    async fn find_by_idem_key(&self, idem_key: &str) -> Result<Option<Trip>> {
        Ok(trip_queries::find_trip_by_idem_key(&self.pool, idem_key).await?)
    }

    async fn insert(&self, trip: NewTrip) -> Result<(Trip, bool)> {
        let now = OffsetDateTime::now_utc();
        if let Some(created) = trip_queries::insert_trip(&self.pool, Uuid::new_v4(), &trip, now).await? {
            return Ok((created, true));
        }

        // Lost the race on the idempotency key: hand back the winner
        let key = trip.idem_key.as_deref().unwrap_or_default();
        tracing::info!("Idempotency key conflict on '{}', returning existing trip", key);
        trip_queries::find_trip_by_idem_key(&self.pool, key)
            .await?
            .map(|existing| (existing, false))
            .ok_or_else(|| AppError::Internal("Trip insert returned no row".to_string()))
    }

    async fn update(&self, trip: &Trip) -> Result<Option<Trip>> {
        Ok(trip_queries::update_trip(&self.pool, trip, OffsetDateTime::now_utc()).await?)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(trip_queries::delete_trip(&self.pool, id, user_id).await?)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
