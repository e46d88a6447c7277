use super::trip_repository::RawTripRow;
use crate::models::{
    Day, Destination, MapPoint, NewTrip, PlaceDescription, RouteSummary, Trip, TripImage,
};
use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

const TRIP_COLUMNS: &str = "id, user_id, title, notes, mode, summary, destination, image, \
    total_distance_km, days, map_points, place_descriptions, route, idem_key, \
    created_at, updated_at";

/// List a user's trips, newest first
pub async fn list_trips_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Trip>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM trips WHERE user_id = $1 ORDER BY created_at DESC",
        TRIP_COLUMNS
    );
    let rows = sqlx::query_as::<_, TripRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.into_raw().into_trip()).collect())
}

pub async fn find_trip_for_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Trip>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM trips WHERE id = $1 AND user_id = $2",
        TRIP_COLUMNS
    );
    let row = sqlx::query_as::<_, TripRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.into_raw().into_trip()))
}

pub async fn find_trip_by_idem_key(pool: &PgPool, idem_key: &str) -> Result<Option<Trip>, sqlx::Error> {
    let sql = format!("SELECT {} FROM trips WHERE idem_key = $1", TRIP_COLUMNS);
    let row = sqlx::query_as::<_, TripRow>(&sql)
        .bind(idem_key)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.into_raw().into_trip()))
}

/// Insert a trip. Returns `None` when another row already holds the same
/// idempotency key.
pub async fn insert_trip(
    pool: &PgPool,
    id: Uuid,
    trip: &NewTrip,
    now: OffsetDateTime,
) -> Result<Option<Trip>, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO trips (
            id, user_id, title, notes, mode, summary, destination, image,
            total_distance_km, days, map_points, place_descriptions, route, idem_key,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
        ON CONFLICT (idem_key) DO NOTHING
        RETURNING {}
        "#,
        TRIP_COLUMNS
    );

    let row = sqlx::query_as::<_, TripRow>(&sql)
        .bind(id)
        .bind(trip.user_id)
        .bind(&trip.title)
        .bind(&trip.notes)
        .bind(trip.mode.to_string())
        .bind(&trip.summary)
        .bind(Json(&trip.destination))
        .bind(trip.image.as_ref().map(Json))
        .bind(trip.total_distance_km)
        .bind(Json(&trip.days))
        .bind(Json(&trip.map_points))
        .bind(Json(&trip.place_descriptions))
        .bind(trip.route.as_ref().map(Json))
        .bind(trip.idem_key.as_deref())
        .bind(now)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.into_raw().into_trip()))
}

/// Overwrite the editable fields of a trip owned by `trip.user_id`
pub async fn update_trip(
    pool: &PgPool,
    trip: &Trip,
    now: OffsetDateTime,
) -> Result<Option<Trip>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE trips SET
            title = $3,
            notes = $4,
            mode = $5,
            summary = $6,
            destination = $7,
            image = $8,
            total_distance_km = $9,
            days = $10,
            map_points = $11,
            place_descriptions = $12,
            route = $13,
            updated_at = $14
        WHERE id = $1 AND user_id = $2
        RETURNING {}
        "#,
        TRIP_COLUMNS
    );

    let row = sqlx::query_as::<_, TripRow>(&sql)
        .bind(trip.id)
        .bind(trip.user_id)
        .bind(&trip.title)
        .bind(&trip.notes)
        .bind(trip.mode.to_string())
        .bind(&trip.summary)
        .bind(Json(&trip.destination))
        .bind(trip.image.as_ref().map(Json))
        .bind(trip.total_distance_km)
        .bind(Json(&trip.days))
        .bind(Json(&trip.map_points))
        .bind(Json(&trip.place_descriptions))
        .bind(trip.route.as_ref().map(Json))
        .bind(now)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.into_raw().into_trip()))
}

pub async fn delete_trip(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM trips WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// Internal row type for trip queries
#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    notes: String,
    mode: String,
    summary: String,
    destination: Json<Destination>,
    image: Option<Json<TripImage>>,
    total_distance_km: Option<f64>,
    days: Json<Vec<Day>>,
    map_points: Json<Vec<MapPoint>>,
    place_descriptions: Json<Vec<PlaceDescription>>,
    route: Option<Json<RouteSummary>>,
    idem_key: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TripRow {
    fn into_raw(self) -> RawTripRow {
        RawTripRow {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            notes: self.notes,
            mode: self.mode,
            summary: self.summary,
            destination: self.destination.0,
            image: self.image.map(|j| j.0),
            total_distance_km: self.total_distance_km,
            days: self.days.0,
            map_points: self.map_points.0,
            place_descriptions: self.place_descriptions.0,
            route: self.route.map(|j| j.0),
            idem_key: self.idem_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
