use super::trip_repository::TripRepository;
use crate::error::Result;
use crate::models::{NewTrip, Trip};
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local trip store used when no database is configured.
#[derive(Default)]
pub struct InMemoryTripRepository {
    // Insertion order
    trips: RwLock<Vec<Trip>>,
}

impl InMemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.trips.read().await.len()
    }
}

#[async_trait]
impl TripRepository for InMemoryTripRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trip>> {
        let trips = self.trips.read().await;
        let mut owned: Vec<Trip> = trips
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        // Stable: equal timestamps keep newest-inserted first
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Trip>> {
        let trips = self.trips.read().await;
        Ok(trips
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn find_by_idem_key(&self, idem_key: &str) -> Result<Option<Trip>> {
        let trips = self.trips.read().await;
        Ok(trips
            .iter()
            .find(|t| t.idem_key.as_deref() == Some(idem_key))
            .cloned())
    }

    async fn insert(&self, trip: NewTrip) -> Result<(Trip, bool)> {
        // Check and insert under one write lock
        let mut trips = self.trips.write().await;
        if let Some(key) = trip.idem_key.as_deref() {
            if let Some(existing) = trips.iter().find(|t| t.idem_key.as_deref() == Some(key)) {
                return Ok((existing.clone(), false));
            }
        }

        let created = trip.into_trip(Uuid::new_v4(), OffsetDateTime::now_utc());
        trips.push(created.clone());
        Ok((created, true))
    }

    async fn update(&self, trip: &Trip) -> Result<Option<Trip>> {
        let mut trips = self.trips.write().await;
        let Some(stored) = trips
            .iter_mut()
            .find(|t| t.id == trip.id && t.user_id == trip.user_id)
        else {
            return Ok(None);
        };

        let created_at = stored.created_at;
        let idem_key = stored.idem_key.clone();
        *stored = Trip {
            created_at,
            idem_key,
            updated_at: OffsetDateTime::now_utc(),
            ..trip.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut trips = self.trips.write().await;
        let before = trips.len();
        trips.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(trips.len() < before)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
