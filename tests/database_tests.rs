use serial_test::serial;
use tripplanner::db::{PgTripRepository, TripRepository};
use tripplanner::models::{Day, Destination, MapPoint, NewTrip, TransportMode};
use uuid::Uuid;

mod common;

fn new_trip(user_id: Uuid, title: &str, idem_key: Option<String>) -> NewTrip {
    NewTrip {
        user_id,
        idem_key,
        title: title.to_string(),
        notes: "Bring water".to_string(),
        mode: TransportMode::Bike,
        summary: "Two days on the coast".to_string(),
        destination: Destination::named("Lisbon"),
        image: None,
        total_distance_km: Some(120.0),
        days: vec![Day {
            day: 1,
            distance_km: Some(60.0),
            start: "Lisbon".to_string(),
            end: "Sintra".to_string(),
            waypoints: vec!["Belém".to_string()],
            overnight: None,
            highlights: vec![],
        }],
        map_points: vec![
            MapPoint::resolved("Lisbon", common::coords(38.7223, -9.1393)),
            MapPoint::unresolved("Sintra"),
        ],
        place_descriptions: vec![],
        route: None,
    }
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_insert_and_find_trip() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_db(&pool).await;
    let repo = PgTripRepository::new(pool);
    let user = Uuid::new_v4();

    let (trip, created) = repo.insert(new_trip(user, "Coast", None)).await.unwrap();
    assert!(created);
    assert_eq!(trip.mode, TransportMode::Bike);
    assert_eq!(trip.map_points[1], MapPoint::unresolved("Sintra"));

    let found = repo.find_for_user(trip.id, user).await.unwrap().unwrap();
    assert_eq!(found.days, trip.days);
    assert!(repo.find_for_user(trip.id, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_duplicate_idempotency_key_returns_existing() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_db(&pool).await;
    let repo = PgTripRepository::new(pool);
    let user = Uuid::new_v4();
    let key = format!("{}:retry", user);

    let (first, created) = repo
        .insert(new_trip(user, "First", Some(key.clone())))
        .await
        .unwrap();
    assert!(created);
    let (second, created) = repo
        .insert(new_trip(user, "Second", Some(key)))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.title, "First");
    assert_eq!(repo.list_for_user(user).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_update_and_delete_trip() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_db(&pool).await;
    let repo = PgTripRepository::new(pool);
    let user = Uuid::new_v4();

    let (mut trip, _) = repo.insert(new_trip(user, "Coast", None)).await.unwrap();
    trip.title = "Coast and hills".to_string();
    trip.total_distance_km = None;
    let updated = repo.update(&trip).await.unwrap().unwrap();
    assert_eq!(updated.title, "Coast and hills");
    assert_eq!(updated.total_distance_km, None);
    assert_eq!(updated.created_at, trip.created_at);

    assert!(!repo.delete(trip.id, Uuid::new_v4()).await.unwrap());
    assert!(repo.delete(trip.id, user).await.unwrap());
    assert!(repo.list_for_user(user).await.unwrap().is_empty());
}
