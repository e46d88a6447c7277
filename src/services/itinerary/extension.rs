use super::points::{name_key, PointTable};
use crate::constants::*;
use crate::models::{round_km, Coordinates, Day, DistanceBand, TransportMode};
use crate::services::geocoder::{Geocoder, NamedPlace, NearbySearch};
use crate::services::osrm::RoutingOracle;

/// Searches real places near the destination that bring an out-of-band day
/// back into its distance band, validated with routed distances.
pub struct DayExtender<'a> {
    geocoder: &'a dyn Geocoder,
    router: &'a dyn RoutingOracle,
    languages: &'a str,
}

impl<'a> DayExtender<'a> {
    pub fn new(geocoder: &'a dyn Geocoder, router: &'a dyn RoutingOracle, languages: &'a str) -> Self {
        DayExtender {
            geocoder,
            router,
            languages,
        }
    }

    /// Try to extend every day whose distance is outside the band. Walk days
    /// get a new waypoint; for bike only the final day gets a new end so the
    /// chain between days stays intact. Returns the number of days changed.
    pub async fn extend_days(
        &self,
        mode: TransportMode,
        days: &mut [Day],
        points: &mut PointTable,
        center: &Coordinates,
    ) -> usize {
        let band = mode.daily_band();
        let trip_start = days.first().map(|d| d.start.clone()).unwrap_or_default();
        let last = days.len().saturating_sub(1);
        let mut extended = 0;

        for (index, day) in days.iter_mut().enumerate() {
            if day.distance_km.is_some_and(|km| band.contains(km)) {
                continue;
            }
            let changed = match mode {
                TransportMode::Walk => self.extend_walk_day(day, points, center, band).await,
                TransportMode::Bike if index == last => {
                    self.extend_bike_day(day, points, center, band, &trip_start).await
                }
                TransportMode::Bike => false,
            };
            if changed {
                extended += 1;
            }
        }

        extended
    }

    /// Candidates from each query in order, limited to the mode's radius
    async fn candidates(
        &self,
        center: &Coordinates,
        queries: &[&str],
        limit: usize,
        radius_km: f64,
        max_distance_km: f64,
    ) -> Vec<NamedPlace> {
        let mut found = Vec::new();

        for query in queries {
            let search = NearbySearch {
                center: *center,
                query: query.to_string(),
                limit,
                radius_km,
                languages: self.languages.to_string(),
            };
            match self.geocoder.search_nearby(&search).await {
                Ok(places) => found.extend(
                    places
                        .into_iter()
                        .filter(|p| p.coordinates.distance_to(center) <= max_distance_km),
                ),
                Err(e) => tracing::warn!("Nearby search '{}' failed: {}", query, e),
            }
        }

        found
    }

    /// Turn the walk into start → candidate → start
    async fn extend_walk_day(
        &self,
        day: &mut Day,
        points: &mut PointTable,
        center: &Coordinates,
        band: DistanceBand,
    ) -> bool {
        let Some(start) = points.coordinates(&day.start) else {
            return false;
        };
        let candidates = self
            .candidates(
                center,
                WALK_EXTENSION_QUERIES,
                WALK_EXTENSION_LIMIT,
                WALK_EXTENSION_RADIUS_KM,
                TransportMode::Walk.max_radius_km(),
            )
            .await;

        for candidate in candidates {
            if relocates_known_point(points, &candidate) {
                continue;
            }
            let path = [start, candidate.coordinates, start];
            let Some(km) = self.routed_km(TransportMode::Walk, &path, true).await else {
                continue;
            };
            if band.contains(km) {
                tracing::info!(
                    "Walk day {} extended via '{}' to {:.1}km",
                    day.day,
                    candidate.name,
                    km
                );
                points.set_coordinates(&candidate.name, Some(candidate.coordinates));
                day.waypoints = vec![candidate.name];
                day.distance_km = Some(round_km(km));
                return true;
            }
        }

        tracing::debug!("No walk extension found for day {}", day.day);
        false
    }

    /// Move the day's end to a nearby town. The trip start is never chosen
    /// so the trip stays linear.
    async fn extend_bike_day(
        &self,
        day: &mut Day,
        points: &mut PointTable,
        center: &Coordinates,
        band: DistanceBand,
        trip_start: &str,
    ) -> bool {
        let Some(start) = points.coordinates(&day.start) else {
            return false;
        };
        let mut path = vec![start];
        path.extend(points.sequence(day.waypoints.iter().map(String::as_str)));

        let candidates = self
            .candidates(
                center,
                &[BIKE_EXTENSION_QUERY],
                BIKE_EXTENSION_LIMIT,
                BIKE_EXTENSION_RADIUS_KM,
                TransportMode::Bike.max_radius_km(),
            )
            .await;
        let excluded = [name_key(trip_start), name_key(&day.start)];

        for candidate in candidates {
            if excluded.contains(&name_key(&candidate.name))
                || relocates_known_point(points, &candidate)
            {
                continue;
            }
            path.push(candidate.coordinates);
            let routed = self.routed_km(TransportMode::Bike, &path, false).await;
            path.pop();

            let Some(km) = routed else {
                continue;
            };
            if band.contains(km) {
                tracing::info!(
                    "Bike day {} now ends in '{}' at {:.1}km",
                    day.day,
                    candidate.name,
                    km
                );
                points.set_coordinates(&candidate.name, Some(candidate.coordinates));
                day.end = candidate.name;
                day.distance_km = Some(round_km(km));
                return true;
            }
        }

        tracing::debug!("No bike extension found for day {}", day.day);
        false
    }

    async fn routed_km(&self, mode: TransportMode, path: &[Coordinates], round_trip: bool) -> Option<f64> {
        match self.router.route(mode, path, round_trip).await {
            Ok(leg) => leg.distance_km,
            Err(e) => {
                tracing::debug!("Extension candidate not routable: {}", e);
                None
            }
        }
    }
}

/// True when the candidate shares a name with a known point placed elsewhere
fn relocates_known_point(points: &PointTable, candidate: &NamedPlace) -> bool {
    points
        .get(&candidate.name)
        .is_some_and(|known| known.coordinates() != Some(candidate.coordinates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MapPoint;
    use crate::test_support::{StubGeocoder, StubRouter};

    fn c(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    fn day(number: u32, start: &str, waypoints: &[&str], end: &str, km: f64) -> Day {
        Day {
            day: number,
            distance_km: Some(km),
            start: start.to_string(),
            end: end.to_string(),
            waypoints: waypoints.iter().map(|w| w.to_string()).collect(),
            overnight: None,
            highlights: vec![],
        }
    }

    fn place(name: &str, coords: Coordinates) -> NamedPlace {
        NamedPlace {
            name: name.to_string(),
            coordinates: coords,
        }
    }

    #[tokio::test]
    async fn test_walk_extension_takes_first_candidate_in_band() {
        let center = c(48.8566, 2.3522);
        // Out-and-back legs: ~1.1km, ~6.7km and ~8.9km each way
        let geocoder = StubGeocoder::new()
            .with_nearby("promenade", vec![place("Quai", c(48.8666, 2.3522))])
            .with_nearby("park", vec![place("Bois de Vincennes", c(48.8266, 2.4322))])
            .with_nearby("trail", vec![place("Far Trail", c(48.9366, 2.3522))]);
        let router = StubRouter::straight_line(1.0);
        let mut points = PointTable::from_points(vec![MapPoint::resolved("Hotel de Ville", center)]);
        let mut days = vec![day(1, "Hotel de Ville", &[], "Hotel de Ville", 2.0)];

        let extender = DayExtender::new(&geocoder, &router, "he,en");
        assert_eq!(
            extender
                .extend_days(TransportMode::Walk, &mut days, &mut points, &center)
                .await,
            1
        );
        assert_eq!(days[0].waypoints, vec!["Bois de Vincennes"]);
        let km = days[0].distance_km.unwrap();
        assert!((5.0..=15.0).contains(&km), "got {}", km);
        assert!(points.coordinates("Bois de Vincennes").is_some());

        let searches = geocoder.nearby_calls();
        assert_eq!(searches.len(), 3);
        assert_eq!(searches[0].query, "promenade");
        assert_eq!(searches[0].limit, 3);
        assert_eq!(searches[0].radius_km, 12.0);
    }

    #[tokio::test]
    async fn test_in_band_days_are_left_alone() {
        let center = c(48.8566, 2.3522);
        let geocoder = StubGeocoder::new();
        let router = StubRouter::straight_line(1.0);
        let mut points = PointTable::from_points(vec![MapPoint::resolved("A", center)]);
        let mut days = vec![day(1, "A", &[], "A", 9.0)];

        let extender = DayExtender::new(&geocoder, &router, "en");
        assert_eq!(
            extender
                .extend_days(TransportMode::Walk, &mut days, &mut points, &center)
                .await,
            0
        );
        assert!(geocoder.nearby_calls().is_empty());
    }

    #[tokio::test]
    async fn test_bike_extension_only_moves_final_end() {
        let lisbon = c(38.7223, -9.1393);
        let sintra = c(38.8029, -9.3817);
        let geocoder = StubGeocoder::new().with_nearby(
            "town",
            vec![
                place("Lisbon", lisbon),
                place("Mafra", c(38.9369, -9.3276)),
                place("Ericeira", c(38.9631, -9.4155)),
            ],
        );
        // Sintra→Mafra is ~15.6km straight, ~46.8km routed at this factor
        let router = StubRouter::straight_line(3.0);
        let mut points = PointTable::from_points(vec![
            MapPoint::resolved("Lisbon", lisbon),
            MapPoint::resolved("Sintra", sintra),
        ]);
        let mut days = vec![
            day(1, "Lisbon", &[], "Sintra", 30.0),
            day(2, "Sintra", &[], "Cascais", 20.0),
        ];

        let extender = DayExtender::new(&geocoder, &router, "he,en");
        let changed = extender
            .extend_days(TransportMode::Bike, &mut days, &mut points, &lisbon)
            .await;

        assert_eq!(changed, 1);
        assert_eq!(days[0].end, "Sintra", "chained day untouched");
        assert_eq!(days[0].distance_km, Some(30.0));
        assert_eq!(days[1].end, "Mafra");
        let km = days[1].distance_km.unwrap();
        assert!((45.0..=75.0).contains(&km), "got {}", km);
        assert!(router.calls().iter().all(|call| !call.round_trip));
    }

    #[tokio::test]
    async fn test_no_candidate_leaves_day_unchanged() {
        let center = c(48.8566, 2.3522);
        let geocoder = StubGeocoder::new()
            .with_nearby("park", vec![place("Tiny Square", c(48.8570, 2.3525))]);
        let router = StubRouter::failing();
        let mut points = PointTable::from_points(vec![MapPoint::resolved("A", center)]);
        let mut days = vec![day(1, "A", &["B"], "A", 2.0)];

        let extender = DayExtender::new(&geocoder, &router, "en");
        extender
            .extend_days(TransportMode::Walk, &mut days, &mut points, &center)
            .await;
        assert_eq!(days[0].waypoints, vec!["B"]);
        assert_eq!(days[0].distance_km, Some(2.0));
    }

    #[tokio::test]
    async fn test_bike_candidate_cannot_move_known_waypoint() {
        let lisbon = c(38.7223, -9.1393);
        let sintra = c(38.8029, -9.3817);
        let cascais = c(38.6979, -9.4215);
        let geocoder = StubGeocoder::new().with_nearby(
            "town",
            vec![
                place("cascais", c(39.25, -9.2)),
                place("Peniche", c(39.3558, -9.3811)),
            ],
        );
        // Both candidates land in band from Sintra (~52km and ~61km)
        let router = StubRouter::straight_line(1.0);
        let mut points = PointTable::from_points(vec![
            MapPoint::resolved("Lisbon", lisbon),
            MapPoint::resolved("Cascais", cascais),
            MapPoint::resolved("Sintra", sintra),
        ]);
        let mut days = vec![
            day(1, "Lisbon", &["Cascais"], "Sintra", 50.0),
            day(2, "Sintra", &[], "Colares", 20.0),
        ];

        let extender = DayExtender::new(&geocoder, &router, "he,en");
        let changed = extender
            .extend_days(TransportMode::Bike, &mut days, &mut points, &lisbon)
            .await;

        assert_eq!(changed, 1);
        assert_eq!(days[1].end, "Peniche");
        assert_eq!(days[0].waypoints, vec!["Cascais"]);
        assert_eq!(points.coordinates("Cascais"), Some(cascais));
    }

    #[tokio::test]
    async fn test_walk_candidate_cannot_move_known_point() {
        let center = c(48.8566, 2.3522);
        let louvre = c(48.8606, 2.3376);
        let geocoder = StubGeocoder::new()
            .with_nearby("park", vec![place("louvre", c(48.8266, 2.4322))]);
        let router = StubRouter::straight_line(1.0);
        let mut points = PointTable::from_points(vec![
            MapPoint::resolved("Hotel de Ville", center),
            MapPoint::resolved("Louvre", louvre),
        ]);
        let mut days = vec![day(1, "Hotel de Ville", &["Louvre"], "Hotel de Ville", 2.0)];

        let extender = DayExtender::new(&geocoder, &router, "en");
        let changed = extender
            .extend_days(TransportMode::Walk, &mut days, &mut points, &center)
            .await;

        assert_eq!(changed, 0);
        assert_eq!(days[0].waypoints, vec!["Louvre"]);
        assert_eq!(points.coordinates("Louvre"), Some(louvre));
        assert!(router.calls().is_empty());
    }
}
