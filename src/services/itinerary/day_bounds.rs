use super::points::PointTable;
use crate::models::{path_length_km, Day, TransportMode};

/// Replace each day's distance with the straight-line length of its resolved
/// stops, clamped into the mode's daily band.
///
/// Days with fewer than two resolved stops measure 0 km and land on the
/// band minimum.
pub fn enforce_day_bounds(days: &mut [Day], points: &PointTable, mode: TransportMode) {
    let band = mode.daily_band();

    for day in days.iter_mut() {
        let path = points.sequence(day.stop_names());
        let measured = path_length_km(&path);
        let clamped = band.clamp(measured);

        if clamped != measured {
            tracing::debug!(
                day = day.day,
                measured_km = measured,
                "Day {} straight-line {:.1}km clamped to {:.1}km ({})",
                day.day,
                measured,
                clamped,
                band
            );
        }
        day.distance_km = Some(clamped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, MapPoint};

    fn c(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    fn day(start: &str, waypoints: &[&str], end: &str, distance_km: Option<f64>) -> Day {
        Day {
            day: 1,
            distance_km,
            start: start.to_string(),
            end: end.to_string(),
            waypoints: waypoints.iter().map(|w| w.to_string()).collect(),
            overnight: None,
            highlights: vec![],
        }
    }

    #[test]
    fn test_short_walk_raised_to_minimum() {
        let points = PointTable::from_points(vec![
            MapPoint::resolved("A", c(48.8566, 2.3522)),
            MapPoint::resolved("B", c(48.8606, 2.3376)),
        ]);
        let mut days = vec![day("A", &["B"], "A", Some(42.0))];
        enforce_day_bounds(&mut days, &points, TransportMode::Walk);
        assert_eq!(days[0].distance_km, Some(5.0));
    }

    #[test]
    fn test_in_band_value_passes_through() {
        // ~11.1km per 0.1 degree of latitude
        let points = PointTable::from_points(vec![
            MapPoint::resolved("A", c(48.80, 2.35)),
            MapPoint::resolved("B", c(48.85, 2.35)),
        ]);
        let mut days = vec![day("A", &["B"], "A", None)];
        enforce_day_bounds(&mut days, &points, TransportMode::Walk);
        let km = days[0].distance_km.unwrap();
        assert!((km - 11.12).abs() < 0.05, "got {}", km);
    }

    #[test]
    fn test_long_bike_day_lowered_to_maximum() {
        let points = PointTable::from_points(vec![
            MapPoint::resolved("Lisbon", c(38.7223, -9.1393)),
            MapPoint::resolved("Evora", c(38.5714, -7.9135)),
        ]);
        let mut days = vec![day("Lisbon", &[], "Evora", None)];
        enforce_day_bounds(&mut days, &points, TransportMode::Bike);
        assert_eq!(days[0].distance_km, Some(75.0));
    }

    #[test]
    fn test_unresolved_day_gets_minimum() {
        let points = PointTable::new();
        let mut days = vec![day("X", &[], "Y", Some(60.0))];
        enforce_day_bounds(&mut days, &points, TransportMode::Bike);
        assert_eq!(days[0].distance_km, Some(45.0));
    }
}
