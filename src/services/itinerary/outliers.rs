use super::points::PointTable;
use crate::models::{distance_km, Coordinates, TransportMode};

/// Null out points further than the mode's radius from `center`.
///
/// Points without coordinates pass through, and nothing changes when the
/// center is unknown. Returns the number of points cleared.
pub fn clamp_outliers(
    points: &mut PointTable,
    center: Option<&Coordinates>,
    mode: TransportMode,
) -> usize {
    let Some(center) = center else {
        return 0;
    };
    let max_km = mode.max_radius_km();
    let mut cleared = 0;

    for point in points.points_mut() {
        let Some(coords) = point.coordinates() else {
            continue;
        };
        let distance = distance_km(Some(&coords), Some(center));
        if !distance.is_finite() || distance > max_km {
            tracing::debug!(
                name = %point.name,
                distance_km = distance,
                "Clearing outlier '{}' at {:.1}km (limit {}km)",
                point.name,
                distance,
                max_km
            );
            point.lat = None;
            point.lon = None;
            cleared += 1;
        }
    }

    if cleared > 0 {
        tracing::info!("Cleared {} outlier points for {} plan", cleared, mode);
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MapPoint;

    fn c(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    fn paris_table() -> PointTable {
        PointTable::from_points(vec![
            MapPoint::resolved("Louvre", c(48.8606, 2.3376)),
            MapPoint::resolved("Versailles", c(48.8049, 2.1204)), // ~17km
            MapPoint::resolved("Lyon", c(45.764, 4.8357)),
            MapPoint::unresolved("Unknown"),
        ])
    }

    #[test]
    fn test_walk_radius() {
        let center = c(48.8566, 2.3522);
        let mut table = paris_table();
        assert_eq!(clamp_outliers(&mut table, Some(&center), TransportMode::Walk), 2);

        assert!(table.coordinates("Louvre").is_some());
        assert!(table.coordinates("Versailles").is_none());
        assert!(table.get("Versailles").is_some(), "cleared points stay in the table");
        for point in table.points() {
            if let Some(coords) = point.coordinates() {
                assert!(coords.distance_to(&center) <= 12.0);
            }
        }
    }

    #[test]
    fn test_bike_radius_keeps_nearby_towns() {
        let center = c(48.8566, 2.3522);
        let mut table = paris_table();
        assert_eq!(clamp_outliers(&mut table, Some(&center), TransportMode::Bike), 1);
        assert!(table.coordinates("Versailles").is_some());
        assert!(table.coordinates("Lyon").is_none());
    }

    #[test]
    fn test_no_center_is_noop() {
        let mut table = paris_table();
        assert_eq!(clamp_outliers(&mut table, None, TransportMode::Walk), 0);
        assert_eq!(table.resolved().len(), 3);
    }
}
