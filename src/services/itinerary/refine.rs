use super::points::PointTable;
use crate::models::{round_km, Day, RouteSummary, TransportMode};
use crate::services::osrm::RoutingOracle;

/// Replace day distances with routed network distances where the router
/// answers. A day keeps its prior value when it has fewer than two resolved
/// stops or the router fails. Returns the number of days updated.
pub async fn refine_day_distances(
    router: &dyn RoutingOracle,
    mode: TransportMode,
    days: &mut [Day],
    points: &PointTable,
) -> usize {
    let mut refined = 0;

    for day in days.iter_mut() {
        let path = points.sequence(day.stop_names());
        if path.len() < 2 {
            continue;
        }

        match router.route(mode, &path, mode.is_round_trip()).await {
            Ok(leg) => match leg.distance_km {
                Some(km) => {
                    day.distance_km = Some(round_km(km));
                    refined += 1;
                }
                None => tracing::warn!("Day {} route came back without a distance", day.day),
            },
            Err(e) => {
                tracing::warn!(
                    "Routing day {} failed, keeping {:?}km: {}",
                    day.day,
                    day.distance_km,
                    e
                );
            }
        }
    }

    refined
}

/// Sum of day distances rounded to one decimal
pub fn total_distance_km(days: &[Day]) -> f64 {
    round_km(
        days.iter()
            .filter_map(|d| d.distance_km)
            .filter(|km| km.is_finite())
            .sum(),
    )
}

/// Whole-trip geometry through every resolved point, closed for walks.
/// Any failure yields `None`.
pub async fn overall_route(
    router: &dyn RoutingOracle,
    mode: TransportMode,
    points: &PointTable,
) -> Option<RouteSummary> {
    let path = points.resolved();
    if path.len() < 2 {
        tracing::debug!("Only {} resolved points, no overall route", path.len());
        return None;
    }

    match router.route(mode, &path, mode.is_round_trip()).await {
        Ok(leg) => Some(leg.into_summary()),
        Err(e) => {
            tracing::warn!("Overall route failed: {}", e);
            None
        }
    }
}
