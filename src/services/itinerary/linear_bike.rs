use super::points::name_key;
use crate::models::{Day, TransportMode};

/// Keep a bike trip point-to-point.
///
/// When the final day ends where the first day started, the final end is
/// replaced by the first alternative found among: day 1 waypoints scanned
/// from the back, the day 1 overnight city, any other known point name.
/// An overnight city equal to the start becomes day 1's first other
/// waypoint. Returns true when anything changed. With no alternative the
/// loop is left as is.
pub fn correct_linear_bike<'a>(
    mode: TransportMode,
    days: &mut [Day],
    point_names: impl IntoIterator<Item = &'a str>,
) -> bool {
    if mode != TransportMode::Bike || days.is_empty() {
        return false;
    }

    let start = name_key(&days[0].start);
    if start.is_empty() {
        return false;
    }
    let differs = |name: &&str| {
        let key = name_key(name);
        !key.is_empty() && key != start
    };
    let mut changed = false;

    let last = days.len() - 1;
    if name_key(&days[last].end) == start {
        let first = &days[0];
        let alternative = first
            .waypoints
            .iter()
            .rev()
            .map(String::as_str)
            .find(differs)
            .or_else(|| {
                first
                    .overnight
                    .as_ref()
                    .map(|o| o.city.trim())
                    .filter(|city| !city.is_empty())
            })
            .map(str::to_string)
            .or_else(|| {
                point_names
                    .into_iter()
                    .find(differs)
                    .map(|n| n.trim().to_string())
            });

        match alternative {
            Some(end) => {
                tracing::info!(
                    "Bike plan loops back to '{}'; final end moved to '{}'",
                    days[last].end,
                    end
                );
                days[last].end = end;
                changed = true;
            }
            None => {
                tracing::warn!(
                    "Bike plan loops back to '{}' and no alternative endpoint exists",
                    days[0].start
                );
            }
        }
    }

    let first_waypoint = days[0]
        .waypoints
        .iter()
        .map(String::as_str)
        .find(differs)
        .map(str::to_string);
    if let Some(overnight) = days[0].overnight.as_mut() {
        if name_key(&overnight.city) == start {
            if let Some(waypoint) = first_waypoint {
                overnight.city = waypoint;
                changed = true;
            }
        }
    }

    changed
}
