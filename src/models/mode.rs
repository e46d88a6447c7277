use crate::constants::*;
use crate::models::DistanceBand;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Walk,
    Bike,
}

impl TransportMode {
    /// OSRM profiles to try for this mode, most specific first
    pub fn osrm_profiles(&self) -> &'static [&'static str] {
        match self {
            TransportMode::Walk => &["walking", "foot"],
            TransportMode::Bike => &["cycling", "bike"],
        }
    }

    /// Exact number of days a plan in this mode has
    pub fn day_count(&self) -> usize {
        match self {
            TransportMode::Walk => WALK_DAYS,
            TransportMode::Bike => BIKE_DAYS,
        }
    }

    /// Plausible distance for one day. Shared by the day-bound clamp and the
    /// extension search.
    pub fn daily_band(&self) -> DistanceBand {
        match self {
            TransportMode::Walk => DistanceBand {
                min_km: WALK_MIN_KM,
                max_km: WALK_MAX_KM,
            },
            TransportMode::Bike => {
                DistanceBand::around(BIKE_TARGET_DAILY_KM, BIKE_DAILY_BAND_FRACTION)
            }
        }
    }

    /// Points further than this from the destination center are discarded
    pub fn max_radius_km(&self) -> f64 {
        match self {
            TransportMode::Walk => MAX_RADIUS_KM_WALK,
            TransportMode::Bike => MAX_RADIUS_KM_BIKE,
        }
    }

    /// Walks return to their start; bike trips are point-to-point
    pub fn is_round_trip(&self) -> bool {
        matches!(self, TransportMode::Walk)
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Walk => write!(f, "walk"),
            TransportMode::Bike => write!(f, "bike"),
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "walk" => Ok(TransportMode::Walk),
            "bike" => Ok(TransportMode::Bike),
            _ => Err(format!("Invalid mode: '{}' (expected 'walk' or 'bike')", s)),
        }
    }
}
