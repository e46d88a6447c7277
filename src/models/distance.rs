use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive range of plausible daily distances in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    pub min_km: f64,
    pub max_km: f64,
}

impl DistanceBand {
    pub fn new(min_km: f64, max_km: f64) -> Result<Self, String> {
        if !min_km.is_finite() || !max_km.is_finite() {
            return Err("Distance band bounds must be finite".to_string());
        }
        if min_km < 0.0 || min_km > max_km {
            return Err(format!(
                "Invalid distance band: {} - {} km",
                min_km, max_km
            ));
        }
        Ok(DistanceBand { min_km, max_km })
    }

    /// Band of `target ± fraction`, with both bounds rounded to whole kilometers.
    pub fn around(target_km: f64, fraction: f64) -> Self {
        DistanceBand {
            min_km: (target_km * (1.0 - fraction)).round(),
            max_km: (target_km * (1.0 + fraction)).round(),
        }
    }

    pub fn contains(&self, km: f64) -> bool {
        km.is_finite() && km >= self.min_km && km <= self.max_km
    }

    /// Raise values below the band to its minimum and lower values above it to
    /// its maximum. Non-finite input lands on the maximum.
    pub fn clamp(&self, km: f64) -> f64 {
        if km.is_nan() {
            return self.max_km;
        }
        km.clamp(self.min_km, self.max_km)
    }
}

impl fmt::Display for DistanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}-{:.0}km", self.min_km, self.max_km)
    }
}

/// Round a distance to one decimal place.
pub fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_creation() {
        assert!(DistanceBand::new(5.0, 15.0).is_ok());
        assert!(DistanceBand::new(15.0, 5.0).is_err());
        assert!(DistanceBand::new(-1.0, 5.0).is_err());
        assert!(DistanceBand::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_band_around_nominal() {
        let band = DistanceBand::around(60.0, 0.25);
        assert_eq!(band.min_km, 45.0);
        assert_eq!(band.max_km, 75.0);
    }

    #[test]
    fn test_clamp() {
        let band = DistanceBand::new(5.0, 15.0).unwrap();
        assert_eq!(band.clamp(2.0), 5.0);
        assert_eq!(band.clamp(9.3), 9.3);
        assert_eq!(band.clamp(40.0), 15.0);
        assert_eq!(band.clamp(f64::INFINITY), 15.0);
        assert_eq!(band.clamp(f64::NAN), 15.0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let band = DistanceBand::new(45.0, 75.0).unwrap();
        assert!(band.contains(45.0));
        assert!(band.contains(75.0));
        assert!(!band.contains(75.1));
        assert!(!band.contains(f64::NAN));
    }

    #[test]
    fn test_round_km() {
        assert_eq!(round_km(12.345), 12.3);
        assert_eq!(round_km(12.35), 12.4);
        assert_eq!(round_km(0.04), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(DistanceBand::new(5.0, 15.0).unwrap().to_string(), "5-15km");
    }
}
