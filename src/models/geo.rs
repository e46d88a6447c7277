use crate::constants::KM_PER_DEGREE;
use crate::models::Coordinates;

/// Axis-aligned bounding box in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Square box (in degrees) around a center whose half-width is
    /// `radius_km / 111`, bounded to `[min_deg, max_deg]`.
    pub fn around(center: &Coordinates, radius_km: f64, min_deg: f64, max_deg: f64) -> Self {
        let delta = (radius_km / KM_PER_DEGREE).clamp(min_deg, max_deg);

        BoundingBox {
            min_lat: center.lat - delta,
            max_lat: center.lat + delta,
            min_lon: center.lon - delta,
            max_lon: center.lon + delta,
        }
    }

    /// Nominatim `viewbox` parameter: `left,top,right,bottom`.
    pub fn to_viewbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.max_lat, self.max_lon, self.min_lat
        )
    }
}
