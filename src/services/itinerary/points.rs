use crate::models::{Coordinates, Day, MapPoint};
use std::collections::{HashMap, HashSet};

/// Lookup key for a place name: trimmed and lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Per-pass table of map points, unique by name (case-insensitive).
///
/// Insertion order is preserved and the first-seen casing of a name wins.
/// Names that went through every geocoding fallback without a result are
/// remembered as attempted so they are not looked up again in the same pass.
#[derive(Debug, Clone, Default)]
pub struct PointTable {
    points: Vec<MapPoint>,
    index: HashMap<String, usize>,
    attempted: HashSet<String>,
}

impl PointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from known points. A later duplicate only contributes
    /// coordinates when the first entry has none.
    pub fn from_points(points: impl IntoIterator<Item = MapPoint>) -> Self {
        let mut table = Self::new();
        for point in points {
            match point.coordinates() {
                Some(coords) => {
                    if table.coordinates(&point.name).is_none() {
                        table.set_coordinates(&point.name, Some(coords));
                    }
                }
                None => table.register(&point.name),
            }
        }
        table
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MapPoint> {
        self.index.get(&name_key(name)).map(|&i| &self.points[i])
    }

    pub fn coordinates(&self, name: &str) -> Option<Coordinates> {
        self.get(name).and_then(MapPoint::coordinates)
    }

    /// Add an unresolved entry unless the name is already known
    pub fn register(&mut self, name: &str) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return;
        }
        let key = name_key(trimmed);
        if !self.index.contains_key(&key) {
            self.index.insert(key, self.points.len());
            self.points.push(MapPoint::unresolved(trimmed));
        }
    }

    /// Register every stop of every day, in itinerary order
    pub fn register_days(&mut self, days: &[Day]) {
        for day in days {
            for name in day.stop_names() {
                self.register(name);
            }
        }
    }

    pub fn set_coordinates(&mut self, name: &str, coords: Option<Coordinates>) {
        self.register(name);
        if let Some(&i) = self.index.get(&name_key(name)) {
            let point = &mut self.points[i];
            point.lat = coords.map(|c| c.lat);
            point.lon = coords.map(|c| c.lon);
        }
    }

    pub fn mark_attempted(&mut self, name: &str) {
        self.attempted.insert(name_key(name));
    }

    pub fn is_attempted(&self, name: &str) -> bool {
        self.attempted.contains(&name_key(name))
    }

    /// True when the name has no coordinates and has not been tried yet
    pub fn needs_lookup(&self, name: &str) -> bool {
        self.coordinates(name).is_none() && !self.is_attempted(name)
    }

    /// Resolved coordinates for `names`, skipping unknown or unresolved ones
    pub fn sequence<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<Coordinates> {
        names
            .into_iter()
            .filter_map(|name| self.coordinates(name))
            .collect()
    }

    pub fn resolved(&self) -> Vec<Coordinates> {
        self.points.iter().filter_map(MapPoint::coordinates).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|p| p.name.as_str())
    }

    pub fn points(&self) -> &[MapPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> impl Iterator<Item = &mut MapPoint> {
        self.points.iter_mut()
    }

    pub fn into_points(self) -> Vec<MapPoint> {
        self.points
    }
}
