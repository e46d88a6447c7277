use super::points::PointTable;
use crate::config::PlannerConfig;
use crate::constants::BIAS_REJECT_FACTOR;
use crate::models::{distance_km, Coordinates, Day, Destination};
use crate::services::geocoder::{GeoBias, GeocodeRequest, Geocoder};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Scheduling policy applied before every geocoder call.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Keeps consecutive calls at least `interval` apart.
pub struct MinIntervalPacer {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl MinIntervalPacer {
    pub fn new(interval: Duration) -> Self {
        MinIntervalPacer {
            interval,
            last_call: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Pacer for MinIntervalPacer {
    async fn pause(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

/// No pacing at all
pub struct NoPause;

#[async_trait]
impl Pacer for NoPause {
    async fn pause(&self) {}
}

/// One attempt in the geocoding fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupStrategy {
    pub languages: String,
    /// Restrict to the destination area and add the destination as context
    pub biased: bool,
}

/// Where a planning pass is anchored: the destination center (if known) and
/// the "name, city, country" context used for biased lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoAnchor {
    pub center: Option<Coordinates>,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Found {
        coordinates: Coordinates,
        /// Index of the strategy that produced the match
        strategy: usize,
    },
    Exhausted,
}

pub struct PlaceResolver {
    geocoder: Arc<dyn Geocoder>,
    pacer: Arc<dyn Pacer>,
    strategies: Vec<LookupStrategy>,
    bias_km: f64,
    destination_languages: String,
}

impl PlaceResolver {
    /// Fallback order: primary biased, secondary biased, primary unbiased,
    /// secondary unbiased.
    pub fn new(geocoder: Arc<dyn Geocoder>, config: &PlannerConfig) -> Self {
        let strategy = |languages: &str, biased| LookupStrategy {
            languages: languages.to_string(),
            biased,
        };
        PlaceResolver {
            geocoder,
            pacer: Arc::new(MinIntervalPacer::new(config.geocode_interval())),
            strategies: vec![
                strategy(&config.primary_languages, true),
                strategy(&config.secondary_languages, true),
                strategy(&config.primary_languages, false),
                strategy(&config.secondary_languages, false),
            ],
            bias_km: config.geocode_bias_km,
            destination_languages: config.primary_languages.clone(),
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn strategies(&self) -> &[LookupStrategy] {
        &self.strategies
    }

    /// Fill in destination coordinates when missing and return the anchor
    /// for the pass. A failed lookup leaves the destination without a center.
    pub async fn locate_destination(&self, destination: &mut Destination) -> GeoAnchor {
        let context = destination.search_context();

        if let Some(center) = destination.coordinates() {
            return GeoAnchor {
                center: Some(center),
                context,
            };
        }

        let request = GeocodeRequest {
            place: if context.is_empty() {
                destination.name.clone()
            } else {
                context.clone()
            },
            context: None,
            languages: self.destination_languages.clone(),
            bias: None,
        };

        self.pacer.pause().await;
        let center = match self.geocoder.geocode(&request).await {
            Ok(Some(center)) => {
                destination.set_coordinates(center);
                tracing::info!(
                    "Destination '{}' located at {:.4},{:.4}",
                    destination.name,
                    center.lat,
                    center.lon
                );
                Some(center)
            }
            Ok(None) => {
                tracing::warn!("Destination '{}' could not be geocoded", destination.name);
                None
            }
            Err(e) => {
                tracing::warn!("Destination geocoding failed for '{}': {}", destination.name, e);
                None
            }
        };

        GeoAnchor { center, context }
    }

    /// Run the fallback chain for one name. Biased strategies qualify the
    /// name with the destination context; without a center they still run,
    /// unbounded.
    pub async fn resolve_name(&self, name: &str, anchor: &GeoAnchor) -> Resolution {
        for (index, strategy) in self.strategies.iter().enumerate() {
            let bias = match (strategy.biased, anchor.center) {
                (true, Some(center)) => Some(GeoBias {
                    center,
                    radius_km: self.bias_km,
                }),
                _ => None,
            };
            let context = (strategy.biased && !anchor.context.is_empty())
                .then(|| anchor.context.clone());
            let request = GeocodeRequest {
                place: name.to_string(),
                context,
                languages: strategy.languages.clone(),
                bias,
            };

            self.pacer.pause().await;
            let candidate = match self.geocoder.geocode(&request).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Geocode attempt {} for '{}' failed: {}", index + 1, name, e);
                    continue;
                }
            };

            if let Some(bias) = &bias {
                let distance = distance_km(Some(&candidate), Some(&bias.center));
                if !distance.is_finite() || distance > bias.radius_km * BIAS_REJECT_FACTOR {
                    tracing::debug!(
                        "Rejected '{}' match {:.1}km from the destination",
                        name,
                        distance
                    );
                    continue;
                }
            }

            return Resolution::Found {
                coordinates: candidate,
                strategy: index,
            };
        }

        Resolution::Exhausted
    }

    /// Ensure every stop named by `days` has an entry in `points`, looking up
    /// names that are neither resolved nor already attempted this pass.
    /// Returns the number of names newly resolved.
    pub async fn resolve_days(&self, days: &[Day], points: &mut PointTable, anchor: &GeoAnchor) -> usize {
        points.register_days(days);

        let pending: Vec<String> = points
            .names()
            .filter(|name| points.needs_lookup(name))
            .map(str::to_string)
            .collect();
        let mut resolved = 0;

        for name in pending {
            match self.resolve_name(&name, anchor).await {
                Resolution::Found { coordinates, strategy } => {
                    tracing::debug!(
                        "Resolved '{}' to {:.4},{:.4} (attempt {})",
                        name,
                        coordinates.lat,
                        coordinates.lon,
                        strategy + 1
                    );
                    points.set_coordinates(&name, Some(coordinates));
                    resolved += 1;
                }
                Resolution::Exhausted => {
                    tracing::warn!("No coordinates found for '{}'", name);
                    points.set_coordinates(&name, None);
                }
            }
            points.mark_attempted(&name);
        }

        resolved
    }
}
