//! Stable application-wide constants.
//!
//! Values here are structural invariants of a trip (day counts, distance
//! policy, clamp radii) and default fallbacks for env-var-based configuration.
//! Tuning knobs that benefit from runtime experimentation live in
//! [`PlannerConfig`](crate::config::PlannerConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "5050";

// --- Oracle endpoint defaults ---

/// Default OSRM base URL. Overridden by `OSRM_URL`.
pub const DEFAULT_OSRM_URL: &str = "http://localhost:5001";
/// Default Nominatim base URL. Overridden by `NOMINATIM_URL`.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
/// Nominatim's usage policy requires an identifying user agent.
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "TripPlanner/1.1 (server geocode)";
/// Default Groq chat completions endpoint.
pub const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Default Groq model. Overridden by `GROQ_MODEL`.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

// --- Geo math ---

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Kilometers per degree of latitude, used for viewbox approximations.
pub const KM_PER_DEGREE: f64 = 111.0;

// --- Distance policy ---
// A walk is one loop day; a bike trip is two linear days around a nominal
// daily distance. The bike band is derived once from the nominal value and is
// shared by the day-bound clamp and the extension heuristic.

/// Days in a walk plan.
pub const WALK_DAYS: usize = 1;
/// Days in a bike plan.
pub const BIKE_DAYS: usize = 2;
/// Shortest plausible walking day.
pub const WALK_MIN_KM: f64 = 5.0;
/// Longest plausible walking day.
pub const WALK_MAX_KM: f64 = 15.0;
/// Nominal cycling distance per day.
pub const BIKE_TARGET_DAILY_KM: f64 = 60.0;
/// Relative width of the cycling band around the nominal distance (±25%).
pub const BIKE_DAILY_BAND_FRACTION: f64 = 0.25;

// --- Outlier clamp radii around the destination center ---

/// Walk points further than this from the destination are discarded.
pub const MAX_RADIUS_KM_WALK: f64 = 12.0;
/// Bike points further than this from the destination are discarded.
pub const MAX_RADIUS_KM_BIKE: f64 = 80.0;

// --- Viewbox half-width bounds (degrees) for Nominatim queries ---

/// Lower bound of the geocoding viewbox half-width.
pub const GEOCODE_VIEWBOX_MIN_DEG: f64 = 0.2;
/// Upper bound of the geocoding viewbox half-width.
pub const GEOCODE_VIEWBOX_MAX_DEG: f64 = 1.2;
/// Lower bound of the nearby-search viewbox half-width.
pub const NEARBY_VIEWBOX_MIN_DEG: f64 = 0.15;
/// Upper bound of the nearby-search viewbox half-width.
pub const NEARBY_VIEWBOX_MAX_DEG: f64 = 0.9;
/// A biased candidate further than this multiple of the bias radius is rejected.
pub const BIAS_REJECT_FACTOR: f64 = 2.0;

// --- Day extension search ---

/// Nearby search queries for walk extension, in priority order.
pub const WALK_EXTENSION_QUERIES: &[&str] = &["promenade", "park", "trail"];
/// Candidates requested per walk extension query.
pub const WALK_EXTENSION_LIMIT: usize = 3;
/// Search radius around the destination for walk extension candidates.
pub const WALK_EXTENSION_RADIUS_KM: f64 = 12.0;
/// Nearby search query for bike extension.
pub const BIKE_EXTENSION_QUERY: &str = "town";
/// Candidates requested for bike extension.
pub const BIKE_EXTENSION_LIMIT: usize = 8;
/// Search radius around the destination for bike extension candidates.
pub const BIKE_EXTENSION_RADIUS_KM: f64 = 90.0;

// --- Trip content limits ---

/// Maximum summary length accepted on create/update.
pub const SUMMARY_MAX_CHARS: usize = 200;
/// Maximum stored place descriptions per trip.
pub const PLACE_DESCRIPTIONS_MAX: usize = 100;
/// Highlights forwarded to the description writer.
pub const DESCRIPTION_HIGHLIGHTS_MAX: usize = 20;
/// Maximum stored length of a description language tag.
pub const DESCRIPTION_LANG_MAX_CHARS: usize = 8;
