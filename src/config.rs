use crate::constants::*;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>, // In-memory trip store when absent
    pub osrm_url: String,
    pub osrm_profile: Option<String>,
    pub nominatim_url: String,
    pub geocoder_user_agent: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    /// Skip every external oracle and trust client-provided data
    pub fast_mode: bool,
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Minimum pause between two place lookups against the geocoder
    pub geocode_interval_ms: u64,

    /// Half-width (km) of the box used to bias lookups toward the destination
    pub geocode_bias_km: f64,

    /// Locale bundle tried first for every lookup
    pub primary_languages: String,

    /// Locale tried when the primary bundle finds nothing
    pub secondary_languages: String,

    /// Maximum number of place names sent to the description writer
    pub description_place_limit: usize,

    /// Whether out-of-band days are searched for a better waypoint/endpoint
    pub extend_days: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            geocode_interval_ms: 220,
            geocode_bias_km: 50.0,
            primary_languages: "he,en".to_string(),
            secondary_languages: "en".to_string(),
            description_place_limit: 12,
            extend_days: true,
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        Ok(Self {
            geocode_interval_ms: env::var("PLANNER_GEOCODE_INTERVAL_MS")
                .unwrap_or_else(|_| defaults.geocode_interval_ms.to_string())
                .parse()
                .map_err(|_| "Invalid PLANNER_GEOCODE_INTERVAL_MS")?,

            geocode_bias_km: env::var("PLANNER_GEOCODE_BIAS_KM")
                .unwrap_or_else(|_| defaults.geocode_bias_km.to_string())
                .parse()
                .map_err(|_| "Invalid PLANNER_GEOCODE_BIAS_KM")?,

            primary_languages: env::var("PLANNER_PRIMARY_LANGUAGES")
                .unwrap_or(defaults.primary_languages),

            secondary_languages: env::var("PLANNER_SECONDARY_LANGUAGES")
                .unwrap_or(defaults.secondary_languages),

            description_place_limit: env::var("PLANNER_DESCRIPTION_LIMIT")
                .unwrap_or_else(|_| defaults.description_place_limit.to_string())
                .parse()
                .map_err(|_| "Invalid PLANNER_DESCRIPTION_LIMIT")?,

            extend_days: env::var("PLANNER_EXTEND_DAYS")
                .unwrap_or_else(|_| defaults.extend_days.to_string())
                .parse()
                .map_err(|_| "Invalid PLANNER_EXTEND_DAYS")?,
        })
    }

    pub fn geocode_interval(&self) -> Duration {
        Duration::from_millis(self.geocode_interval_ms)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let planner = PlannerConfig::from_env()?;
        if planner.geocode_bias_km <= 0.0 {
            return Err("PLANNER_GEOCODE_BIAS_KM must be positive".to_string());
        }

        let fast_mode = env::var("NO_NETWORK").map(|v| v == "1").unwrap_or(false)
            || env::var("APP_ENV").map(|v| v == "test").unwrap_or(false);

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            osrm_url: env::var("OSRM_URL")
                .unwrap_or_else(|_| DEFAULT_OSRM_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            osrm_profile: env::var("OSRM_PROFILE")
                .ok()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty()),
            nominatim_url: env::var("NOMINATIM_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_USER_AGENT.to_string()),
            groq_api_key: env::var("GROQ_KEY").ok().filter(|k| !k.is_empty()),
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string()),
            fast_mode,
            planner,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
