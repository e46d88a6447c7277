pub mod geocoder;
pub mod itinerary;
pub mod llm;
pub mod narrative;
pub mod osrm;
pub mod trip_service;

pub use geocoder::{Geocoder, NominatimClient};
pub use itinerary::TripPlanner;
pub use llm::{GroqClient, LlmClient};
pub use osrm::{OsrmClient, RoutingOracle};
pub use trip_service::TripService;
