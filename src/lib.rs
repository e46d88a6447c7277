// Library exports for testing and reusability

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

// Re-export commonly used types
pub use error::{AppError, Result};

use services::{RoutingOracle, TripService};
use std::sync::Arc;

// App state for sharing across the application
pub struct AppState {
    pub trips: TripService,
    pub router: Arc<dyn RoutingOracle>,
}
