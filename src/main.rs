use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripplanner::config::Config;
use tripplanner::constants::DEFAULT_GROQ_URL;
use tripplanner::db::{InMemoryTripRepository, PgTripRepository, TripRepository};
use tripplanner::services::{
    GroqClient, NominatimClient, OsrmClient, RoutingOracle, TripPlanner, TripService,
};
use tripplanner::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripplanner=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting trip planner API server");
    if config.fast_mode {
        tracing::info!("Fast mode enabled: client itineraries are stored without oracle calls");
    }

    // Trip storage: Postgres when configured, in-memory otherwise
    let trips: Arc<dyn TripRepository> = if let Some(ref database_url) = config.database_url {
        tracing::info!("Connecting to database...");
        let db_pool = tripplanner::db::create_pool(database_url).await?;
        tracing::info!("Database connection established");

        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Database migrations completed");

        Arc::new(PgTripRepository::new(db_pool))
    } else {
        tracing::warn!("DATABASE_URL not configured. Trips are kept in memory only.");
        Arc::new(InMemoryTripRepository::new())
    };

    // Oracles
    let router: Arc<dyn RoutingOracle> = Arc::new(
        OsrmClient::new(config.osrm_url.clone()).with_profile(config.osrm_profile.clone()),
    );
    let geocoder = Arc::new(NominatimClient::new(
        config.nominatim_url.clone(),
        config.geocoder_user_agent.clone(),
    ));
    if config.groq_api_key.is_none() {
        tracing::warn!("GROQ_KEY not set. AI planning requests will fail.");
    }
    let llm = Arc::new(GroqClient::new(
        DEFAULT_GROQ_URL.to_string(),
        config.groq_api_key.clone(),
        config.groq_model.clone(),
    ));

    let planner = TripPlanner::new(geocoder, router.clone(), llm, config.planner.clone());
    let trip_service = TripService::new(trips, Arc::new(planner), config.fast_mode);

    // Create application state
    let state = Arc::new(AppState {
        trips: trip_service,
        router,
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api", tripplanner::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
