pub mod coordinates;
pub mod distance;
pub mod geo;
pub mod mode;
pub mod requests;
pub mod trip;

pub use coordinates::{distance_km, path_length_km, Coordinates};
pub use distance::{round_km, DistanceBand};
pub use geo::BoundingBox;
pub use mode::TransportMode;
pub use requests::{
    AiPlanRequest, CreateTripRequest, RoutePointInput, RouteRequest, RouteResponse,
    UpdateTripRequest, validate_summary,
};
pub use trip::{
    Day, Destination, ImageCredit, MapPoint, NewTrip, Overnight, PlaceDescription, Plan,
    RouteSummary, Trip, TripImage,
};
