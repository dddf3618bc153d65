pub mod activity_factory;
pub mod route_id;
pub mod schedule;
pub mod tour_activity;
pub mod vehicle_route;
