use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::solution::{route_id::RouteIdx, vehicle_route::VehicleRoute},
};

use super::state_cache::StateCache;

/// Recomputes the states derived from one route. Updaters run in
/// registration order after the route schedule is up to date, so an
/// updater may read what the previous ones wrote.
pub trait StateUpdater: Send + Sync {
    fn update_route(
        &self,
        problem: &VehicleRoutingProblem,
        route_id: RouteIdx,
        route: &VehicleRoute,
        states: &mut StateCache,
    );
}
