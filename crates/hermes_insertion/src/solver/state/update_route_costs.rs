use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::solution::{route_id::RouteIdx, schedule::leg_cost, vehicle_route::VehicleRoute},
};

use super::{state_cache::StateCache, state_updater::StateUpdater};

/// Forward sweep accumulating transport, setup and activity costs. The
/// route cost also carries the fixed cost of its vehicle.
#[derive(Default)]
pub struct UpdateRouteCosts;

impl StateUpdater for UpdateRouteCosts {
    fn update_route(
        &self,
        problem: &VehicleRoutingProblem,
        route_id: RouteIdx,
        route: &VehicleRoute,
        states: &mut StateCache,
    ) {
        let Some(vehicle_id) = route.vehicle_id() else {
            states.set_route_costs(route_id, 0.0);
            return;
        };
        if route.is_empty() {
            states.set_route_costs(route_id, 0.0);
            return;
        }

        let vehicle = problem.vehicle(vehicle_id);
        let driver_id = route.driver_id();
        let mut previous = route.start();
        let mut costs = 0.0;

        for activity in route.activities() {
            costs += leg_cost(
                problem,
                vehicle,
                driver_id,
                previous.location_id(),
                previous.end_time(),
                activity,
            );
            costs += problem.activity_costs().activity_cost(
                activity,
                activity.arrival_time(),
                driver_id,
                vehicle,
            );
            if let Some(index) = activity.index() {
                states.set_accumulated_costs(index, costs);
            }
            previous = activity;
        }

        costs += leg_cost(
            problem,
            vehicle,
            driver_id,
            previous.location_id(),
            previous.end_time(),
            route.end(),
        );

        states.set_route_costs(route_id, costs + vehicle.costs().fixed);
    }
}
