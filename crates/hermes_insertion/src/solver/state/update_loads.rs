use crate::{
    problem::{
        capacity::Capacity,
        job::Job,
        service::ServiceType,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::{route_id::RouteIdx, vehicle_route::VehicleRoute},
};

use super::{state_cache::StateCache, state_updater::StateUpdater};

/// Load carried after each activity, with its running maximum forward and
/// backward. Delivery services are loaded at the depot.
#[derive(Default)]
pub struct UpdateLoads;

impl UpdateLoads {
    fn load_at_beginning(problem: &VehicleRoutingProblem, route: &VehicleRoute) -> Capacity {
        let mut load = Capacity::ZERO;
        for job_id in route.jobs() {
            if let Job::Service(service) = problem.job(*job_id)
                && service.service_type() == ServiceType::Delivery
            {
                load += service.demand();
            }
        }
        load
    }
}

impl StateUpdater for UpdateLoads {
    fn update_route(
        &self,
        problem: &VehicleRoutingProblem,
        route_id: RouteIdx,
        route: &VehicleRoute,
        states: &mut StateCache,
    ) {
        let at_beginning = Self::load_at_beginning(problem, route);

        let mut current = at_beginning.clone();
        let mut past_max = at_beginning.clone();
        for activity in route.activities() {
            current += activity.load_change();
            past_max.update_max(&current);
            if let Some(index) = activity.index() {
                states.set_activity_loads(index, current.clone(), past_max.clone());
            }
        }

        let mut future_max = current.clone();
        for activity in route.activities().iter().rev() {
            if let Some(index) = activity.index() {
                future_max.update_max(states.load(index));
                states.set_future_max_load(index, future_max.clone());
            }
        }

        states.set_route_loads(route_id, at_beginning, current, past_max);
    }
}
