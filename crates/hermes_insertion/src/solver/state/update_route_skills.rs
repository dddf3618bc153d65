use fxhash::FxHashSet;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::solution::{route_id::RouteIdx, vehicle_route::VehicleRoute},
};

use super::{state_cache::StateCache, state_updater::StateUpdater};

/// Skills required by the jobs already in the route. A replacement vehicle
/// must provide all of them.
#[derive(Default)]
pub struct UpdateRouteSkills;

impl StateUpdater for UpdateRouteSkills {
    fn update_route(
        &self,
        problem: &VehicleRoutingProblem,
        route_id: RouteIdx,
        route: &VehicleRoute,
        states: &mut StateCache,
    ) {
        let skills: FxHashSet<_> = route
            .jobs()
            .iter()
            .filter_map(|&job_id| problem.job(job_id).skills())
            .flatten()
            .cloned()
            .collect();

        states.set_route_skills(route_id, skills);
    }
}
