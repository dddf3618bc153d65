use jiff::SignedDuration;
use tracing::trace;

use crate::{
    problem::{
        job::JobIdx, travel_cost_matrix::Cost, vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        recreate::insertion_listener::InsertionListener,
        solution::{route_id::RouteIdx, vehicle_route::VehicleRoute},
    },
    utils::enumerate_idx::EnumerateIdx,
};

use super::{
    state_cache::{StateCache, StateId},
    state_updater::StateUpdater,
    update_future_waiting::UpdateFutureWaiting,
    update_latest_start::UpdateLatestStart,
    update_loads::UpdateLoads,
    update_route_costs::UpdateRouteCosts,
    update_route_skills::UpdateRouteSkills,
};

/// Owns the [`StateCache`] and the updaters that fill it.
///
/// Listens to the insertion lifecycle: every route is recomputed when an
/// insertion starts, and the mutated route after each committed job.
pub struct StateManager {
    states: StateCache,
    updaters: Vec<Box<dyn StateUpdater>>,
    state_names: Vec<String>,
}

impl StateManager {
    pub fn new(problem: &VehicleRoutingProblem) -> Self {
        Self {
            states: StateCache::new(problem.num_activities(), problem.num_vehicle_types()),
            updaters: vec![
                Box::new(UpdateLoads),
                Box::new(UpdateRouteCosts),
                Box::new(UpdateLatestStart),
                Box::new(UpdateFutureWaiting),
                Box::new(UpdateRouteSkills),
            ],
            state_names: Vec::new(),
        }
    }

    /// Registers an updater running after the built-in ones.
    pub fn add_updater(&mut self, updater: Box<dyn StateUpdater>) {
        self.updaters.push(updater);
    }

    /// Reserves an id for a caller-defined state.
    pub fn create_state_id(&mut self, name: impl Into<String>) -> StateId {
        self.state_names.push(name.into());
        StateId::new(self.state_names.len() - 1)
    }

    pub fn state_name(&self, state_id: StateId) -> Option<&str> {
        self.state_names.get(state_id.get()).map(String::as_str)
    }

    pub fn states(&self) -> &StateCache {
        &self.states
    }

    /// Runs every updater on `route`. The route schedule must be up to date.
    pub fn update_route(
        &mut self,
        problem: &VehicleRoutingProblem,
        route_id: RouteIdx,
        route: &VehicleRoute,
    ) {
        self.states.ensure_route(route_id);
        if route.vehicle_id().is_none() {
            return;
        }
        for updater in &self.updaters {
            updater.update_route(problem, route_id, route, &mut self.states);
        }
    }

    pub fn update_all(&mut self, problem: &VehicleRoutingProblem, routes: &[VehicleRoute]) {
        for (route_id, route) in routes.iter().enumerate_idx() {
            self.update_route(problem, route_id, route);
        }
    }
}

impl InsertionListener for StateManager {
    fn insertion_starts(
        &mut self,
        problem: &VehicleRoutingProblem,
        routes: &[VehicleRoute],
        _unassigned: &[JobIdx],
    ) {
        trace!(routes = routes.len(), "Recomputing all route states");
        self.update_all(problem, routes);
    }

    fn job_inserted(
        &mut self,
        problem: &VehicleRoutingProblem,
        _job_id: JobIdx,
        route_id: RouteIdx,
        routes: &[VehicleRoute],
        _cost: Cost,
        _added_time: SignedDuration,
    ) {
        self.update_route(problem, route_id, &routes[route_id]);
    }
}
