use jiff::Timestamp;

use crate::{
    problem::{
        capacity::Capacity,
        driver::DriverIdx,
        fleet::FleetManager,
        job::{Job, JobIdx},
        vehicle::{Vehicle, VehicleIdx, VehicleTypeIdx},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        solution::{route_id::RouteIdx, tour_activity::TourActivity, vehicle_route::VehicleRoute},
        state::state_cache::StateCache,
    },
};

static NO_LOAD: Capacity = Capacity::ZERO;

/// Everything an evaluation may read besides the route itself. Nothing in
/// here changes while evaluations run.
#[derive(Clone, Copy)]
pub struct InsertionScope<'a> {
    pub problem: &'a VehicleRoutingProblem,
    pub states: &'a StateCache,
    pub fleet: &'a FleetManager,
    /// Share of the jobs already in a route, clamped to a minimum.
    pub completeness_ratio: f64,
    pub vehicle_switch_allowed: bool,
}

/// An activity of the job already placed in the tentative route, such as
/// the pickup while the delivery of a shipment is being placed.
#[derive(Debug, Clone, Copy)]
pub struct RelatedActivity {
    pub insertion_index: usize,
    pub arrival_time: Timestamp,
    pub end_time: Timestamp,
}

/// One job evaluated against one route with one candidate vehicle.
#[derive(Clone, Copy)]
pub struct JobInsertionContext<'a> {
    pub problem: &'a VehicleRoutingProblem,
    pub states: &'a StateCache,
    /// `None` when the route does not exist yet.
    pub route_id: Option<RouteIdx>,
    pub route: &'a VehicleRoute,
    pub job_id: JobIdx,
    pub job: &'a Job,
    pub vehicle_id: VehicleIdx,
    pub vehicle: &'a Vehicle,
    pub vehicle_type: VehicleTypeIdx,
    pub driver_id: Option<DriverIdx>,
    pub departure_time: Timestamp,
    pub completeness_ratio: f64,
    pub related_activity: Option<RelatedActivity>,
}

impl<'a> JobInsertionContext<'a> {
    pub fn new(
        scope: &InsertionScope<'a>,
        route_id: Option<RouteIdx>,
        route: &'a VehicleRoute,
        job_id: JobIdx,
        vehicle_id: VehicleIdx,
        driver_id: Option<DriverIdx>,
        departure_time: Timestamp,
    ) -> Self {
        let problem = scope.problem;
        Self {
            problem,
            states: scope.states,
            route_id,
            route,
            job_id,
            job: problem.job(job_id),
            vehicle_id,
            vehicle: problem.vehicle(vehicle_id),
            vehicle_type: problem.vehicle_type(vehicle_id),
            driver_id,
            departure_time,
            completeness_ratio: scope.completeness_ratio,
            related_activity: None,
        }
    }

    pub fn with_related_activity(mut self, related_activity: RelatedActivity) -> Self {
        self.related_activity = Some(related_activity);
        self
    }

    /// Vehicle currently serving the route, `None` for empty routes.
    pub fn current_vehicle(&self) -> Option<&'a Vehicle> {
        if self.route.is_empty() {
            None
        } else {
            self.route
                .vehicle_id()
                .map(|vehicle_id| self.problem.vehicle(vehicle_id))
        }
    }

    /// True when the candidate vehicle would replace the route's vehicle.
    pub fn is_vehicle_switch(&self) -> bool {
        !self.route.is_empty() && self.route.vehicle_id() != Some(self.vehicle_id)
    }

    pub fn route_load_at_beginning(&self) -> &'a Capacity {
        self.route_state(StateCache::route_load_at_beginning)
    }

    pub fn route_load_at_end(&self) -> &'a Capacity {
        self.route_state(StateCache::route_load_at_end)
    }

    pub fn route_max_load(&self) -> &'a Capacity {
        self.route_state(StateCache::route_max_load)
    }

    /// Latest start of `activity` for the candidate vehicle type. Sentinels
    /// carry their own bound.
    pub fn latest_start(&self, activity: &TourActivity) -> Timestamp {
        match activity.index() {
            Some(index) => self.states.latest_start(index, self.vehicle_type),
            None => activity.latest_start(),
        }
    }

    fn route_state(&self, read: fn(&'a StateCache, RouteIdx) -> &'a Capacity) -> &'a Capacity {
        match self.route_id {
            Some(route_id) if !self.route.is_empty() => read(self.states, route_id),
            _ => &NO_LOAD,
        }
    }
}
