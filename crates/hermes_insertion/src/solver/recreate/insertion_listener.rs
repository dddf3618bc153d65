use std::sync::Arc;

use fxhash::FxHashMap;
use jiff::SignedDuration;
use parking_lot::Mutex;

use crate::{
    problem::{
        job::JobIdx, travel_cost_matrix::Cost, vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::{route_id::RouteIdx, vehicle_route::VehicleRoute},
};

/// Lifecycle notifications of an insertion run. Every method defaults to
/// doing nothing.
pub trait InsertionListener: Send {
    fn insertion_starts(
        &mut self,
        _problem: &VehicleRoutingProblem,
        _routes: &[VehicleRoute],
        _unassigned: &[JobIdx],
    ) {
    }

    /// Called after `job_id` was committed to `routes[route_id]`. `added_time`
    /// is the change of the route duration.
    fn job_inserted(
        &mut self,
        _problem: &VehicleRoutingProblem,
        _job_id: JobIdx,
        _route_id: RouteIdx,
        _routes: &[VehicleRoute],
        _cost: Cost,
        _added_time: SignedDuration,
    ) {
    }

    fn job_unassigned(
        &mut self,
        _problem: &VehicleRoutingProblem,
        _job_id: JobIdx,
        _reasons: &[&'static str],
    ) {
    }

    fn insertion_ends(&mut self, _problem: &VehicleRoutingProblem, _routes: &[VehicleRoute]) {}
}

/// Lets the caller keep a handle on a listener handed to the engine.
impl<L: InsertionListener> InsertionListener for Arc<Mutex<L>> {
    fn insertion_starts(
        &mut self,
        problem: &VehicleRoutingProblem,
        routes: &[VehicleRoute],
        unassigned: &[JobIdx],
    ) {
        self.lock().insertion_starts(problem, routes, unassigned);
    }

    fn job_inserted(
        &mut self,
        problem: &VehicleRoutingProblem,
        job_id: JobIdx,
        route_id: RouteIdx,
        routes: &[VehicleRoute],
        cost: Cost,
        added_time: SignedDuration,
    ) {
        self.lock()
            .job_inserted(problem, job_id, route_id, routes, cost, added_time);
    }

    fn job_unassigned(
        &mut self,
        problem: &VehicleRoutingProblem,
        job_id: JobIdx,
        reasons: &[&'static str],
    ) {
        self.lock().job_unassigned(problem, job_id, reasons);
    }

    fn insertion_ends(&mut self, problem: &VehicleRoutingProblem, routes: &[VehicleRoute]) {
        self.lock().insertion_ends(problem, routes);
    }
}

/// Failed constraint names of every job left unassigned, merged across
/// notifications.
#[derive(Debug, Default, Clone)]
pub struct UnassignedJobReasons {
    reasons: FxHashMap<JobIdx, Vec<&'static str>>,
}

impl UnassignedJobReasons {
    pub fn reasons(&self, job_id: JobIdx) -> Option<&[&'static str]> {
        self.reasons.get(&job_id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobIdx, &[&'static str])> {
        self.reasons
            .iter()
            .map(|(&job_id, reasons)| (job_id, reasons.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

impl InsertionListener for UnassignedJobReasons {
    fn insertion_starts(
        &mut self,
        _problem: &VehicleRoutingProblem,
        _routes: &[VehicleRoute],
        _unassigned: &[JobIdx],
    ) {
        self.reasons.clear();
    }

    fn job_unassigned(
        &mut self,
        _problem: &VehicleRoutingProblem,
        job_id: JobIdx,
        reasons: &[&'static str],
    ) {
        let entry = self.reasons.entry(job_id).or_default();
        for &reason in reasons {
            if !entry.contains(&reason) {
                entry.push(reason);
            }
        }
    }
}
