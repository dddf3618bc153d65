use std::sync::Arc;

use jiff::Timestamp;

use crate::{
    error::InsertionError,
    problem::travel_cost_matrix::Cost,
    solver::{
        constraints::constraint_manager::{ActivityCheck, ConstraintManager},
        solution::{
            activity_factory::{ActivityFactory, JobActivities},
            schedule::schedule_activity,
            tour_activity::TourActivity,
            vehicle_route::VehicleRoute,
        },
    },
};

use super::{
    activity_insertion_costs::ActivityInsertionCostsCalculator,
    insertion_context::JobInsertionContext, insertion_data::InsertionData,
};

/// Best insertion of one kind of job into the route of the context.
pub trait JobInsertionCalculator: Send + Sync {
    /// Only candidates strictly cheaper than `best_known` are returned.
    fn calculate(
        &self,
        context: &JobInsertionContext,
        best_known: Cost,
    ) -> Result<InsertionData, InsertionError>;
}

/// Collaborators shared by the job calculators.
#[derive(Clone)]
pub struct InsertionComponents {
    pub constraints: Arc<ConstraintManager>,
    pub activity_costs: Arc<dyn ActivityInsertionCostsCalculator>,
    pub activity_factory: Arc<dyn ActivityFactory>,
}

impl InsertionComponents {
    /// Soft route cost when the route constraints hold, the sentinel naming
    /// the failed constraint otherwise.
    pub fn check_route(&self, context: &JobInsertionContext) -> Result<Cost, InsertionData> {
        self.constraints
            .check_route(context)
            .map(|()| self.constraints.soft_route_cost(context))
            .map_err(|name| InsertionData::no_insertion_found([name]))
    }

    /// Soft activity cost plus marginal activity cost of a feasible gap.
    pub fn gap_cost(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        next: &TourActivity,
        prev_departure: Timestamp,
    ) -> Cost {
        self.constraints
            .soft_activity_cost(context, prev, new, next, prev_departure)
            + self
                .activity_costs
                .costs(context, prev, new, next, prev_departure)
    }

    pub fn create_activities(
        &self,
        context: &JobInsertionContext,
        expected: usize,
    ) -> Result<JobActivities, InsertionError> {
        let activities = self
            .activity_factory
            .create_activities(context.problem, context.job_id);
        if activities.len() == expected {
            Ok(activities)
        } else {
            Err(unexpected_job(context, context.job.kind().name()))
        }
    }
}

pub(crate) fn unexpected_job(
    context: &JobInsertionContext,
    expected: &'static str,
) -> InsertionError {
    InsertionError::UnexpectedJobKind {
        expected,
        job: context.job.external_id().to_owned(),
    }
}

/// Start and End of the route as the candidate vehicle would drive it.
pub(crate) fn route_sentinels(context: &JobInsertionContext) -> (TourActivity, TourActivity) {
    (
        TourActivity::start(context.vehicle, context.departure_time),
        TourActivity::end(context.vehicle),
    )
}

/// Tour position `position` of `route`, with the given sentinels.
pub(crate) fn tour_activity<'a>(
    route: &'a VehicleRoute,
    position: usize,
    start: &'a TourActivity,
    end: &'a TourActivity,
) -> &'a TourActivity {
    if position == 0 {
        start
    } else if position > route.len() {
        end
    } else {
        &route.activities()[position - 1]
    }
}

/// Departure from `activity` when leaving `prev` at `prev_departure`.
pub(crate) fn departure_after(
    context: &JobInsertionContext,
    prev: &TourActivity,
    prev_departure: Timestamp,
    activity: &TourActivity,
) -> Timestamp {
    schedule_activity(
        context.problem,
        context.vehicle,
        context.driver_id,
        prev.location_id(),
        prev_departure,
        activity,
    )
    .end
}

pub(crate) fn record_failures(failed: &mut Vec<&'static str>, check: &ActivityCheck) {
    for &name in &check.failed_constraints {
        if !failed.contains(&name) {
            failed.push(name);
        }
    }
}
