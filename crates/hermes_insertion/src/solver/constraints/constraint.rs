use jiff::Timestamp;

use crate::{
    problem::travel_cost_matrix::Cost,
    solver::{
        insertion::insertion_context::JobInsertionContext, solution::tour_activity::TourActivity,
    },
};

/// Outcome of a hard activity constraint at one gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintStatus {
    Fulfilled,
    /// This gap is infeasible, later gaps may not be.
    NotFulfilled,
    /// This gap and every later gap of the route are infeasible.
    NotFulfilledBreak,
}

/// Evaluation order of hard activity constraints. Critical and high
/// constraints are all evaluated before giving up on a gap; low ones stop at
/// the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConstraintPriority {
    Critical,
    High,
    Low,
}

/// Checked once per route and candidate vehicle.
pub trait HardRouteConstraint: Send + Sync {
    fn constraint_name(&self) -> &'static str;

    fn fulfilled(&self, context: &JobInsertionContext) -> bool;
}

/// Checked for every gap `prev -> new -> next`, with the vehicle leaving
/// `prev` at `prev_departure`.
pub trait HardActivityConstraint: Send + Sync {
    fn constraint_name(&self) -> &'static str;

    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::High
    }

    fn fulfilled(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        next: &TourActivity,
        prev_departure: Timestamp,
    ) -> ConstraintStatus;
}

pub trait SoftRouteConstraint: Send + Sync {
    fn constraint_name(&self) -> &'static str;

    fn cost(&self, context: &JobInsertionContext) -> Cost;
}

pub trait SoftActivityConstraint: Send + Sync {
    fn constraint_name(&self) -> &'static str;

    fn cost(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        next: &TourActivity,
        prev_departure: Timestamp,
    ) -> Cost;
}
