use jiff::Timestamp;
use smallvec::SmallVec;

use crate::{
    problem::travel_cost_matrix::Cost,
    solver::{
        insertion::insertion_context::JobInsertionContext, solution::tour_activity::TourActivity,
    },
};

use super::{
    break_vehicle_constraint::BreakVehicleConstraint,
    constraint::{
        ConstraintPriority, ConstraintStatus, HardActivityConstraint, HardRouteConstraint,
        SoftActivityConstraint, SoftRouteConstraint,
    },
    load_constraint::{LoadRouteConstraint, ServiceLoadConstraint, ShipmentLoadConstraint},
    maximum_activities_constraint::MaximumActivitiesConstraint,
    skill_constraint::SkillConstraint,
    switch_feasibility_constraint::SwitchFeasibilityConstraint,
    time_window_constraint::TimeWindowConstraint,
    vehicle_fixed_cost_constraint::VehicleFixedCostConstraint,
};

pub type FailedConstraints = SmallVec<[&'static str; 2]>;

/// Result of the hard activity constraints for one gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCheck {
    pub status: ConstraintStatus,
    pub failed_constraints: FailedConstraints,
}

impl ActivityCheck {
    fn fulfilled() -> Self {
        Self {
            status: ConstraintStatus::Fulfilled,
            failed_constraints: FailedConstraints::new(),
        }
    }
}

#[derive(Default)]
pub struct ConstraintManager {
    hard_route: Vec<Box<dyn HardRouteConstraint>>,
    critical: Vec<Box<dyn HardActivityConstraint>>,
    high: Vec<Box<dyn HardActivityConstraint>>,
    low: Vec<Box<dyn HardActivityConstraint>>,
    soft_route: Vec<Box<dyn SoftRouteConstraint>>,
    soft_activity: Vec<Box<dyn SoftActivityConstraint>>,
}

impl ConstraintManager {
    /// Manager holding the constraints every insertion has to respect.
    pub fn with_core_constraints(fixed_cost_weight: f64) -> Self {
        let mut manager = Self::default();
        manager
            .add_hard_route_constraint(Box::new(SkillConstraint))
            .add_hard_route_constraint(Box::new(LoadRouteConstraint))
            .add_hard_route_constraint(Box::new(MaximumActivitiesConstraint))
            .add_hard_route_constraint(Box::new(BreakVehicleConstraint))
            .add_hard_route_constraint(Box::new(SwitchFeasibilityConstraint))
            .add_hard_activity_constraint(Box::new(TimeWindowConstraint))
            .add_hard_activity_constraint(Box::new(ShipmentLoadConstraint))
            .add_hard_activity_constraint(Box::new(ServiceLoadConstraint))
            .add_soft_route_constraint(Box::new(VehicleFixedCostConstraint::new(
                fixed_cost_weight,
            )));
        manager
    }

    pub fn add_hard_route_constraint(
        &mut self,
        constraint: Box<dyn HardRouteConstraint>,
    ) -> &mut ConstraintManager {
        self.hard_route.push(constraint);
        self
    }

    pub fn add_hard_activity_constraint(
        &mut self,
        constraint: Box<dyn HardActivityConstraint>,
    ) -> &mut ConstraintManager {
        match constraint.priority() {
            ConstraintPriority::Critical => self.critical.push(constraint),
            ConstraintPriority::High => self.high.push(constraint),
            ConstraintPriority::Low => self.low.push(constraint),
        }
        self
    }

    pub fn add_soft_route_constraint(
        &mut self,
        constraint: Box<dyn SoftRouteConstraint>,
    ) -> &mut ConstraintManager {
        self.soft_route.push(constraint);
        self
    }

    pub fn add_soft_activity_constraint(
        &mut self,
        constraint: Box<dyn SoftActivityConstraint>,
    ) -> &mut ConstraintManager {
        self.soft_activity.push(constraint);
        self
    }

    /// Name of the first route constraint rejecting the context.
    pub fn check_route(&self, context: &JobInsertionContext) -> Result<(), &'static str> {
        match self
            .hard_route
            .iter()
            .find(|constraint| !constraint.fulfilled(context))
        {
            Some(constraint) => Err(constraint.constraint_name()),
            None => Ok(()),
        }
    }

    /// Critical and high constraints are all evaluated unless one breaks;
    /// low constraints stop at the first failure.
    pub fn check_activity(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        next: &TourActivity,
        prev_departure: Timestamp,
    ) -> ActivityCheck {
        for group in [&self.critical, &self.high] {
            let mut check = ActivityCheck::fulfilled();
            for constraint in group {
                match constraint.fulfilled(context, prev, new, next, prev_departure) {
                    ConstraintStatus::Fulfilled => {}
                    ConstraintStatus::NotFulfilled => {
                        check.status = ConstraintStatus::NotFulfilled;
                        check.failed_constraints.push(constraint.constraint_name());
                    }
                    ConstraintStatus::NotFulfilledBreak => {
                        check.status = ConstraintStatus::NotFulfilledBreak;
                        check.failed_constraints.push(constraint.constraint_name());
                        return check;
                    }
                }
            }
            if check.status != ConstraintStatus::Fulfilled {
                return check;
            }
        }

        for constraint in &self.low {
            let status = constraint.fulfilled(context, prev, new, next, prev_departure);
            if status != ConstraintStatus::Fulfilled {
                let mut check = ActivityCheck::fulfilled();
                check.status = status;
                check.failed_constraints.push(constraint.constraint_name());
                return check;
            }
        }

        ActivityCheck::fulfilled()
    }

    pub fn soft_route_cost(&self, context: &JobInsertionContext) -> Cost {
        self.soft_route
            .iter()
            .map(|constraint| constraint.cost(context))
            .sum()
    }

    pub fn soft_activity_cost(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        next: &TourActivity,
        prev_departure: Timestamp,
    ) -> Cost {
        self.soft_activity
            .iter()
            .map(|constraint| constraint.cost(context, prev, new, next, prev_departure))
            .sum()
    }
}
