use jiff::{SignedDuration, Timestamp};

use crate::{
    solver::{
        insertion::insertion_context::JobInsertionContext,
        solution::{
            schedule::{schedule_activity, setup_duration},
            tour_activity::TourActivity,
        },
    },
    utils::time::{saturating_add, saturating_sub},
};

use super::constraint::{ConstraintPriority, ConstraintStatus, HardActivityConstraint};

/// Time windows of the new activity and of its successor, evaluated for the
/// candidate vehicle. Latest start times of the successor come from the
/// state cache so that the whole tail of the route is taken into account.
pub struct TimeWindowConstraint;

impl HardActivityConstraint for TimeWindowConstraint {
    fn constraint_name(&self) -> &'static str {
        "time_window"
    }

    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }

    fn fulfilled(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        next: &TourActivity,
        prev_departure: Timestamp,
    ) -> ConstraintStatus {
        let problem = context.problem;
        let vehicle = context.vehicle;
        let driver_id = context.driver_id;

        let shift_end = vehicle.latest_end_time();
        if shift_end < prev.earliest_start()
            || shift_end < new.earliest_start()
            || shift_end < next.earliest_start()
        {
            return ConstraintStatus::NotFulfilledBreak;
        }

        // Every later gap starts even later.
        if new.latest_start() < prev.earliest_start() {
            return ConstraintStatus::NotFulfilledBreak;
        }

        let open_end = next.is_end() && !vehicle.should_return_to_depot();
        let next_location = if open_end {
            new.location_id()
        } else {
            next.location_id()
        };
        let latest_next = context.latest_start(next);

        let direct_arrival = saturating_add(
            prev_departure,
            problem.transport_time(
                prev.location_id(),
                next_location,
                prev_departure,
                driver_id,
                vehicle,
            ),
        );
        if direct_arrival > latest_next {
            return ConstraintStatus::NotFulfilledBreak;
        }

        if new.earliest_start() > latest_next {
            return ConstraintStatus::NotFulfilled;
        }

        let schedule = schedule_activity(
            problem,
            vehicle,
            driver_id,
            prev.location_id(),
            prev_departure,
            new,
        );

        let next_setup = if open_end {
            SignedDuration::ZERO
        } else {
            setup_duration(new.location_id(), next)
        };
        let backward_travel = problem.backward_transport_time(
            new.location_id(),
            next_location,
            latest_next,
            driver_id,
            vehicle,
        );
        let duration = problem
            .activity_costs()
            .activity_duration(new, schedule.arrival, driver_id, vehicle);
        let latest_new = saturating_sub(
            saturating_sub(saturating_sub(latest_next, backward_travel), next_setup),
            duration,
        )
        .min(new.latest_start());

        if schedule.arrival > latest_new {
            return ConstraintStatus::NotFulfilled;
        }

        if open_end {
            return ConstraintStatus::Fulfilled;
        }

        let arrival_next = saturating_add(
            saturating_add(
                schedule.end,
                problem.transport_time(
                    new.location_id(),
                    next_location,
                    schedule.end,
                    driver_id,
                    vehicle,
                ),
            ),
            next_setup,
        );
        if arrival_next > latest_next {
            ConstraintStatus::NotFulfilled
        } else {
            ConstraintStatus::Fulfilled
        }
    }
}
