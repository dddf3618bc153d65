use jiff::{SignedDuration, Timestamp};

use crate::{
    problem::travel_cost_matrix::Cost,
    solver::solution::{
        schedule::{leg_cost, schedule_activity},
        tour_activity::TourActivity,
    },
    utils::time::positive_duration_between,
};

use super::insertion_context::JobInsertionContext;

/// Marginal cost of placing `new` between `prev` and `next`.
pub trait ActivityInsertionCostsCalculator: Send + Sync {
    fn costs(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        next: &TourActivity,
        prev_departure: Timestamp,
    ) -> Cost;
}

/// Local approximation: only the legs around the gap are re-costed. The
/// activity and waiting terms are scaled by the completeness ratio, so they
/// weigh less while most jobs are still unassigned.
pub struct LocalActivityInsertionCosts {
    activity_cost_weight: f64,
}

impl LocalActivityInsertionCosts {
    pub fn new(activity_cost_weight: f64) -> Self {
        Self {
            activity_cost_weight,
        }
    }
}

impl Default for LocalActivityInsertionCosts {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ActivityInsertionCostsCalculator for LocalActivityInsertionCosts {
    fn costs(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        next: &TourActivity,
        prev_departure: Timestamp,
    ) -> Cost {
        let problem = context.problem;
        let vehicle = context.vehicle;
        let driver_id = context.driver_id;
        let activity_costs = problem.activity_costs();
        let weight = context.completeness_ratio * self.activity_cost_weight;

        let new_schedule = schedule_activity(
            problem,
            vehicle,
            driver_id,
            prev.location_id(),
            prev_departure,
            new,
        );
        let prev_to_new = leg_cost(
            problem,
            vehicle,
            driver_id,
            prev.location_id(),
            prev_departure,
            new,
        );
        let new_activity_cost =
            activity_costs.activity_cost(new, new_schedule.arrival, driver_id, vehicle);

        if next.is_end() && !vehicle.should_return_to_depot() {
            return prev_to_new + weight * new_activity_cost;
        }

        let next_schedule = schedule_activity(
            problem,
            vehicle,
            driver_id,
            new.location_id(),
            new_schedule.end,
            next,
        );
        let new_to_next = leg_cost(
            problem,
            vehicle,
            driver_id,
            new.location_id(),
            new_schedule.end,
            next,
        );
        let next_activity_cost =
            activity_costs.activity_cost(next, next_schedule.arrival, driver_id, vehicle);
        let total = prev_to_new + new_to_next + weight * (new_activity_cost + next_activity_cost);

        let old_schedule = schedule_activity(
            problem,
            vehicle,
            driver_id,
            prev.location_id(),
            prev_departure,
            next,
        );
        let prev_to_next = leg_cost(
            problem,
            vehicle,
            driver_id,
            prev.location_id(),
            prev_departure,
            next,
        );
        let old_next_activity_cost =
            activity_costs.activity_cost(next, old_schedule.arrival, driver_id, vehicle);
        let mut old = prev_to_next + weight * old_next_activity_cost;

        if !context.route.is_empty() {
            let future_waiting = next.index().map_or(SignedDuration::ZERO, |index| {
                context.states.future_waiting(index)
            });
            let delay = positive_duration_between(old_schedule.end, next_schedule.end);
            let per_waiting_second = context
                .current_vehicle()
                .unwrap_or(vehicle)
                .costs()
                .per_waiting_second;
            old += weight * future_waiting.min(delay).as_secs_f64() * per_waiting_second;
        }

        total - old
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::vehicle::VehicleIdx,
        solver::solution::vehicle_route::VehicleRoute,
        test_utils::{self, InsertionFixture, TestService, TestVehicle},
    };

    use super::*;

    fn costs(fixture: &InsertionFixture, job: usize, position: usize) -> Cost {
        let context = fixture.context(0, job, 0);
        let route = &fixture.routes[0];
        let prev = route.tour_activity(position);
        LocalActivityInsertionCosts::default().costs(
            &context,
            prev,
            &fixture.activity(job),
            route.tour_activity(position + 1),
            prev.end_time(),
        )
    }

    #[test]
    fn test_detour_cost() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(4), TestService::at(2)],
            vec![],
            vec![TestVehicle::at_depot(0)],
        );
        let route = test_utils::create_route(&problem, VehicleIdx::new(0), &[0]);
        let fixture = InsertionFixture::new(problem, vec![route]);

        // 0 -> 2 -> 4 replaces 0 -> 4
        assert_eq!(costs(&fixture, 1, 0), 0.0);
        // 4 -> 2 -> 0 replaces 4 -> 0
        assert_eq!(costs(&fixture, 1, 1), 0.0);
    }

    #[test]
    fn test_empty_route_round_trip() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(3)],
            vec![],
            vec![TestVehicle::at_depot(1)],
        );
        let route = VehicleRoute::new(&problem, VehicleIdx::new(0));
        let fixture = InsertionFixture::new(problem, vec![route]);

        assert_eq!(costs(&fixture, 0, 0), 4.0);
    }

    #[test]
    fn test_open_route_skips_return_leg() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(3)],
            vec![],
            vec![TestVehicle::at_depot(1).open()],
        );
        let route = VehicleRoute::new(&problem, VehicleIdx::new(0));
        let fixture = InsertionFixture::new(problem, vec![route]);

        assert_eq!(costs(&fixture, 0, 0), 2.0);
    }

    #[test]
    fn test_backtracking_detour() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(2), TestService::at(6)],
            vec![],
            vec![TestVehicle::at_depot(0)],
        );
        let route = test_utils::create_route(&problem, VehicleIdx::new(0), &[0]);
        let fixture = InsertionFixture::new(problem, vec![route]);

        // 0 -> 6 -> 2 replaces 0 -> 2
        assert_eq!(costs(&fixture, 1, 0), 8.0);
        // 2 -> 6 -> 0 replaces 2 -> 0
        assert_eq!(costs(&fixture, 1, 1), 8.0);
    }
}
