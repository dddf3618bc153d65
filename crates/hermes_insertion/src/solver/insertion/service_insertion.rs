use crate::{
    error::InsertionError,
    problem::{
        job::{Job, JobKind},
        time_window::candidate_windows,
        travel_cost_matrix::Cost,
    },
    solver::{constraints::constraint::ConstraintStatus, solution::tour_activity::TourActivity},
};

use super::{
    feasibility::{
        InsertionComponents, JobInsertionCalculator, departure_after, record_failures,
        route_sentinels, tour_activity, unexpected_job,
    },
    insertion_context::JobInsertionContext,
    insertion_data::InsertionData,
    insertion_event::InsertionEvent,
};

/// Tries every gap of the route and every time window of the service.
pub struct ServiceInsertionCalculator {
    components: InsertionComponents,
}

impl ServiceInsertionCalculator {
    pub fn new(components: InsertionComponents) -> Self {
        Self { components }
    }
}

impl JobInsertionCalculator for ServiceInsertionCalculator {
    fn calculate(
        &self,
        context: &JobInsertionContext,
        best_known: Cost,
    ) -> Result<InsertionData, InsertionError> {
        let Job::Service(service) = context.job else {
            return Err(unexpected_job(context, JobKind::Service.name()));
        };
        let route_cost = match self.components.check_route(context) {
            Ok(route_cost) => route_cost,
            Err(no_insertion) => return Ok(no_insertion),
        };
        let mut activities = self.components.create_activities(context, 1)?;
        let template = activities.remove(0);

        let route = context.route;
        let (start, end) = route_sentinels(context);
        let constraints = &self.components.constraints;

        let mut best_cost = best_known;
        let mut best: Option<(usize, TourActivity)> = None;
        let mut failed = Vec::new();
        let mut prev_departure = context.departure_time;

        for index in 0..=route.len() {
            let prev = tour_activity(route, index, &start, &end);
            let next = tour_activity(route, index + 1, &start, &end);

            let mut all_break = true;
            for time_window in candidate_windows(service.time_windows()) {
                let mut candidate = template.clone();
                candidate.set_time_window(time_window);

                let check =
                    constraints.check_activity(context, prev, &candidate, next, prev_departure);
                match check.status {
                    ConstraintStatus::Fulfilled => {
                        all_break = false;
                        let cost = route_cost
                            + self
                                .components
                                .gap_cost(context, prev, &candidate, next, prev_departure);
                        if cost < best_cost {
                            best_cost = cost;
                            best = Some((index, candidate));
                        }
                    }
                    ConstraintStatus::NotFulfilled => {
                        all_break = false;
                        record_failures(&mut failed, &check);
                    }
                    ConstraintStatus::NotFulfilledBreak => record_failures(&mut failed, &check),
                }
            }
            if all_break {
                break;
            }

            prev_departure = departure_after(context, prev, prev_departure, next);
        }

        let Some((index, activity)) = best else {
            return Ok(InsertionData::no_insertion_found(failed));
        };

        Ok(InsertionData {
            cost: best_cost,
            index: Some(index),
            delivery_index: None,
            vehicle_id: Some(context.vehicle_id),
            driver_id: context.driver_id,
            departure_time: context.departure_time,
            events: vec![
                InsertionEvent::InsertActivity { activity, index },
                InsertionEvent::SwitchVehicle {
                    vehicle_id: context.vehicle_id,
                    driver_id: context.driver_id,
                    departure_time: context.departure_time,
                },
            ],
            failed_constraints: failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{time_window::TimeWindow, vehicle::VehicleIdx},
        solver::solution::vehicle_route::VehicleRoute,
        test_utils::{self, InsertionFixture, TestService, TestVehicle, timestamp},
    };

    use super::*;

    fn calculate(fixture: &InsertionFixture, job: usize, best_known: Cost) -> InsertionData {
        ServiceInsertionCalculator::new(test_utils::insertion_components())
            .calculate(&fixture.context(0, job, 0), best_known)
            .unwrap()
    }

    fn fixture(services: Vec<TestService>, route_jobs: &[usize]) -> InsertionFixture {
        let problem = test_utils::create_test_problem(
            services,
            vec![],
            vec![TestVehicle::at_depot(0).with_capacity(10.0)],
        );
        let route = test_utils::create_route(&problem, VehicleIdx::new(0), route_jobs);
        InsertionFixture::new(problem, vec![route])
    }

    #[test]
    fn test_cheapest_gap() {
        let fixture = fixture(
            vec![TestService::at(2), TestService::at(6), TestService::at(4)],
            &[0, 1],
        );

        let data = calculate(&fixture, 2, Cost::MAX);

        assert!(data.is_feasible());
        assert_eq!(data.index, Some(1));
        assert_eq!(data.cost, 0.0);
        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(0)));
        assert!(matches!(
            data.events.as_slice(),
            [
                InsertionEvent::InsertActivity { index: 1, .. },
                InsertionEvent::SwitchVehicle { .. }
            ]
        ));
    }

    #[test]
    fn test_best_known_prunes() {
        let fixture = fixture(vec![TestService::at(3)], &[]);

        let unbounded = calculate(&fixture, 0, Cost::MAX);
        assert_eq!(unbounded.cost, 6.0);

        let pruned = calculate(&fixture, 0, 6.0);
        assert!(!pruned.is_feasible());
        assert!(pruned.failed_constraints.is_empty());

        let looser = calculate(&fixture, 0, 6.5);
        assert_eq!(looser.cost, 6.0);
    }

    #[test]
    fn test_failed_constraints_reported() {
        let fixture = fixture(
            vec![TestService::at(5).with_time_window(0, 3).with_demand(20.0)],
            &[],
        );
        let data = calculate(&fixture, 0, Cost::MAX);
        assert_eq!(data.failed_constraints, vec!["capacity"]);

        let fixture = self::fixture(vec![TestService::at(5).with_time_window(0, 3)], &[]);
        let data = calculate(&fixture, 0, Cost::MAX);
        assert!(!data.is_feasible());
        assert_eq!(data.failed_constraints, vec!["time_window"]);
    }

    #[test]
    fn test_second_time_window_is_used() {
        let fixture = fixture(
            vec![
                TestService::at(3)
                    .with_time_window(0, 1)
                    .with_time_window(10, 20),
            ],
            &[],
        );

        let data = calculate(&fixture, 0, Cost::MAX);

        let Some(InsertionEvent::InsertActivity { activity, .. }) = data.events.first() else {
            panic!("expected an activity insertion");
        };
        assert_eq!(
            *activity.time_window(),
            TimeWindow::new(Some(timestamp(10)), Some(timestamp(20)))
        );
    }

    #[test]
    fn test_exhaustive_against_every_gap() {
        let fixture = fixture(
            vec![
                TestService::at(7),
                TestService::at(2).with_time_window(0, 15),
                TestService::at(9),
                TestService::at(4),
            ],
            &[0, 1, 2],
        );
        let data = calculate(&fixture, 3, Cost::MAX);
        let context = fixture.context(0, 3, 0);
        let components = test_utils::insertion_components();
        let new = fixture.activity(3);
        let route = &fixture.routes[0];

        // brute force over the scheduled route
        let brute_force = (0..=route.len())
            .filter_map(|index| {
                let prev = route.tour_activity(index);
                let next = route.tour_activity(index + 1);
                let check = components.constraints.check_activity(
                    &context,
                    prev,
                    &new,
                    next,
                    prev.end_time(),
                );
                (check.status == ConstraintStatus::Fulfilled).then(|| {
                    components.gap_cost(&context, prev, &new, next, prev.end_time())
                })
            })
            .fold(Cost::MAX, Cost::min);

        assert_eq!(data.cost, brute_force);
    }

    #[test]
    fn test_rejects_other_job_kinds() {
        let problem = test_utils::create_test_problem(
            vec![],
            vec![test_utils::TestShipment::between(1, 2)],
            vec![TestVehicle::at_depot(0)],
        );
        let route = VehicleRoute::new(&problem, VehicleIdx::new(0));
        let fixture = InsertionFixture::new(problem, vec![route]);

        let result = ServiceInsertionCalculator::new(test_utils::insertion_components())
            .calculate(&fixture.context(0, 0, 0), Cost::MAX);

        assert!(matches!(
            result,
            Err(InsertionError::UnexpectedJobKind { expected: "service", .. })
        ));
    }
}
