use crate::{
    error::InsertionError,
    problem::{
        job::{Job, JobKind},
        time_window::{TimeWindow, candidate_windows},
        travel_cost_matrix::Cost,
    },
    solver::{
        constraints::constraint::ConstraintStatus,
        solution::{schedule::schedule_activity, tour_activity::TourActivity},
    },
};

use super::{
    feasibility::{
        InsertionComponents, JobInsertionCalculator, departure_after, record_failures,
        route_sentinels, tour_activity, unexpected_job,
    },
    insertion_context::{JobInsertionContext, RelatedActivity},
    insertion_data::InsertionData,
    insertion_event::InsertionEvent,
};

struct ShipmentCandidate {
    pickup_index: usize,
    delivery_index: usize,
    pickup: TourActivity,
    delivery: TourActivity,
}

/// Places the pickup, then the delivery in the route as if the pickup was
/// already there. Both indices refer to the route before any insertion.
pub struct ShipmentInsertionCalculator {
    components: InsertionComponents,
}

impl ShipmentInsertionCalculator {
    pub fn new(components: InsertionComponents) -> Self {
        Self { components }
    }
}

impl JobInsertionCalculator for ShipmentInsertionCalculator {
    fn calculate(
        &self,
        context: &JobInsertionContext,
        best_known: Cost,
    ) -> Result<InsertionData, InsertionError> {
        let Job::Shipment(shipment) = context.job else {
            return Err(unexpected_job(context, JobKind::Shipment.name()));
        };
        let route_cost = match self.components.check_route(context) {
            Ok(route_cost) => route_cost,
            Err(no_insertion) => return Ok(no_insertion),
        };
        let activities = self.components.create_activities(context, 2)?;
        let (pickup_template, delivery_template) = (&activities[0], &activities[1]);
        let pickup_windows: Vec<TimeWindow> =
            candidate_windows(shipment.pickup().time_windows()).collect();
        let delivery_windows: Vec<TimeWindow> =
            candidate_windows(shipment.delivery().time_windows()).collect();

        let route = context.route;
        let (start, end) = route_sentinels(context);
        let constraints = &self.components.constraints;

        let mut best_cost = best_known;
        let mut best: Option<ShipmentCandidate> = None;
        let mut failed = Vec::new();
        let mut prev_departure = context.departure_time;

        for pickup_index in 0..=route.len() {
            let prev = tour_activity(route, pickup_index, &start, &end);
            let next = tour_activity(route, pickup_index + 1, &start, &end);

            let mut all_break = true;
            for &pickup_window in &pickup_windows {
                let mut pickup = pickup_template.clone();
                pickup.set_time_window(pickup_window);

                let check =
                    constraints.check_activity(context, prev, &pickup, next, prev_departure);
                match check.status {
                    ConstraintStatus::Fulfilled => all_break = false,
                    ConstraintStatus::NotFulfilled => {
                        all_break = false;
                        record_failures(&mut failed, &check);
                        continue;
                    }
                    ConstraintStatus::NotFulfilledBreak => {
                        record_failures(&mut failed, &check);
                        continue;
                    }
                }

                let pickup_cost = route_cost
                    + self
                        .components
                        .gap_cost(context, prev, &pickup, next, prev_departure);
                let schedule = schedule_activity(
                    context.problem,
                    context.vehicle,
                    context.driver_id,
                    prev.location_id(),
                    prev_departure,
                    &pickup,
                );
                pickup.set_schedule(schedule.arrival, schedule.start, schedule.end);

                let delivery_context = context.with_related_activity(RelatedActivity {
                    insertion_index: pickup_index,
                    arrival_time: schedule.arrival,
                    end_time: schedule.end,
                });
                let mut delivery_prev = &pickup;
                let mut delivery_prev_departure = schedule.end;

                for delivery_index in pickup_index..=route.len() {
                    let delivery_next = tour_activity(route, delivery_index + 1, &start, &end);

                    let mut delivery_all_break = true;
                    for &delivery_window in &delivery_windows {
                        let mut delivery = delivery_template.clone();
                        delivery.set_time_window(delivery_window);

                        let check = constraints.check_activity(
                            &delivery_context,
                            delivery_prev,
                            &delivery,
                            delivery_next,
                            delivery_prev_departure,
                        );
                        match check.status {
                            ConstraintStatus::Fulfilled => {
                                delivery_all_break = false;
                                let cost = pickup_cost
                                    + self.components.gap_cost(
                                        &delivery_context,
                                        delivery_prev,
                                        &delivery,
                                        delivery_next,
                                        delivery_prev_departure,
                                    );
                                if cost < best_cost {
                                    best_cost = cost;
                                    best = Some(ShipmentCandidate {
                                        pickup_index,
                                        delivery_index,
                                        pickup: pickup.clone(),
                                        delivery,
                                    });
                                }
                            }
                            ConstraintStatus::NotFulfilled => {
                                delivery_all_break = false;
                                record_failures(&mut failed, &check);
                            }
                            ConstraintStatus::NotFulfilledBreak => {
                                record_failures(&mut failed, &check)
                            }
                        }
                    }
                    if delivery_all_break {
                        break;
                    }

                    delivery_prev_departure = departure_after(
                        &delivery_context,
                        delivery_prev,
                        delivery_prev_departure,
                        delivery_next,
                    );
                    delivery_prev = delivery_next;
                }
            }
            if all_break {
                break;
            }

            prev_departure = departure_after(context, prev, prev_departure, next);
        }

        let Some(candidate) = best else {
            return Ok(InsertionData::no_insertion_found(failed));
        };

        Ok(InsertionData {
            cost: best_cost,
            index: Some(candidate.pickup_index),
            delivery_index: Some(candidate.delivery_index),
            vehicle_id: Some(context.vehicle_id),
            driver_id: context.driver_id,
            departure_time: context.departure_time,
            events: vec![
                InsertionEvent::InsertActivity {
                    activity: candidate.delivery,
                    index: candidate.delivery_index,
                },
                InsertionEvent::InsertActivity {
                    activity: candidate.pickup,
                    index: candidate.pickup_index,
                },
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
