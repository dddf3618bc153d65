use smallvec::SmallVec;

use crate::{
    error::InsertionError,
    problem::{
        job::{Job, JobKind},
        location::LocationIdx,
        time_window::{TimeWindow, candidate_windows},
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

/// Places the break of the route's vehicle. A break without a location is
/// taken at one of its neighbours.
pub struct BreakInsertionCalculator {
    components: InsertionComponents,
}

impl BreakInsertionCalculator {
    pub fn new(components: InsertionComponents) -> Self {
        Self { components }
    }

    fn time_windows(context: &JobInsertionContext) -> Result<Vec<TimeWindow>, InsertionError> {
        match context.job {
            Job::Break(break_job) => Ok(candidate_windows(break_job.time_windows()).collect()),
            Job::RelativeBreak(break_job) => {
                let overflow = |_| InsertionError::TimeOverflow(break_job.external_id().to_owned());
                let start = context
                    .departure_time
                    .checked_add(break_job.earliest_offset())
                    .map_err(overflow)?;
                let end = context
                    .departure_time
                    .checked_add(break_job.latest_offset())
                    .map_err(overflow)?;
                Ok(vec![TimeWindow::new(Some(start), Some(end))])
            }
            Job::Service(_) | Job::Shipment(_) => {
                Err(unexpected_job(context, JobKind::Break.name()))
            }
        }
    }
}

impl JobInsertionCalculator for BreakInsertionCalculator {
    fn calculate(
        &self,
        context: &JobInsertionContext,
        best_known: Cost,
    ) -> Result<InsertionData, InsertionError> {
        let time_windows = Self::time_windows(context)?;
        let route_cost = match self.components.check_route(context) {
            Ok(route_cost) => route_cost,
            Err(no_insertion) => return Ok(no_insertion),
        };
        let mut activities = self.components.create_activities(context, 1)?;
        let template = activities.remove(0);
        let fixed_location = template.location_id();
        let relative = matches!(context.job, Job::RelativeBreak(_));

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

            // A relative break never opens a route that already has work.
            if relative && index == 0 && !route.is_empty() {
                prev_departure = departure_after(context, prev, prev_departure, next);
                continue;
            }

            let mut locations: SmallVec<[Option<LocationIdx>; 2]> = SmallVec::new();
            match fixed_location {
                Some(location_id) => locations.push(Some(location_id)),
                None => {
                    let neighbours = [prev.location_id(), next.location_id()];
                    for location_id in neighbours.into_iter().flatten() {
                        if !locations.contains(&Some(location_id)) {
                            locations.push(Some(location_id));
                        }
                    }
                    if locations.is_empty() {
                        locations.push(None);
                    }
                }
            }

            let mut all_break = true;
            for &location_id in &locations {
                for &time_window in &time_windows {
                    let mut candidate = template.clone();
                    candidate.set_location_id(location_id);
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
                InsertionEvent::InsertBreak { activity, index },
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
