use jiff::SignedDuration;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::solution::{route_id::RouteIdx, vehicle_route::VehicleRoute},
    utils::time::positive_duration_between,
};

use super::{state_cache::StateCache, state_updater::StateUpdater};

/// Backward sweep summing the waiting time of the activities that follow
/// each activity. Breaks do not count as waiting.
#[derive(Default)]
pub struct UpdateFutureWaiting;

impl StateUpdater for UpdateFutureWaiting {
    fn update_route(
        &self,
        _problem: &VehicleRoutingProblem,
        _route_id: RouteIdx,
        route: &VehicleRoute,
        states: &mut StateCache,
    ) {
        let mut future_waiting = SignedDuration::ZERO;
        for activity in route.activities().iter().rev() {
            if let Some(index) = activity.index() {
                states.set_future_waiting(index, future_waiting);
            }
            if !activity.is_break() {
                future_waiting +=
                    positive_duration_between(activity.arrival_time(), activity.earliest_start());
            }
        }
    }
}
