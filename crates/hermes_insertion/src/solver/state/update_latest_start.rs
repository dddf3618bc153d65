use jiff::{SignedDuration, Timestamp};

use crate::{
    problem::{vehicle::VehicleTypeIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solver::solution::{
        route_id::RouteIdx,
        schedule::{schedule_activity, setup_duration},
        tour_activity::TourActivity,
        vehicle_route::VehicleRoute,
    },
    utils::time::{saturating_add, saturating_sub},
};

use super::{state_cache::StateCache, state_updater::StateUpdater};

/// Backward sweep computing, for every vehicle type, the latest time each
/// activity can start without making a later activity late.
///
/// A forward pass with the type's own departure then tells whether the route
/// could be handed over to a vehicle of that type at all.
#[derive(Default)]
pub struct UpdateLatestStart;

impl UpdateLatestStart {
    fn update_for_type(
        problem: &VehicleRoutingProblem,
        route_id: RouteIdx,
        route: &VehicleRoute,
        vehicle_type: VehicleTypeIdx,
        states: &mut StateCache,
    ) {
        let vehicle = problem.vehicle(problem.vehicle_type_representative(vehicle_type));
        let driver_id = route.driver_id();

        let (mut latest_next, mut next_location) = if vehicle.should_return_to_depot() {
            (vehicle.latest_end_time(), vehicle.end_location_id())
        } else {
            (Timestamp::MAX, None)
        };
        let mut next: Option<&TourActivity> = None;

        for activity in route.activities().iter().rev() {
            let travel = problem.backward_transport_time(
                activity.location_id(),
                next_location,
                latest_next,
                driver_id,
                vehicle,
            );
            let setup = next.map_or(SignedDuration::ZERO, |next| {
                setup_duration(activity.location_id(), next)
            });
            let duration = problem.activity_costs().activity_duration(
                activity,
                activity.arrival_time(),
                driver_id,
                vehicle,
            );

            let latest = saturating_sub(
                saturating_sub(saturating_sub(latest_next, travel), setup),
                duration,
            )
            .min(activity.latest_start());

            if let Some(index) = activity.index() {
                states.set_latest_start(index, vehicle_type, latest);
            }

            latest_next = latest;
            next_location = activity.location_id();
            next = Some(activity);
        }

        let mut departure = vehicle.earliest_start_time();
        let mut location = vehicle.depot_location_id();
        let mut not_feasible = false;
        for activity in route.activities() {
            let schedule =
                schedule_activity(problem, vehicle, driver_id, location, departure, activity);
            let latest = activity
                .index()
                .map_or(activity.latest_start(), |index| {
                    states.latest_start(index, vehicle_type)
                });
            if schedule.start > latest {
                not_feasible = true;
                break;
            }
            departure = schedule.end;
            location = activity.location_id();
        }

        if !not_feasible && vehicle.should_return_to_depot() {
            let arrival = saturating_add(
                departure,
                problem.transport_time(
                    location,
                    vehicle.end_location_id(),
                    departure,
                    driver_id,
                    vehicle,
                ),
            );
            not_feasible = arrival > vehicle.latest_end_time();
        }

        states.set_switch_not_feasible(route_id, vehicle_type, not_feasible);
    }
}

impl StateUpdater for UpdateLatestStart {
    fn update_route(
        &self,
        problem: &VehicleRoutingProblem,
        route_id: RouteIdx,
        route: &VehicleRoute,
        states: &mut StateCache,
    ) {
        for vehicle_type in VehicleTypeIdx::range(problem.num_vehicle_types()) {
            Self::update_for_type(problem, route_id, route, vehicle_type, states);
        }
    }
}
