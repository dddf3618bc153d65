use tracing::trace;

use crate::{
    problem::{
        fleet::FleetManager,
        job::{ActivityId, JobIdx},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::{
        schedule::update_route_schedule, tour_activity::TourActivity, vehicle_route::VehicleRoute,
    },
};

use super::{insertion_data::InsertionData, insertion_event::InsertionEvent};

/// Applies the events of `data` to `route` and reschedules it.
///
/// Insert events are applied from the highest gap index down so the
/// recorded indices stay valid. Within one gap the pickup goes in last so it
/// ends up ahead of its delivery. Returns the break of the previous vehicle
/// when a vehicle switch removed it from the route.
pub(crate) fn apply_insertion(
    problem: &VehicleRoutingProblem,
    route: &mut VehicleRoute,
    fleet: &mut FleetManager,
    data: InsertionData,
) -> Option<JobIdx> {
    let mut inserts: Vec<(usize, TourActivity)> = Vec::with_capacity(data.events.len());
    let mut switch = None;
    for event in data.events {
        match event {
            InsertionEvent::InsertActivity { activity, index }
            | InsertionEvent::InsertBreak { activity, index } => inserts.push((index, activity)),
            InsertionEvent::SwitchVehicle {
                vehicle_id,
                driver_id,
                departure_time,
            } => switch = Some((vehicle_id, driver_id, departure_time)),
        }
    }
    inserts.sort_by(|(a, first), (b, second)| {
        b.cmp(a).then_with(|| is_pickup(first).cmp(&is_pickup(second)))
    });

    for (index, activity) in inserts {
        let at_end = index >= route.len();
        let location_id = activity.location_id();
        route.insert_activity(index, activity);

        let open_route = route
            .vehicle_id()
            .is_some_and(|vehicle_id| !problem.vehicle(vehicle_id).should_return_to_depot());
        if at_end && open_route && location_id.is_some() {
            route.end_mut().set_location_id(location_id);
        }
    }

    let mut removed_break = None;
    if let Some((vehicle_id, driver_id, departure_time)) = switch {
        let previous = route.vehicle_id();
        if previous != Some(vehicle_id)
            || route.departure_time() != departure_time
            || route.driver_id() != driver_id
        {
            if let Some(previous) = previous
                && previous != vehicle_id
            {
                if let Some(break_id) = problem.break_of_vehicle(previous)
                    && route.remove_job(break_id)
                {
                    trace!(break_id = %break_id, "Removed break of the replaced vehicle");
                    removed_break = Some(break_id);
                }
                fleet.unlock(previous);
            }
            route.set_vehicle_and_departure_time(
                vehicle_id,
                problem.vehicle(vehicle_id),
                driver_id,
                departure_time,
            );
        }
        fleet.lock(vehicle_id);
    }

    update_route_schedule(problem, route);
    removed_break
}

fn is_pickup(activity: &TourActivity) -> bool {
    matches!(activity.activity_id(), Some(ActivityId::ShipmentPickup(_)))
}
