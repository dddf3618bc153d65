use jiff::{SignedDuration, Timestamp};

use crate::{
    problem::{
        driver::DriverIdx, location::LocationIdx, travel_cost_matrix::Cost, vehicle::Vehicle,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    utils::time::saturating_add,
};

use super::{tour_activity::TourActivity, vehicle_route::VehicleRoute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySchedule {
    /// Arrival including the setup time.
    pub arrival: Timestamp,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Setup only applies when the vehicle comes from another location.
#[inline]
pub fn setup_duration(from: Option<LocationIdx>, activity: &TourActivity) -> SignedDuration {
    if from == activity.location_id() {
        SignedDuration::ZERO
    } else {
        activity.setup_duration()
    }
}

/// Arrival, start and end of `activity` when leaving `from` at `departure`.
pub fn schedule_activity(
    problem: &VehicleRoutingProblem,
    vehicle: &Vehicle,
    driver_id: Option<DriverIdx>,
    from: Option<LocationIdx>,
    departure: Timestamp,
    activity: &TourActivity,
) -> ActivitySchedule {
    let travel =
        problem.transport_time(from, activity.location_id(), departure, driver_id, vehicle);
    let arrival = saturating_add(
        saturating_add(departure, travel),
        setup_duration(from, activity),
    );
    let start = arrival.max(activity.earliest_start());
    let duration = problem
        .activity_costs()
        .activity_duration(activity, arrival, driver_id, vehicle);

    ActivitySchedule {
        arrival,
        start,
        end: saturating_add(start, duration),
    }
}

/// Transport cost of the leg followed by the setup cost at `activity`.
pub fn leg_cost(
    problem: &VehicleRoutingProblem,
    vehicle: &Vehicle,
    driver_id: Option<DriverIdx>,
    from: Option<LocationIdx>,
    departure: Timestamp,
    activity: &TourActivity,
) -> Cost {
    let transport =
        problem.transport_cost(from, activity.location_id(), departure, driver_id, vehicle);
    let setup = setup_duration(from, activity).as_secs_f64() * vehicle.costs().per_transport_second;
    transport + setup
}

/// Forward pass rewriting the arrival, start and end of every activity of
/// the route, End included. Routes without vehicle are left untouched.
pub fn update_route_schedule(problem: &VehicleRoutingProblem, route: &mut VehicleRoute) {
    let Some(vehicle_id) = route.vehicle_id() else {
        return;
    };
    let vehicle = problem.vehicle(vehicle_id);
    let driver_id = route.driver_id();
    let departure_time = route.departure_time();

    route
        .start_mut()
        .set_schedule(departure_time, departure_time, departure_time);

    let mut location = route.start().location_id();
    let mut departure = departure_time;

    for activity in route.activities_mut() {
        let schedule =
            schedule_activity(problem, vehicle, driver_id, location, departure, activity);
        activity.set_schedule(schedule.arrival, schedule.start, schedule.end);
        location = activity.location_id();
        departure = schedule.end;
    }

    let end = route.end_mut();
    let schedule = schedule_activity(problem, vehicle, driver_id, location, departure, end);
    end.set_schedule(schedule.arrival, schedule.arrival, schedule.arrival);
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{
            capacity::Capacity,
            job::{ActivityId, ActivityIdx, JobIdx},
            time_window::TimeWindow,
            vehicle::VehicleIdx,
        },
        test_utils::{self, TestService, TestVehicle},
    };

    use super::*;

    #[test]
    fn test_setup_is_skipped_at_same_location() {
        let activity = TourActivity::for_job(
            ActivityId::Service(JobIdx::new(0)),
            ActivityIdx::new(0),
            Some(LocationIdx::new(3)),
            SignedDuration::ZERO,
            SignedDuration::from_secs(30),
            Capacity::ZERO,
        );

        assert_eq!(
            setup_duration(Some(LocationIdx::new(3)), &activity),
            SignedDuration::ZERO
        );
        assert_eq!(
            setup_duration(Some(LocationIdx::new(1)), &activity),
            SignedDuration::from_secs(30)
        );
    }

    #[test]
    fn test_update_route_schedule_waits_for_window() {
        let problem = test_utils::create_test_problem(
            vec![
                TestService::at(2)
                    .with_duration(10)
                    .with_time_window(20, 100),
                TestService::at(4).with_duration(5).with_setup(3),
            ],
            vec![],
            vec![TestVehicle::at_depot(0)],
        );
        let route = test_utils::create_route(&problem, VehicleIdx::new(0), &[0, 1]);

        // depot -> 2 takes 2s, waits until 20, leaves at 30
        let first = &route.activities()[0];
        assert_eq!(first.arrival_time(), test_utils::timestamp(2));
        assert_eq!(first.start_time(), test_utils::timestamp(20));
        assert_eq!(first.end_time(), test_utils::timestamp(30));

        // 2 -> 4 takes 2s plus 3s setup
        let second = &route.activities()[1];
        assert_eq!(second.arrival_time(), test_utils::timestamp(35));
        assert_eq!(second.end_time(), test_utils::timestamp(40));

        // back to the depot
        assert_eq!(route.end_time(), test_utils::timestamp(44));
        assert_eq!(
            *route.activities()[0].time_window(),
            TimeWindow::new(Some(test_utils::timestamp(20)), Some(test_utils::timestamp(100)))
        );
    }
}
