use fxhash::FxHashSet;
use jiff::Timestamp;

use crate::problem::{
    driver::DriverIdx,
    job::JobIdx,
    location::LocationIdx,
    vehicle::{Vehicle, VehicleIdx},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::tour_activity::{ActivityType, TourActivity};

/// Ordered activities of one vehicle, bounded by its Start and End
/// sentinels. Positions passed to `tour_activity` count the Start as 0.
#[derive(Debug, Clone)]
pub struct VehicleRoute {
    vehicle_id: Option<VehicleIdx>,
    driver_id: Option<DriverIdx>,
    departure_time: Timestamp,
    start: TourActivity,
    end: TourActivity,
    activities: Vec<TourActivity>,
    jobs: FxHashSet<JobIdx>,
}

impl VehicleRoute {
    /// Route without vehicle and without activities.
    pub fn empty() -> Self {
        Self {
            vehicle_id: None,
            driver_id: None,
            departure_time: Timestamp::UNIX_EPOCH,
            start: TourActivity::unbound(ActivityType::Start),
            end: TourActivity::unbound(ActivityType::End),
            activities: Vec::new(),
            jobs: FxHashSet::default(),
        }
    }

    /// Empty route served by `vehicle_id`, leaving at the vehicle's earliest start.
    pub fn new(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Self {
        let vehicle = problem.vehicle(vehicle_id);
        let mut route = Self::empty();
        route.set_vehicle_and_departure_time(
            vehicle_id,
            vehicle,
            None,
            vehicle.earliest_start_time(),
        );
        route
    }

    pub fn vehicle_id(&self) -> Option<VehicleIdx> {
        self.vehicle_id
    }

    pub fn driver_id(&self) -> Option<DriverIdx> {
        self.driver_id
    }

    pub fn departure_time(&self) -> Timestamp {
        self.departure_time
    }

    pub fn start(&self) -> &TourActivity {
        &self.start
    }

    pub fn end(&self) -> &TourActivity {
        &self.end
    }

    pub(crate) fn start_mut(&mut self) -> &mut TourActivity {
        &mut self.start
    }

    pub(crate) fn end_mut(&mut self) -> &mut TourActivity {
        &mut self.end
    }

    pub fn activities(&self) -> &[TourActivity] {
        &self.activities
    }

    pub(crate) fn activities_mut(&mut self) -> &mut [TourActivity] {
        &mut self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Activity at `position` in the tour Start, a1, .., an, End.
    pub fn tour_activity(&self, position: usize) -> &TourActivity {
        if position == 0 {
            &self.start
        } else if position > self.activities.len() {
            &self.end
        } else {
            &self.activities[position - 1]
        }
    }

    pub fn contains_job(&self, job_id: JobIdx) -> bool {
        self.jobs.contains(&job_id)
    }

    pub fn jobs(&self) -> &FxHashSet<JobIdx> {
        &self.jobs
    }

    /// Time at which the vehicle reaches the End sentinel.
    pub fn end_time(&self) -> Timestamp {
        self.end.arrival_time()
    }

    pub fn last_location_id(&self) -> Option<LocationIdx> {
        self.activities
            .last()
            .map_or(self.start.location_id(), |activity| activity.location_id())
    }

    /// Inserts `activity` before the activity currently at `index`.
    pub(crate) fn insert_activity(&mut self, index: usize, activity: TourActivity) {
        if let Some(job_id) = activity.job_id() {
            self.jobs.insert(job_id);
        }
        self.activities.insert(index.min(self.activities.len()), activity);
    }

    /// Removes every activity of `job_id`. Returns whether the job was served.
    pub(crate) fn remove_job(&mut self, job_id: JobIdx) -> bool {
        if !self.jobs.remove(&job_id) {
            return false;
        }
        self.activities
            .retain(|activity| activity.job_id() != Some(job_id));
        true
    }

    /// Rebinds the route to `vehicle`. The Start and End sentinels are
    /// rebuilt; an open route keeps ending at its last activity.
    pub(crate) fn set_vehicle_and_departure_time(
        &mut self,
        vehicle_id: VehicleIdx,
        vehicle: &Vehicle,
        driver_id: Option<DriverIdx>,
        departure_time: Timestamp,
    ) {
        self.vehicle_id = Some(vehicle_id);
        self.driver_id = driver_id;
        self.departure_time = departure_time;
        self.start = TourActivity::start(vehicle, departure_time);
        self.end = TourActivity::end(vehicle);
        if !vehicle.should_return_to_depot() && !self.activities.is_empty() {
            let last_location = self.last_location_id();
            self.end.set_location_id(last_location);
        }
    }
}

impl Default for VehicleRoute {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use crate::{
        problem::{
            capacity::Capacity,
            job::{ActivityId, ActivityIdx},
        },
        test_utils::{self, TestService, TestVehicle},
    };

    use super::*;

    fn activity(job: usize, location: usize) -> TourActivity {
        TourActivity::for_job(
            ActivityId::Service(JobIdx::new(job)),
            ActivityIdx::new(job),
            Some(LocationIdx::new(location)),
            SignedDuration::ZERO,
            SignedDuration::ZERO,
            Capacity::ZERO,
        )
    }

    #[test]
    fn test_tour_positions() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(1), TestService::at(2)],
            vec![],
            vec![TestVehicle::at_depot(0)],
        );
        let mut route = VehicleRoute::new(&problem, VehicleIdx::new(0));
        route.insert_activity(0, activity(1, 2));
        route.insert_activity(0, activity(0, 1));

        assert!(route.tour_activity(0).is_start());
        assert_eq!(route.tour_activity(1).job_id(), Some(JobIdx::new(0)));
        assert_eq!(route.tour_activity(2).job_id(), Some(JobIdx::new(1)));
        assert!(route.tour_activity(3).is_end());
        assert!(route.contains_job(JobIdx::new(1)));

        assert!(route.remove_job(JobIdx::new(0)));
        assert!(!route.remove_job(JobIdx::new(0)));
        assert_eq!(route.len(), 1);
    }

    #[test]
    fn test_switching_open_route_keeps_last_location_as_end() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(4)],
            vec![],
            vec![TestVehicle::at_depot(0), TestVehicle::at_depot(1).open()],
        );
        let mut route = VehicleRoute::new(&problem, VehicleIdx::new(0));
        route.insert_activity(0, activity(0, 4));

        let open_vehicle = problem.vehicle(VehicleIdx::new(1));
        route.set_vehicle_and_departure_time(
            VehicleIdx::new(1),
            open_vehicle,
            None,
            open_vehicle.earliest_start_time(),
        );

        assert_eq!(route.vehicle_id(), Some(VehicleIdx::new(1)));
        assert_eq!(route.start().location_id(), Some(LocationIdx::new(1)));
        assert_eq!(route.end().location_id(), Some(LocationIdx::new(4)));
    }
}
