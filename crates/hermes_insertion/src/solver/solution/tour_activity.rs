use jiff::{SignedDuration, Timestamp};

use crate::problem::{
    capacity::Capacity,
    job::{ActivityId, ActivityIdx, JobIdx},
    location::LocationIdx,
    time_window::TimeWindow,
    vehicle::Vehicle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    Start,
    End,
    Job(ActivityId),
}

/// One stop of a route. Start and End bound every route; the schedule
/// fields are rewritten by every forward sweep.
#[derive(Debug, Clone)]
pub struct TourActivity {
    activity_type: ActivityType,
    index: Option<ActivityIdx>,
    location_id: Option<LocationIdx>,
    time_window: TimeWindow,
    duration: SignedDuration,
    setup_duration: SignedDuration,
    load_change: Capacity,
    arrival_time: Timestamp,
    start_time: Timestamp,
    end_time: Timestamp,
}

impl TourActivity {
    pub(crate) fn for_job(
        activity_id: ActivityId,
        index: ActivityIdx,
        location_id: Option<LocationIdx>,
        duration: SignedDuration,
        setup_duration: SignedDuration,
        load_change: Capacity,
    ) -> Self {
        Self {
            activity_type: ActivityType::Job(activity_id),
            index: Some(index),
            location_id,
            time_window: TimeWindow::UNBOUNDED,
            duration,
            setup_duration,
            load_change,
            arrival_time: Timestamp::UNIX_EPOCH,
            start_time: Timestamp::UNIX_EPOCH,
            end_time: Timestamp::UNIX_EPOCH,
        }
    }

    /// Start sentinel for `vehicle` leaving at `departure`.
    pub fn start(vehicle: &Vehicle, departure: Timestamp) -> Self {
        Self {
            activity_type: ActivityType::Start,
            index: None,
            location_id: vehicle.depot_location_id(),
            time_window: TimeWindow::new(Some(vehicle.earliest_start_time()), None),
            duration: SignedDuration::ZERO,
            setup_duration: SignedDuration::ZERO,
            load_change: Capacity::ZERO,
            arrival_time: departure,
            start_time: departure,
            end_time: departure,
        }
    }

    /// End sentinel for `vehicle`. Open routes end where their last activity is.
    pub fn end(vehicle: &Vehicle) -> Self {
        Self {
            activity_type: ActivityType::End,
            index: None,
            location_id: vehicle.end_location_id(),
            time_window: TimeWindow::new(None, Some(vehicle.latest_end_time())),
            duration: SignedDuration::ZERO,
            setup_duration: SignedDuration::ZERO,
            load_change: Capacity::ZERO,
            arrival_time: Timestamp::UNIX_EPOCH,
            start_time: Timestamp::UNIX_EPOCH,
            end_time: Timestamp::UNIX_EPOCH,
        }
    }

    /// Sentinel for routes without a vehicle.
    pub(crate) fn unbound(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            index: None,
            location_id: None,
            time_window: TimeWindow::UNBOUNDED,
            duration: SignedDuration::ZERO,
            setup_duration: SignedDuration::ZERO,
            load_change: Capacity::ZERO,
            arrival_time: Timestamp::UNIX_EPOCH,
            start_time: Timestamp::UNIX_EPOCH,
            end_time: Timestamp::UNIX_EPOCH,
        }
    }

    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    pub fn activity_id(&self) -> Option<ActivityId> {
        match self.activity_type {
            ActivityType::Job(activity_id) => Some(activity_id),
            ActivityType::Start | ActivityType::End => None,
        }
    }

    pub fn job_id(&self) -> Option<JobIdx> {
        self.activity_id().map(|activity_id| activity_id.job_id())
    }

    pub fn is_start(&self) -> bool {
        self.activity_type == ActivityType::Start
    }

    pub fn is_end(&self) -> bool {
        self.activity_type == ActivityType::End
    }

    pub fn is_break(&self) -> bool {
        self.activity_id().is_some_and(|id| id.is_break())
    }

    pub fn index(&self) -> Option<ActivityIdx> {
        self.index
    }

    pub fn location_id(&self) -> Option<LocationIdx> {
        self.location_id
    }

    pub(crate) fn set_location_id(&mut self, location_id: Option<LocationIdx>) {
        self.location_id = location_id;
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub(crate) fn set_time_window(&mut self, time_window: TimeWindow) {
        self.time_window = time_window;
    }

    pub fn earliest_start(&self) -> Timestamp {
        self.time_window.earliest()
    }

    pub fn latest_start(&self) -> Timestamp {
        self.time_window.latest()
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn setup_duration(&self) -> SignedDuration {
        self.setup_duration
    }

    pub fn load_change(&self) -> &Capacity {
        &self.load_change
    }

    pub fn arrival_time(&self) -> Timestamp {
        self.arrival_time
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub(crate) fn set_schedule(&mut self, arrival: Timestamp, start: Timestamp, end: Timestamp) {
        self.arrival_time = arrival;
        self.start_time = start;
        self.end_time = end;
    }
}
