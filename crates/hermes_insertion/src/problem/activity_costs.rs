use jiff::{SignedDuration, Timestamp};

use crate::{solver::solution::tour_activity::TourActivity, utils::time::positive_duration_between};

use super::{driver::DriverIdx, travel_cost_matrix::Cost, vehicle::Vehicle};

/// Duration and cost of performing an activity once the vehicle is there.
pub trait ActivityCosts: Send + Sync {
    fn activity_duration(
        &self,
        activity: &TourActivity,
        arrival: Timestamp,
        driver: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> SignedDuration;

    fn activity_cost(
        &self,
        activity: &TourActivity,
        arrival: Timestamp,
        driver: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> Cost;
}

/// Charges waiting before the window opens and the service time itself.
#[derive(Default)]
pub struct WaitingTimeCosts;

impl ActivityCosts for WaitingTimeCosts {
    fn activity_duration(
        &self,
        activity: &TourActivity,
        _arrival: Timestamp,
        _driver: Option<DriverIdx>,
        _vehicle: &Vehicle,
    ) -> SignedDuration {
        activity.duration()
    }

    fn activity_cost(
        &self,
        activity: &TourActivity,
        arrival: Timestamp,
        _driver: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> Cost {
        let costs = vehicle.costs();
        let waiting = positive_duration_between(arrival, activity.earliest_start());

        costs.per_waiting_second * waiting.as_secs_f64()
            + costs.per_service_second * activity.duration().as_secs_f64()
    }
}
