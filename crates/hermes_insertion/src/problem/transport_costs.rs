use jiff::{SignedDuration, Timestamp};

use super::{
    driver::DriverIdx,
    location::LocationIdx,
    travel_cost_matrix::{Cost, Distance},
    vehicle::Vehicle,
    vehicle_profile::VehicleProfile,
};

/// Travel time and cost between two locations for a given vehicle.
pub trait TransportCosts: Send + Sync {
    fn transport_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        departure: Timestamp,
        driver: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> SignedDuration;

    /// Travel time when arriving at `to` at `arrival`. Used by backward
    /// sweeps; defaults to the forward time.
    fn backward_transport_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        arrival: Timestamp,
        driver: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> SignedDuration {
        self.transport_time(from, to, arrival, driver, vehicle)
    }

    fn transport_cost(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        departure: Timestamp,
        driver: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> Cost;

    fn distance(&self, from: LocationIdx, to: LocationIdx, vehicle: &Vehicle) -> Distance;
}

/// Reads the vehicle profile matrices and prices them with the vehicle costs.
pub struct MatrixTransportCosts {
    profiles: Vec<VehicleProfile>,
}

impl MatrixTransportCosts {
    pub fn new(profiles: Vec<VehicleProfile>) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &[VehicleProfile] {
        &self.profiles
    }

    fn profile(&self, vehicle: &Vehicle) -> &VehicleProfile {
        &self.profiles[vehicle.profile_id()]
    }
}

impl TransportCosts for MatrixTransportCosts {
    fn transport_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        _departure: Timestamp,
        _driver: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> SignedDuration {
        self.profile(vehicle).travel_time(from, to)
    }

    fn transport_cost(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        _departure: Timestamp,
        _driver: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> Cost {
        let profile = self.profile(vehicle);
        let costs = vehicle.costs();

        costs.per_distance * profile.travel_distance(from, to)
            + costs.per_transport_second * profile.travel_time(from, to).as_secs_f64()
    }

    fn distance(&self, from: LocationIdx, to: LocationIdx, vehicle: &Vehicle) -> Distance {
        self.profile(vehicle).travel_distance(from, to)
    }
}
