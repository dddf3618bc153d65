use super::vehicle::{Vehicle, VehicleIdx, VehicleTypeIdx};

pub enum Fleet {
    /// Every vehicle serves at most one route.
    Finite(Vec<Vehicle>),
    /// Every vehicle can open any number of routes.
    Infinite(Vec<Vehicle>),
}

impl Fleet {
    pub fn vehicles(&self) -> &[Vehicle] {
        match self {
            Fleet::Finite(vehicles) | Fleet::Infinite(vehicles) => vehicles,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Fleet::Infinite(_))
    }

    pub(crate) fn into_parts(self) -> (Vec<Vehicle>, bool) {
        match self {
            Fleet::Finite(vehicles) => (vehicles, false),
            Fleet::Infinite(vehicles) => (vehicles, true),
        }
    }
}

/// Tracks which vehicles already serve a route. Availability is reported
/// per vehicle type: one representative per type that still has a free
/// vehicle.
#[derive(Debug, Clone)]
pub struct FleetManager {
    vehicles_by_type: Vec<Vec<VehicleIdx>>,
    vehicle_types: Vec<VehicleTypeIdx>,
    locked: Vec<bool>,
    infinite: bool,
}

impl FleetManager {
    pub fn new(
        vehicles_by_type: Vec<Vec<VehicleIdx>>,
        vehicle_types: Vec<VehicleTypeIdx>,
        infinite: bool,
    ) -> Self {
        let num_vehicles = vehicle_types.len();
        Self {
            vehicles_by_type,
            vehicle_types,
            locked: vec![false; num_vehicles],
            infinite,
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    /// One free vehicle per vehicle type, in type order.
    pub fn available_vehicles(&self) -> Vec<VehicleIdx> {
        self.vehicles_by_type
            .iter()
            .filter_map(|vehicles| self.first_available(vehicles))
            .collect()
    }

    /// Free vehicles of every type other than the type of `vehicle_id`.
    pub fn available_vehicles_except_type_of(&self, vehicle_id: VehicleIdx) -> Vec<VehicleIdx> {
        let excluded = self.vehicle_types[vehicle_id.get()];
        self.vehicles_by_type
            .iter()
            .enumerate()
            .filter(|(type_index, _)| *type_index != excluded.get())
            .filter_map(|(_, vehicles)| self.first_available(vehicles))
            .collect()
    }

    pub fn is_locked(&self, vehicle_id: VehicleIdx) -> bool {
        !self.infinite && self.locked[vehicle_id.get()]
    }

    pub fn lock(&mut self, vehicle_id: VehicleIdx) {
        if !self.infinite {
            self.locked[vehicle_id.get()] = true;
        }
    }

    pub fn unlock(&mut self, vehicle_id: VehicleIdx) {
        self.locked[vehicle_id.get()] = false;
    }

    pub fn unlock_all(&mut self) {
        self.locked.fill(false);
    }

    fn first_available(&self, vehicles: &[VehicleIdx]) -> Option<VehicleIdx> {
        vehicles
            .iter()
            .copied()
            .find(|&vehicle_id| !self.is_locked(vehicle_id))
    }
}
