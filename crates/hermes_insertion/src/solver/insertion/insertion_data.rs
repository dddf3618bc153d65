use jiff::Timestamp;

use crate::problem::{driver::DriverIdx, travel_cost_matrix::Cost, vehicle::VehicleIdx};

use super::insertion_event::InsertionEvent;

/// Best insertion of a job into one route, or the "no insertion found"
/// sentinel carrying the constraints that rejected it.
#[derive(Debug, Clone)]
pub struct InsertionData {
    pub cost: Cost,
    /// Gap of the service, or of the pickup.
    pub index: Option<usize>,
    /// Gap of the delivery, relative to the route before the pickup is inserted.
    pub delivery_index: Option<usize>,
    pub vehicle_id: Option<VehicleIdx>,
    pub driver_id: Option<DriverIdx>,
    pub departure_time: Timestamp,
    pub events: Vec<InsertionEvent>,
    pub failed_constraints: Vec<&'static str>,
}

impl InsertionData {
    pub const NO_INSERTION_COST: Cost = Cost::MAX;

    pub fn no_insertion_found(
        failed_constraints: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        let mut data = Self {
            cost: Self::NO_INSERTION_COST,
            index: None,
            delivery_index: None,
            vehicle_id: None,
            driver_id: None,
            departure_time: Timestamp::UNIX_EPOCH,
            events: Vec::new(),
            failed_constraints: Vec::new(),
        };
        data.add_failed_constraints(failed_constraints);
        data
    }

    pub fn is_feasible(&self) -> bool {
        self.cost < Self::NO_INSERTION_COST
    }

    /// Merges constraint names, keeping the first occurrence order.
    pub fn add_failed_constraints(&mut self, names: impl IntoIterator<Item = &'static str>) {
        for name in names {
            if !self.failed_constraints.contains(&name) {
                self.failed_constraints.push(name);
            }
        }
    }
}
