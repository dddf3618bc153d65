use jiff::Timestamp;

use crate::{
    problem::{driver::DriverIdx, vehicle::VehicleIdx},
    solver::solution::tour_activity::TourActivity,
};

/// One step of the mutation plan attached to an insertion. Indices are gap
/// indices into the route as it was when the plan was computed.
#[derive(Debug, Clone)]
pub enum InsertionEvent {
    InsertActivity {
        activity: TourActivity,
        index: usize,
    },
    InsertBreak {
        activity: TourActivity,
        index: usize,
    },
    SwitchVehicle {
        vehicle_id: VehicleIdx,
        driver_id: Option<DriverIdx>,
        departure_time: Timestamp,
    },
}

impl InsertionEvent {
    /// Gap index of an insert event, `None` for a switch.
    pub fn index(&self) -> Option<usize> {
        match self {
            InsertionEvent::InsertActivity { index, .. }
            | InsertionEvent::InsertBreak { index, .. } => Some(*index),
            InsertionEvent::SwitchVehicle { .. } => None,
        }
    }
}
