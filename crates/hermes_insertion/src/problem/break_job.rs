use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

use crate::utils::time::saturating_add;

use super::{
    location::LocationIdx,
    time_window::{TimeWindow, TimeWindows},
    vehicle::VehicleIdx,
};

/// Break configured on a vehicle. The problem turns every definition into a
/// break job owned by that vehicle.
#[derive(Debug, Clone)]
pub enum BreakDefinition {
    /// Break within absolute time windows, optionally at a fixed location.
    Absolute {
        time_windows: Vec<TimeWindow>,
        duration: SignedDuration,
        location_id: Option<usize>,
    },
    /// Break whose window is expressed as offsets from the route departure.
    Relative {
        earliest_offset: SignedDuration,
        latest_offset: SignedDuration,
        duration: SignedDuration,
    },
}

impl BreakDefinition {
    pub fn is_valid(&self) -> bool {
        match self {
            BreakDefinition::Absolute { time_windows, .. } => {
                time_windows.iter().all(|tw| tw.is_valid())
            }
            BreakDefinition::Relative {
                earliest_offset,
                latest_offset,
                ..
            } => earliest_offset <= latest_offset,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Break {
    external_id: String,
    vehicle_id: VehicleIdx,
    time_windows: TimeWindows,
    duration: SignedDuration,
    location_id: Option<LocationIdx>,
}

impl Break {
    pub(crate) fn new(
        external_id: String,
        vehicle_id: VehicleIdx,
        time_windows: Vec<TimeWindow>,
        duration: SignedDuration,
        location_id: Option<LocationIdx>,
    ) -> Self {
        Self {
            external_id,
            vehicle_id,
            time_windows: TimeWindows::from_vec(time_windows),
            duration,
            location_id,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    /// Fixed location, or `None` when the break is taken wherever the vehicle is.
    pub fn location_id(&self) -> Option<LocationIdx> {
        self.location_id
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RelativeBreak {
    external_id: String,
    vehicle_id: VehicleIdx,
    earliest_offset: SignedDuration,
    latest_offset: SignedDuration,
    duration: SignedDuration,
}

impl RelativeBreak {
    pub(crate) fn new(
        external_id: String,
        vehicle_id: VehicleIdx,
        earliest_offset: SignedDuration,
        latest_offset: SignedDuration,
        duration: SignedDuration,
    ) -> Self {
        Self {
            external_id,
            vehicle_id,
            earliest_offset,
            latest_offset,
            duration,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn earliest_offset(&self) -> SignedDuration {
        self.earliest_offset
    }

    pub fn latest_offset(&self) -> SignedDuration {
        self.latest_offset
    }

    /// Absolute window for a route leaving at `departure`.
    pub fn time_window(&self, departure: Timestamp) -> TimeWindow {
        TimeWindow::new(
            Some(saturating_add(departure, self.earliest_offset)),
            Some(saturating_add(departure, self.latest_offset)),
        )
    }
}
