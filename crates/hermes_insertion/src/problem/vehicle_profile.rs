use jiff::SignedDuration;

use crate::define_index_newtype;

use super::{
    location::LocationIdx,
    travel_cost_matrix::{Distance, TravelMatrices},
};

define_index_newtype!(VehicleProfileIdx, VehicleProfile);

/// Travel matrices shared by every vehicle of a profile.
pub struct VehicleProfile {
    external_id: String,
    travel_matrices: TravelMatrices,
}

impl VehicleProfile {
    pub fn new(external_id: String, travel_matrices: TravelMatrices) -> Self {
        Self {
            external_id,
            travel_matrices,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        self.travel_matrices.travel_distance(from, to)
    }

    #[inline(always)]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        self.travel_matrices.travel_time(from, to)
    }

    pub fn travel_matrices(&self) -> &TravelMatrices {
        &self.travel_matrices
    }
}
