use std::sync::Arc;

use jiff::SignedDuration;

use super::location::{Location, LocationIdx};

pub type Distance = f64;
pub type Time = f64;
pub type Cost = f64;

/// Flat distance and time matrices, indexed by `from * num_locations + to`.
/// Times are stored in seconds.
#[derive(Clone)]
pub struct TravelMatrices {
    distances: Arc<Vec<Distance>>,
    times: Arc<Vec<Time>>,
    num_locations: usize,
}

impl TravelMatrices {
    pub fn new(distances: Vec<Vec<Distance>>, times: Vec<Vec<Time>>) -> Self {
        let num_locations = distances.len();

        TravelMatrices {
            distances: Arc::new(distances.into_iter().flatten().collect()),
            times: Arc::new(times.into_iter().flatten().collect()),
            num_locations,
        }
    }

    /// Times equal distances, one distance unit per second.
    pub fn from_euclidean(locations: &[Location]) -> Self {
        let num_locations = locations.len();
        let mut distances: Vec<Distance> = vec![0.0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                distances[i * num_locations + j] = from.euclidean_distance(to);
            }
        }

        let distances = Arc::new(distances);
        let times = Arc::clone(&distances);

        TravelMatrices {
            distances,
            times,
            num_locations,
        }
    }

    #[cfg(test)]
    pub fn from_constant(num_locations: usize, time: Time, distance: Distance) -> Self {
        TravelMatrices {
            distances: Arc::new(vec![distance; num_locations * num_locations]),
            times: Arc::new(vec![time; num_locations * num_locations]),
            num_locations,
        }
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        if from == to {
            return 0.0;
        }

        self.distances[self.index(from, to)]
    }

    #[inline(always)]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        if from == to {
            return SignedDuration::ZERO;
        }

        SignedDuration::from_secs_f64(self.times[self.index(from, to)])
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}
