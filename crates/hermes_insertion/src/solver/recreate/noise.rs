use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::problem::{
    job::JobIdx, travel_cost_matrix::Cost, vehicle_routing_problem::VehicleRoutingProblem,
};

/// Random perturbation of the regret scores. Every job owns its RNG so the
/// noise of a job does not depend on the order jobs are scored in.
pub struct NoiseGenerator {
    rngs: Vec<Mutex<SmallRng>>,
    pub noise_probability: f64,
    pub noise_level: f64,
    pub max_cost: f64,
}

impl NoiseGenerator {
    pub fn new(
        num_jobs: usize,
        max_cost: f64,
        noise_probability: f64,
        noise_level: f64,
        rng: &mut SmallRng,
    ) -> Self {
        Self {
            rngs: (0..num_jobs)
                .map(|_| Mutex::new(SmallRng::from_rng(rng)))
                .collect(),
            noise_probability: noise_probability.clamp(0.0, 1.0),
            noise_level,
            max_cost,
        }
    }

    pub fn create_noise(&self, index: JobIdx) -> f64 {
        let Some(rng) = self.rngs.get(index.get()) else {
            return 0.0;
        };
        let mut rng = rng.lock();

        if rng.random_bool(self.noise_probability) {
            self.noise_level * self.max_cost * rng.random_range(0.0..=1.0)
        } else {
            0.0
        }
    }
}

/// Largest round trip cost between a vehicle type depot and a job activity.
pub fn estimate_max_cost(problem: &VehicleRoutingProblem) -> Cost {
    let mut max_cost: Cost = 0.0;
    for vehicle in problem.vehicles() {
        let depot = vehicle.depot_location_id();
        for (job_id, job) in problem.jobs().iter().enumerate() {
            for activity_id in job.activity_ids(JobIdx::new(job_id)) {
                let location = problem
                    .job_activity(activity_id)
                    .and_then(|activity| activity.location_id());
                let cost = problem.transport_cost(
                    depot,
                    location,
                    vehicle.earliest_start_time(),
                    None,
                    vehicle,
                ) + problem.transport_cost(
                    location,
                    depot,
                    vehicle.earliest_start_time(),
                    None,
                    vehicle,
                );
                max_cost = max_cost.max(cost);
            }
        }
    }
    max_cost
}
