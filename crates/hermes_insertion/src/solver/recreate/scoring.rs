use jiff::Timestamp;

use crate::{
    problem::{
        job::JobIdx, travel_cost_matrix::Cost, vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::insertion::insertion_data::InsertionData,
};

use super::insertion_params::RegretParams;

/// Secondary score added to the regret of a job. Higher is more urgent.
pub trait RegretScorer: Send + Sync {
    fn score(&self, problem: &VehicleRoutingProblem, job_id: JobIdx, best: &InsertionData) -> f64;
}

/// Favors jobs with tight time windows and jobs far from the depot of the
/// vehicle of their best insertion.
pub struct DefaultScorer {
    time_window_weight: f64,
    depot_distance_weight: f64,
    minimum_time_window_score: f64,
}

impl DefaultScorer {
    pub fn new(params: &RegretParams) -> Self {
        Self {
            time_window_weight: params.time_window_weight,
            depot_distance_weight: params.depot_distance_weight,
            minimum_time_window_score: params.minimum_time_window_score,
        }
    }
}

impl RegretScorer for DefaultScorer {
    fn score(&self, problem: &VehicleRoutingProblem, job_id: JobIdx, best: &InsertionData) -> f64 {
        let job = problem.job(job_id);
        let activities = job
            .activity_ids(job_id)
            .filter_map(|activity_id| problem.job_activity(activity_id));

        let mut narrowest: Option<f64> = None;
        let mut farthest: f64 = 0.0;
        let vehicle = best.vehicle_id.map(|vehicle_id| problem.vehicle(vehicle_id));
        for activity in activities {
            for time_window in activity.time_windows(Timestamp::UNIX_EPOCH) {
                if let Some(width) = time_window.width() {
                    let width = width.as_secs_f64();
                    narrowest = Some(narrowest.map_or(width, |narrowest| narrowest.min(width)));
                }
            }
            if let Some(vehicle) = vehicle {
                let distance =
                    problem.distance(vehicle.depot_location_id(), activity.location_id(), vehicle);
                farthest = farthest.max(distance);
            }
        }

        let time_window_score = narrowest.map_or(self.minimum_time_window_score, |width| {
            (self.time_window_weight * width).max(self.minimum_time_window_score)
        });
        time_window_score + self.depot_distance_weight * farthest
    }
}

/// `(base - priority) * (second - best)`, with the no-alternative constant
/// standing in for a missing second best.
pub fn regret_score(params: &RegretParams, priority: u8, best: Cost, second: Option<Cost>) -> f64 {
    let weight = params.priority_weight_base - f64::from(priority);
    let second = second.unwrap_or(params.no_alternative_cost);
    weight * (second - best)
}
