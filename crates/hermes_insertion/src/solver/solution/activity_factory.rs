use smallvec::SmallVec;

use crate::problem::{
    job::JobIdx,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::tour_activity::TourActivity;

pub type JobActivities = SmallVec<[TourActivity; 2]>;

/// Creates the tour activities of a job, in route order.
pub trait ActivityFactory: Send + Sync {
    fn create_activities(&self, problem: &VehicleRoutingProblem, job_id: JobIdx) -> JobActivities;
}

#[derive(Default)]
pub struct DefaultActivityFactory;

impl ActivityFactory for DefaultActivityFactory {
    fn create_activities(&self, problem: &VehicleRoutingProblem, job_id: JobIdx) -> JobActivities {
        let job = problem.job(job_id);
        job.activity_ids(job_id)
            .filter_map(|activity_id| {
                let activity = job.activity(activity_id)?;
                Some(TourActivity::for_job(
                    activity_id,
                    problem.activity_index(activity_id),
                    activity.location_id(),
                    activity.duration(),
                    activity.setup_duration(),
                    activity.load_change(),
                ))
            })
            .collect()
    }
}
