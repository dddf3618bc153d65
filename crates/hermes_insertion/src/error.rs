use thiserror::Error;

/// Malformed input detected while building a problem.
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("missing required field `{field}` on {entity}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
    #[error("job `{0}` has a time window whose start is after its end")]
    MalformedTimeWindow(String),
    #[error("job `{job}` has priority {priority}, expected a value between 1 and 10")]
    InvalidPriority { job: String, priority: u8 },
    #[error("`{entity}` references location {location} but only {num_locations} locations exist")]
    UnknownLocation {
        entity: String,
        location: usize,
        num_locations: usize,
    },
    #[error("vehicle `{vehicle}` references unknown profile {profile}")]
    UnknownProfile { vehicle: String, profile: usize },
    #[error("vehicles sharing type `{0}` must have the same capacity, skills and costs")]
    InconsistentVehicleType(String),
    #[error("duplicate job id `{0}`")]
    DuplicateJob(String),
    #[error("the problem has no vehicles")]
    NoVehicles,
}

/// Fatal failures of an insertion call. Infeasible jobs are never reported
/// through this type.
#[derive(Debug, Error)]
pub enum InsertionError {
    #[error("job {0} is not part of the problem")]
    UnknownJob(usize),
    #[error("job `{0}` is already assigned to a route")]
    JobAlreadyAssigned(String),
    #[error("calculator for {expected} jobs was given job `{job}`")]
    UnexpectedJobKind { expected: &'static str, job: String },
    #[error("time overflow while scheduling job `{0}`")]
    TimeOverflow(String),
    #[error("failed to build the insertion thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("invalid insertion parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),
}
