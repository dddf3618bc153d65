use std::fmt::Display;

use fxhash::FxHashSet;
use jiff::{SignedDuration, Timestamp};

use crate::define_index_newtype;

use super::{
    break_job::{Break, RelativeBreak},
    capacity::Capacity,
    location::LocationIdx,
    service::{Service, ServiceType},
    shipment::Shipment,
    skill::Skill,
    time_window::TimeWindow,
    vehicle::VehicleIdx,
};

define_index_newtype!(JobIdx, Job);
// Stable key of a job activity into the per-activity state arrays.
define_index_newtype!(ActivityIdx);

pub const DEFAULT_PRIORITY: u8 = 2;

static NO_DEMAND: Capacity = Capacity::ZERO;

/// Identifies one activity of one job.
#[derive(Hash, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ActivityId {
    Service(JobIdx),
    ShipmentPickup(JobIdx),
    ShipmentDelivery(JobIdx),
    Break(JobIdx),
}

impl ActivityId {
    pub fn job_id(&self) -> JobIdx {
        match self {
            ActivityId::Service(id)
            | ActivityId::ShipmentPickup(id)
            | ActivityId::ShipmentDelivery(id)
            | ActivityId::Break(id) => *id,
        }
    }

    pub fn is_shipment(&self) -> bool {
        matches!(
            self,
            ActivityId::ShipmentPickup(_) | ActivityId::ShipmentDelivery(_)
        )
    }

    pub fn is_break(&self) -> bool {
        matches!(self, ActivityId::Break(_))
    }

    /// Offset of this activity among the activities of its job.
    pub(crate) fn activity_offset(&self) -> usize {
        match self {
            ActivityId::ShipmentDelivery(_) => 1,
            _ => 0,
        }
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityId::Service(id) => write!(f, "Service({id})"),
            ActivityId::ShipmentPickup(id) => write!(f, "ShipmentPickup({id})"),
            ActivityId::ShipmentDelivery(id) => write!(f, "ShipmentDelivery({id})"),
            ActivityId::Break(id) => write!(f, "Break({id})"),
        }
    }
}

impl From<ActivityId> for JobIdx {
    fn from(activity_id: ActivityId) -> Self {
        activity_id.job_id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Service,
    Shipment,
    Break,
    RelativeBreak,
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Service => "service",
            JobKind::Shipment => "shipment",
            JobKind::Break => "break",
            JobKind::RelativeBreak => "relative break",
        }
    }
}

/// Read access to the data of one job activity.
#[derive(Clone, Copy)]
pub enum JobActivity<'a> {
    Service(&'a Service),
    ShipmentPickup(&'a Shipment),
    ShipmentDelivery(&'a Shipment),
    Break(&'a Break),
    RelativeBreak(&'a RelativeBreak),
}

impl JobActivity<'_> {
    pub fn location_id(&self) -> Option<LocationIdx> {
        match self {
            JobActivity::Service(service) => Some(service.location_id()),
            JobActivity::ShipmentPickup(shipment) => Some(shipment.pickup().location_id()),
            JobActivity::ShipmentDelivery(shipment) => Some(shipment.delivery().location_id()),
            JobActivity::Break(break_job) => break_job.location_id(),
            JobActivity::RelativeBreak(_) => None,
        }
    }

    pub fn duration(&self) -> SignedDuration {
        match self {
            JobActivity::Service(service) => service.duration(),
            JobActivity::ShipmentPickup(shipment) => shipment.pickup().duration(),
            JobActivity::ShipmentDelivery(shipment) => shipment.delivery().duration(),
            JobActivity::Break(break_job) => break_job.duration(),
            JobActivity::RelativeBreak(break_job) => break_job.duration(),
        }
    }

    pub fn setup_duration(&self) -> SignedDuration {
        match self {
            JobActivity::Service(service) => service.setup_duration(),
            JobActivity::ShipmentPickup(shipment) => shipment.pickup().setup_duration(),
            JobActivity::ShipmentDelivery(shipment) => shipment.delivery().setup_duration(),
            JobActivity::Break(_) | JobActivity::RelativeBreak(_) => SignedDuration::ZERO,
        }
    }

    /// Time windows of the activity, resolved against the route departure
    /// for relative breaks.
    pub fn time_windows(&self, departure: Timestamp) -> Vec<TimeWindow> {
        match self {
            JobActivity::Service(service) => service.time_windows().to_vec(),
            JobActivity::ShipmentPickup(shipment) => shipment.pickup().time_windows().to_vec(),
            JobActivity::ShipmentDelivery(shipment) => {
                shipment.delivery().time_windows().to_vec()
            }
            JobActivity::Break(break_job) => break_job.time_windows().to_vec(),
            JobActivity::RelativeBreak(break_job) => vec![break_job.time_window(departure)],
        }
    }

    /// Signed change of the vehicle load when the activity is served.
    pub fn load_change(&self) -> Capacity {
        match self {
            JobActivity::Service(service) => match service.service_type() {
                ServiceType::Pickup => service.demand().clone(),
                ServiceType::Delivery => -service.demand(),
            },
            JobActivity::ShipmentPickup(shipment) => shipment.demand().clone(),
            JobActivity::ShipmentDelivery(shipment) => -shipment.demand(),
            JobActivity::Break(_) | JobActivity::RelativeBreak(_) => Capacity::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Job {
    Service(Service),
    Shipment(Shipment),
    Break(Break),
    RelativeBreak(RelativeBreak),
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::Service(_) => JobKind::Service,
            Job::Shipment(_) => JobKind::Shipment,
            Job::Break(_) => JobKind::Break,
            Job::RelativeBreak(_) => JobKind::RelativeBreak,
        }
    }

    pub fn external_id(&self) -> &str {
        match self {
            Job::Service(service) => service.external_id(),
            Job::Shipment(shipment) => shipment.external_id(),
            Job::Break(break_job) => break_job.external_id(),
            Job::RelativeBreak(break_job) => break_job.external_id(),
        }
    }

    /// Lower is more urgent. Breaks never compete on priority.
    pub fn priority(&self) -> u8 {
        match self {
            Job::Service(service) => service.priority(),
            Job::Shipment(shipment) => shipment.priority(),
            Job::Break(_) | Job::RelativeBreak(_) => DEFAULT_PRIORITY,
        }
    }

    pub fn has_cross_route_dependency(&self) -> bool {
        match self {
            Job::Service(service) => service.has_cross_route_dependency(),
            Job::Shipment(shipment) => shipment.has_cross_route_dependency(),
            Job::Break(_) | Job::RelativeBreak(_) => false,
        }
    }

    pub fn demand(&self) -> &Capacity {
        match self {
            Job::Service(service) => service.demand(),
            Job::Shipment(shipment) => shipment.demand(),
            Job::Break(_) | Job::RelativeBreak(_) => &NO_DEMAND,
        }
    }

    pub fn skills(&self) -> Option<&FxHashSet<Skill>> {
        match self {
            Job::Service(service) => Some(service.skills()),
            Job::Shipment(shipment) => Some(shipment.skills()),
            Job::Break(_) | Job::RelativeBreak(_) => None,
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Job::Break(_) | Job::RelativeBreak(_))
    }

    /// Vehicle owning the job, only set for breaks.
    pub fn owner_vehicle(&self) -> Option<VehicleIdx> {
        match self {
            Job::Break(break_job) => Some(break_job.vehicle_id()),
            Job::RelativeBreak(break_job) => Some(break_job.vehicle_id()),
            Job::Service(_) | Job::Shipment(_) => None,
        }
    }

    pub fn activity_count(&self) -> usize {
        match self {
            Job::Shipment(_) => 2,
            _ => 1,
        }
    }

    pub fn activity_ids(&self, job_id: JobIdx) -> impl Iterator<Item = ActivityId> {
        let ids = match self {
            Job::Service(_) => [Some(ActivityId::Service(job_id)), None],
            Job::Shipment(_) => [
                Some(ActivityId::ShipmentPickup(job_id)),
                Some(ActivityId::ShipmentDelivery(job_id)),
            ],
            Job::Break(_) | Job::RelativeBreak(_) => [Some(ActivityId::Break(job_id)), None],
        };
        ids.into_iter().flatten()
    }

    /// Activity data for `activity_id`, `None` when the id belongs to
    /// another kind of job.
    pub fn activity(&self, activity_id: ActivityId) -> Option<JobActivity<'_>> {
        match (self, activity_id) {
            (Job::Service(service), ActivityId::Service(_)) => Some(JobActivity::Service(service)),
            (Job::Shipment(shipment), ActivityId::ShipmentPickup(_)) => {
                Some(JobActivity::ShipmentPickup(shipment))
            }
            (Job::Shipment(shipment), ActivityId::ShipmentDelivery(_)) => {
                Some(JobActivity::ShipmentDelivery(shipment))
            }
            (Job::Break(break_job), ActivityId::Break(_)) => Some(JobActivity::Break(break_job)),
            (Job::RelativeBreak(break_job), ActivityId::Break(_)) => {
                Some(JobActivity::RelativeBreak(break_job))
            }
            _ => None,
        }
    }
}

impl From<Service> for Job {
    fn from(service: Service) -> Self {
        Job::Service(service)
    }
}

impl From<Shipment> for Job {
    fn from(shipment: Shipment) -> Self {
        Job::Shipment(shipment)
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::{service::ServiceBuilder, shipment::ShipmentLocation};

    use super::*;

    #[test]
    fn test_activity_ids() {
        let mut builder = crate::problem::shipment::ShipmentBuilder::default();
        builder
            .set_external_id("s")
            .set_pickup(ShipmentLocation::new(0))
            .set_delivery(ShipmentLocation::new(1));
        let job = Job::from(builder.build().unwrap());

        let ids: Vec<ActivityId> = job.activity_ids(JobIdx::new(3)).collect();
        assert_eq!(
            ids,
            vec![
                ActivityId::ShipmentPickup(JobIdx::new(3)),
                ActivityId::ShipmentDelivery(JobIdx::new(3))
            ]
        );
        assert_eq!(ids[1].activity_offset(), 1);
        assert!(job.activity(ActivityId::Service(JobIdx::new(3))).is_none());
    }

    #[test]
    fn test_delivery_service_decreases_load() {
        let mut builder = ServiceBuilder::default();
        builder
            .set_external_id("s")
            .set_location_id(0)
            .set_demand(Capacity::from_vec(vec![3.0]));
        let job = Job::from(builder.build().unwrap());

        let activity = job.activity(ActivityId::Service(JobIdx::new(0))).unwrap();
        assert_eq!(activity.load_change(), Capacity::from_vec(vec![-3.0]));
        assert_eq!(job.kind(), JobKind::Service);
        assert!(job.owner_vehicle().is_none());
    }
}
