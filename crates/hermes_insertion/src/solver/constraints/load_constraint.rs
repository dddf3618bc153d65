use jiff::Timestamp;

use crate::{
    problem::{
        job::{ActivityId, Job},
        service::ServiceType,
    },
    solver::{
        insertion::insertion_context::JobInsertionContext, solution::tour_activity::TourActivity,
    },
};

use super::constraint::{
    ConstraintPriority, ConstraintStatus, HardActivityConstraint, HardRouteConstraint,
};

const CAPACITY: &str = "capacity";

/// Capacity checks that only depend on the route totals.
pub struct LoadRouteConstraint;

impl HardRouteConstraint for LoadRouteConstraint {
    fn constraint_name(&self) -> &'static str {
        CAPACITY
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        let capacity = context.vehicle.capacity();

        if context.is_vehicle_switch() && !context.route_max_load().is_less_or_equal(capacity) {
            return false;
        }

        match context.job {
            Job::Service(service) => {
                let load = match service.service_type() {
                    ServiceType::Delivery => context.route_load_at_beginning(),
                    ServiceType::Pickup => context.route_load_at_end(),
                };
                (load + service.demand()).is_less_or_equal(capacity)
            }
            Job::Shipment(shipment) => shipment.demand().is_less_or_equal(capacity),
            Job::Break(_) | Job::RelativeBreak(_) => true,
        }
    }
}

/// Services change the load of a whole prefix or suffix of the route:
/// deliveries are on board from the Start, pickups until the End.
pub struct ServiceLoadConstraint;

impl HardActivityConstraint for ServiceLoadConstraint {
    fn constraint_name(&self) -> &'static str {
        CAPACITY
    }

    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Low
    }

    fn fulfilled(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        _next: &TourActivity,
        _prev_departure: Timestamp,
    ) -> ConstraintStatus {
        let Some(ActivityId::Service(job_id)) = new.activity_id() else {
            return ConstraintStatus::Fulfilled;
        };
        let Job::Service(service) = context.problem.job(job_id) else {
            return ConstraintStatus::Fulfilled;
        };
        let capacity = context.vehicle.capacity();
        let states = context.states;

        match service.service_type() {
            ServiceType::Pickup => {
                let future_max = states.future_max_load_at(context.route_id, prev);
                if (future_max + service.demand()).is_less_or_equal(capacity) {
                    ConstraintStatus::Fulfilled
                } else {
                    ConstraintStatus::NotFulfilled
                }
            }
            ServiceType::Delivery => {
                let past_max = states.past_max_load_at(context.route_id, prev);
                if (past_max + service.demand()).is_less_or_equal(capacity) {
                    ConstraintStatus::Fulfilled
                } else {
                    ConstraintStatus::NotFulfilledBreak
                }
            }
        }
    }
}

/// Shipments add their demand between pickup and delivery only.
pub struct ShipmentLoadConstraint;

impl HardActivityConstraint for ShipmentLoadConstraint {
    fn constraint_name(&self) -> &'static str {
        CAPACITY
    }

    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }

    fn fulfilled(
        &self,
        context: &JobInsertionContext,
        prev: &TourActivity,
        new: &TourActivity,
        _next: &TourActivity,
        _prev_departure: Timestamp,
    ) -> ConstraintStatus {
        let (job_id, is_pickup) = match new.activity_id() {
            Some(ActivityId::ShipmentPickup(job_id)) => (job_id, true),
            Some(ActivityId::ShipmentDelivery(job_id)) => (job_id, false),
            _ => return ConstraintStatus::Fulfilled,
        };

        // The pickup was just placed in front of the delivery.
        if !is_pickup && prev.activity_id() == Some(ActivityId::ShipmentPickup(job_id)) {
            return ConstraintStatus::Fulfilled;
        }

        let capacity = context.vehicle.capacity();
        let demand = context.problem.job(job_id).demand();
        let load = context.states.load_after(context.route_id, prev);

        if (load + demand).is_less_or_equal(capacity) {
            ConstraintStatus::Fulfilled
        } else if is_pickup {
            ConstraintStatus::NotFulfilled
        } else {
            ConstraintStatus::NotFulfilledBreak
        }
    }
}
