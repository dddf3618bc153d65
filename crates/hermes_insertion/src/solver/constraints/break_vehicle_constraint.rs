use crate::solver::insertion::insertion_context::JobInsertionContext;

use super::constraint::HardRouteConstraint;

/// A break can only be taken by the vehicle it belongs to.
pub struct BreakVehicleConstraint;

impl HardRouteConstraint for BreakVehicleConstraint {
    fn constraint_name(&self) -> &'static str {
        "break_vehicle"
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        context
            .job
            .owner_vehicle()
            .is_none_or(|owner| owner == context.vehicle_id)
    }
}
