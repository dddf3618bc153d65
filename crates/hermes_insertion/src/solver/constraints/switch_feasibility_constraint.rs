use crate::solver::insertion::insertion_context::JobInsertionContext;

use super::constraint::HardRouteConstraint;

/// Rejects a vehicle that could not serve the current activities of the
/// route in time, whatever the new job.
pub struct SwitchFeasibilityConstraint;

impl HardRouteConstraint for SwitchFeasibilityConstraint {
    fn constraint_name(&self) -> &'static str {
        "vehicle_switch"
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        if !context.is_vehicle_switch() {
            return true;
        }
        context.route_id.is_none_or(|route_id| {
            !context
                .states
                .is_switch_not_feasible(route_id, context.vehicle_type)
        })
    }
}
