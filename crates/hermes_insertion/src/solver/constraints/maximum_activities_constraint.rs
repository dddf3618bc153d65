use crate::solver::insertion::insertion_context::JobInsertionContext;

use super::constraint::HardRouteConstraint;

pub struct MaximumActivitiesConstraint;

impl HardRouteConstraint for MaximumActivitiesConstraint {
    fn constraint_name(&self) -> &'static str {
        "maximum_activities"
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        context
            .vehicle
            .maximum_activities()
            .is_none_or(|maximum| context.route.len() + context.job.activity_count() <= maximum)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::vehicle::VehicleIdx,
        test_utils::{self, InsertionFixture, TestService, TestShipment, TestVehicle},
    };

    use super::*;

    #[test]
    fn test_maximum_activities() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(1), TestService::at(2)],
            vec![TestShipment::between(3, 4)],
            vec![TestVehicle::at_depot(0).with_maximum_activities(2)],
        );
        let route = test_utils::create_route(&problem, VehicleIdx::new(0), &[0]);
        let fixture = InsertionFixture::new(problem, vec![route]);

        assert!(MaximumActivitiesConstraint.fulfilled(&fixture.context(0, 1, 0)));
        assert!(!MaximumActivitiesConstraint.fulfilled(&fixture.context(0, 2, 0)));
    }
}
