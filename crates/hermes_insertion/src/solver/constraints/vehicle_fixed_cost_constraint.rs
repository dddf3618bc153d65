use crate::{
    problem::travel_cost_matrix::Cost,
    solver::insertion::insertion_context::JobInsertionContext,
};

use super::constraint::SoftRouteConstraint;

/// Charges the fixed cost of the candidate vehicle, minus the fixed cost of
/// the vehicle it replaces.
pub struct VehicleFixedCostConstraint {
    weight: f64,
}

impl VehicleFixedCostConstraint {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

impl SoftRouteConstraint for VehicleFixedCostConstraint {
    fn constraint_name(&self) -> &'static str {
        "vehicle_fixed_cost"
    }

    fn cost(&self, context: &JobInsertionContext) -> Cost {
        let current = context
            .current_vehicle()
            .map_or(0.0, |vehicle| vehicle.costs().fixed);
        (context.vehicle.costs().fixed - current) * self.weight
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::vehicle::VehicleIdx,
        solver::solution::vehicle_route::VehicleRoute,
        test_utils::{self, InsertionFixture, TestService, TestVehicle},
    };

    use super::*;

    #[test]
    fn test_fixed_cost_difference() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(1), TestService::at(2)],
            vec![],
            vec![
                TestVehicle::at_depot(0).with_fixed_cost(100.0),
                TestVehicle::at_depot(0).with_type("big").with_fixed_cost(150.0),
            ],
        );
        let routes = vec![
            test_utils::create_route(&problem, VehicleIdx::new(0), &[0]),
            VehicleRoute::new(&problem, VehicleIdx::new(1)),
        ];
        let fixture = InsertionFixture::new(problem, routes);
        let constraint = VehicleFixedCostConstraint::new(0.5);

        assert_eq!(constraint.cost(&fixture.context(0, 1, 0)), 0.0);
        assert_eq!(constraint.cost(&fixture.context(0, 1, 1)), 25.0);
        assert_eq!(constraint.cost(&fixture.context(1, 1, 1)), 75.0);
    }
}
