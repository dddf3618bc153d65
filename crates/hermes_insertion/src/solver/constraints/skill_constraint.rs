use crate::solver::insertion::insertion_context::JobInsertionContext;

use super::constraint::HardRouteConstraint;

/// The vehicle must carry every skill of the job. When it would take over a
/// route, it must also carry the skills the route already requires.
pub struct SkillConstraint;

impl HardRouteConstraint for SkillConstraint {
    fn constraint_name(&self) -> &'static str {
        "skills"
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        if let Some(skills) = context.job.skills()
            && !context.vehicle.has_skills(skills)
        {
            return false;
        }

        if context.is_vehicle_switch()
            && let Some(route_id) = context.route_id
            && let Some(route_skills) = context.states.route_skills(route_id)
        {
            return context.vehicle.has_skills(route_skills);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::vehicle::VehicleIdx,
        test_utils::{self, InsertionFixture, TestService, TestVehicle},
    };

    use super::*;

    #[test]
    fn test_job_skills() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(1).with_skill("fridge")],
            vec![],
            vec![
                TestVehicle::at_depot(0).with_skill("fridge"),
                TestVehicle::at_depot(0).with_type("plain"),
            ],
        );
        let routes = vec![
            test_utils::create_route(&problem, VehicleIdx::new(0), &[]),
            test_utils::create_route(&problem, VehicleIdx::new(1), &[]),
        ];
        let fixture = InsertionFixture::new(problem, routes);

        assert!(SkillConstraint.fulfilled(&fixture.context(0, 0, 0)));
        assert!(!SkillConstraint.fulfilled(&fixture.context(1, 0, 1)));
    }

    #[test]
    fn test_route_skills_on_switch() {
        let problem = test_utils::create_test_problem(
            vec![TestService::at(1).with_skill("fridge"), TestService::at(2)],
            vec![],
            vec![
                TestVehicle::at_depot(0).with_skill("fridge"),
                TestVehicle::at_depot(0).with_type("plain"),
            ],
        );
        let route = test_utils::create_route(&problem, VehicleIdx::new(0), &[0]);
        let fixture = InsertionFixture::new(problem, vec![route]);

        assert!(SkillConstraint.fulfilled(&fixture.context(0, 1, 0)));
        assert!(!SkillConstraint.fulfilled(&fixture.context(0, 1, 1)));
    }
}
