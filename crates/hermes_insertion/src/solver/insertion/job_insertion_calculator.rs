use std::sync::Arc;

use jiff::Timestamp;
use smallvec::{SmallVec, smallvec};

use crate::{
    error::InsertionError,
    problem::{
        driver::DriverIdx,
        job::{Job, JobIdx},
        travel_cost_matrix::Cost,
        vehicle::VehicleIdx,
    },
    solver::{
        constraints::constraint_manager::ConstraintManager,
        solution::{
            activity_factory::ActivityFactory, route_id::RouteIdx, vehicle_route::VehicleRoute,
        },
    },
};

use super::{
    activity_insertion_costs::ActivityInsertionCostsCalculator,
    break_insertion::BreakInsertionCalculator,
    feasibility::{InsertionComponents, JobInsertionCalculator},
    insertion_context::{InsertionScope, JobInsertionContext},
    insertion_data::InsertionData,
    service_insertion::ServiceInsertionCalculator,
    shipment_insertion::ShipmentInsertionCalculator,
};

/// One evaluation: a job against a route, with the vehicle, departure and
/// driver left to the calculator when unset.
#[derive(Clone, Copy)]
pub struct InsertionRequest<'a> {
    pub route_id: Option<RouteIdx>,
    pub route: &'a VehicleRoute,
    pub job_id: JobIdx,
    pub vehicle_id: Option<VehicleIdx>,
    pub departure_time: Option<Timestamp>,
    pub driver_id: Option<DriverIdx>,
}

impl<'a> InsertionRequest<'a> {
    pub fn new(route_id: Option<RouteIdx>, route: &'a VehicleRoute, job_id: JobIdx) -> Self {
        Self {
            route_id,
            route,
            job_id,
            vehicle_id: None,
            departure_time: None,
            driver_id: None,
        }
    }

    pub fn with_vehicle(mut self, vehicle_id: VehicleIdx) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }

    pub fn with_departure_time(mut self, departure_time: Timestamp) -> Self {
        self.departure_time = Some(departure_time);
        self
    }

    pub fn with_driver(mut self, driver_id: DriverIdx) -> Self {
        self.driver_id = Some(driver_id);
        self
    }
}

/// Picks the candidate vehicles of a request and dispatches the job to the
/// calculator of its kind.
pub struct JobInsertionCostsCalculator {
    services: ServiceInsertionCalculator,
    shipments: ShipmentInsertionCalculator,
    breaks: BreakInsertionCalculator,
}

impl JobInsertionCostsCalculator {
    pub fn new(
        constraints: Arc<ConstraintManager>,
        activity_costs: Arc<dyn ActivityInsertionCostsCalculator>,
        activity_factory: Arc<dyn ActivityFactory>,
    ) -> Self {
        let components = InsertionComponents {
            constraints,
            activity_costs,
            activity_factory,
        };
        Self {
            services: ServiceInsertionCalculator::new(components.clone()),
            shipments: ShipmentInsertionCalculator::new(components.clone()),
            breaks: BreakInsertionCalculator::new(components),
        }
    }

    fn calculator(&self, job: &Job) -> &dyn JobInsertionCalculator {
        match job {
            Job::Service(_) => &self.services,
            Job::Shipment(_) => &self.shipments,
            Job::Break(_) | Job::RelativeBreak(_) => &self.breaks,
        }
    }

    fn candidate_vehicles(
        scope: &InsertionScope,
        request: &InsertionRequest,
    ) -> SmallVec<[VehicleIdx; 4]> {
        if let Some(vehicle_id) = request.vehicle_id {
            return smallvec![vehicle_id];
        }
        match request.route.vehicle_id() {
            Some(current) if !request.route.is_empty() => {
                let mut vehicles: SmallVec<[VehicleIdx; 4]> = smallvec![current];
                if scope.vehicle_switch_allowed {
                    vehicles.extend(scope.fleet.available_vehicles_except_type_of(current));
                }
                vehicles
            }
            _ => scope.fleet.available_vehicles().into_iter().collect(),
        }
    }

    /// Cheapest insertion over the candidate vehicles, strictly below
    /// `best_known`. The failed constraints of every vehicle are merged.
    pub fn evaluate(
        &self,
        scope: &InsertionScope,
        request: &InsertionRequest,
        best_known: Cost,
    ) -> Result<InsertionData, InsertionError> {
        let calculator = self.calculator(scope.problem.job(request.job_id));
        let route = request.route;

        let mut best_cost = best_known;
        let mut best: Option<InsertionData> = None;
        let mut failed: Vec<&'static str> = Vec::new();

        for vehicle_id in Self::candidate_vehicles(scope, request) {
            let same_vehicle = route.vehicle_id() == Some(vehicle_id);
            let departure_time = match request.departure_time {
                Some(departure_time) => departure_time,
                None if same_vehicle => route.departure_time(),
                None => scope.problem.vehicle(vehicle_id).earliest_start_time(),
            };
            let driver_id = request
                .driver_id
                .or_else(|| same_vehicle.then(|| route.driver_id()).flatten());

            let context = JobInsertionContext::new(
                scope,
                request.route_id,
                route,
                request.job_id,
                vehicle_id,
                driver_id,
                departure_time,
            );
            let data = calculator.calculate(&context, best_cost)?;
            for &name in &data.failed_constraints {
                if !failed.contains(&name) {
                    failed.push(name);
                }
            }
            if data.is_feasible() && data.cost < best_cost {
                best_cost = data.cost;
                best = Some(data);
            }
        }

        Ok(match best {
            Some(mut data) => {
                data.add_failed_constraints(failed);
                data
            }
            None => InsertionData::no_insertion_found(failed),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::vehicle_routing_problem::VehicleRoutingProblem,
        solver::{
            insertion::activity_insertion_costs::LocalActivityInsertionCosts,
            solution::activity_factory::DefaultActivityFactory,
        },
        test_utils::{self, InsertionFixture, TestService, TestVehicle},
    };

    use super::*;

    fn calculator() -> JobInsertionCostsCalculator {
        JobInsertionCostsCalculator::new(
            Arc::new(ConstraintManager::with_core_constraints(1.0)),
            Arc::new(LocalActivityInsertionCosts::default()),
            Arc::new(DefaultActivityFactory),
        )
    }

    fn two_depots() -> VehicleRoutingProblem {
        test_utils::create_test_problem(
            vec![TestService::at(6)],
            vec![],
            vec![
                TestVehicle::at_depot(0).with_type("far"),
                TestVehicle::at_depot(5).with_type("near"),
            ],
        )
    }

    #[test]
    fn test_empty_route_tries_every_vehicle_type() {
        let fixture = InsertionFixture::new(two_depots(), vec![VehicleRoute::empty()]);
        let request = InsertionRequest::new(None, &fixture.routes[0], JobIdx::new(0));

        let data = calculator()
            .evaluate(&fixture.scope(), &request, Cost::MAX)
            .unwrap();

        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(1)));
        assert_eq!(data.cost, 2.0);
    }

    #[test]
    fn test_requested_vehicle_only() {
        let fixture = InsertionFixture::new(two_depots(), vec![VehicleRoute::empty()]);
        let request = InsertionRequest::new(None, &fixture.routes[0], JobIdx::new(0))
            .with_vehicle(VehicleIdx::new(0));

        let data = calculator()
            .evaluate(&fixture.scope(), &request, Cost::MAX)
            .unwrap();

        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(0)));
        assert_eq!(data.cost, 12.0);
        assert_eq!(data.departure_time, test_utils::timestamp(0));
    }

    #[test]
    fn test_best_known_prunes_every_vehicle() {
        let fixture = InsertionFixture::new(two_depots(), vec![VehicleRoute::empty()]);
        let request = InsertionRequest::new(None, &fixture.routes[0], JobIdx::new(0));

        let data = calculator()
            .evaluate(&fixture.scope(), &request, 2.0)
            .unwrap();

        assert!(!data.is_feasible());
        assert!(data.failed_constraints.is_empty());
    }

    #[test]
    fn test_switch_to_larger_vehicle_type() {
        let problem = test_utils::create_test_problem(
            vec![
                TestService::at(2).with_demand(1.0),
                TestService::at(3).with_demand(1.0),
            ],
            vec![],
            vec![
                TestVehicle::at_depot(0).with_type("small").with_capacity(1.0),
                TestVehicle::at_depot(0).with_type("big").with_capacity(5.0),
            ],
        );
        let route = test_utils::create_route(&problem, VehicleIdx::new(0), &[0]);
        let fixture = InsertionFixture::new(problem, vec![route]);
        let request =
            InsertionRequest::new(Some(RouteIdx::new(0)), &fixture.routes[0], JobIdx::new(1));

        let data = calculator()
            .evaluate(&fixture.scope(), &request, Cost::MAX)
            .unwrap();

        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(1)));
        assert_eq!(data.cost, 2.0);
        assert_eq!(data.failed_constraints, vec!["capacity"]);

        let pinned = InsertionScope {
            vehicle_switch_allowed: false,
            ..fixture.scope()
        };
        let data = calculator().evaluate(&pinned, &request, Cost::MAX).unwrap();

        assert!(!data.is_feasible());
        assert_eq!(data.failed_constraints, vec!["capacity"]);
    }
}
