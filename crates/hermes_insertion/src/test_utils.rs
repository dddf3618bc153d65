use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};

use crate::problem::{
    break_job::BreakDefinition,
    capacity::Capacity,
    fleet::{Fleet, FleetManager},
    job::{ActivityId, JobIdx},
    location::Location,
    service::{ServiceBuilder, ServiceType},
    shipment::{ShipmentBuilder, ShipmentLocation},
    skill::Skill,
    time_window::TimeWindow,
    travel_cost_matrix::TravelMatrices,
    vehicle::{VehicleBuilder, VehicleCosts, VehicleIdx, VehicleShift},
    vehicle_profile::VehicleProfile,
    vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
};
use crate::solver::{
    constraints::constraint_manager::ConstraintManager,
    insertion::{
        activity_insertion_costs::LocalActivityInsertionCosts,
        feasibility::InsertionComponents,
        insertion_context::{InsertionScope, JobInsertionContext},
    },
    solution::{
        activity_factory::{ActivityFactory, DefaultActivityFactory, JobActivities},
        route_id::RouteIdx,
        schedule::update_route_schedule,
        tour_activity::TourActivity,
        vehicle_route::VehicleRoute,
    },
    state::{state_cache::StateCache, state_manager::StateManager},
};

/// Core constraints, local activity costs and the default activity factory.
pub fn insertion_components() -> InsertionComponents {
    InsertionComponents {
        constraints: Arc::new(ConstraintManager::with_core_constraints(1.0)),
        activity_costs: Arc::new(LocalActivityInsertionCosts::default()),
        activity_factory: Arc::new(DefaultActivityFactory),
    }
}

pub fn timestamp(seconds: i64) -> Timestamp {
    Timestamp::UNIX_EPOCH + SignedDuration::from_secs(seconds)
}

fn time_window(start: i64, end: i64) -> TimeWindow {
    TimeWindow::new(Some(timestamp(start)), Some(timestamp(end)))
}

/// Location `i` is at `(i % cols, i / cols)`.
pub fn create_location_grid(rows: usize, cols: usize) -> Vec<Location> {
    let mut locations = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            locations.push(Location::from_cartesian(x as f64, y as f64));
        }
    }

    locations
}

pub fn create_locations(points: &[(f64, f64)]) -> Vec<Location> {
    points
        .iter()
        .map(|&(x, y)| Location::from_cartesian(x, y))
        .collect()
}

pub struct TestService {
    id: Option<String>,
    location: usize,
    demand: f64,
    time_windows: Vec<TimeWindow>,
    duration: i64,
    setup: i64,
    service_type: ServiceType,
    priority: Option<u8>,
    skills: Vec<&'static str>,
    cross_route_dependency: bool,
}

impl TestService {
    pub fn at(location: usize) -> Self {
        Self {
            id: None,
            location,
            demand: 0.0,
            time_windows: Vec::new(),
            duration: 0,
            setup: 0,
            service_type: ServiceType::Delivery,
            priority: None,
            skills: Vec::new(),
            cross_route_dependency: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    pub fn with_demand(mut self, demand: f64) -> Self {
        self.demand = demand;
        self
    }

    pub fn with_time_window(mut self, start: i64, end: i64) -> Self {
        self.time_windows.push(time_window(start, end));
        self
    }

    pub fn with_duration(mut self, seconds: i64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_setup(mut self, seconds: i64) -> Self {
        self.setup = seconds;
        self
    }

    pub fn pickup(mut self) -> Self {
        self.service_type = ServiceType::Pickup;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_skill(mut self, skill: &'static str) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn with_cross_route_dependency(mut self) -> Self {
        self.cross_route_dependency = true;
        self
    }
}

pub struct TestShipment {
    pickup: usize,
    delivery: usize,
    demand: f64,
    pickup_window: Option<TimeWindow>,
    delivery_window: Option<TimeWindow>,
}

impl TestShipment {
    pub fn between(pickup: usize, delivery: usize) -> Self {
        Self {
            pickup,
            delivery,
            demand: 0.0,
            pickup_window: None,
            delivery_window: None,
        }
    }

    pub fn with_demand(mut self, demand: f64) -> Self {
        self.demand = demand;
        self
    }

    pub fn with_pickup_window(mut self, start: i64, end: i64) -> Self {
        self.pickup_window = Some(time_window(start, end));
        self
    }

    pub fn with_delivery_window(mut self, start: i64, end: i64) -> Self {
        self.delivery_window = Some(time_window(start, end));
        self
    }
}

pub struct TestVehicle {
    depot: usize,
    capacity: Option<f64>,
    type_id: Option<&'static str>,
    shift: Option<(i64, i64)>,
    fixed_cost: f64,
    return_to_depot: bool,
    skills: Vec<&'static str>,
    maximum_activities: Option<usize>,
    break_definition: Option<BreakDefinition>,
}

impl TestVehicle {
    pub fn at_depot(depot: usize) -> Self {
        Self {
            depot,
            capacity: None,
            type_id: None,
            shift: None,
            fixed_cost: 0.0,
            return_to_depot: true,
            skills: Vec::new(),
            maximum_activities: None,
            break_definition: None,
        }
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_type(mut self, type_id: &'static str) -> Self {
        self.type_id = Some(type_id);
        self
    }

    pub fn with_shift(mut self, start: i64, end: i64) -> Self {
        self.shift = Some((start, end));
        self
    }

    pub fn with_fixed_cost(mut self, fixed_cost: f64) -> Self {
        self.fixed_cost = fixed_cost;
        self
    }

    pub fn open(mut self) -> Self {
        self.return_to_depot = false;
        self
    }

    pub fn with_skill(mut self, skill: &'static str) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn with_maximum_activities(mut self, maximum_activities: usize) -> Self {
        self.maximum_activities = Some(maximum_activities);
        self
    }

    /// Break at a fixed location within `[start, end]`.
    pub fn with_break(
        mut self,
        start: i64,
        end: i64,
        duration: i64,
        location: Option<usize>,
    ) -> Self {
        self.break_definition = Some(BreakDefinition::Absolute {
            time_windows: vec![time_window(start, end)],
            duration: SignedDuration::from_secs(duration),
            location_id: location,
        });
        self
    }

    pub fn with_relative_break(mut self, earliest: i64, latest: i64, duration: i64) -> Self {
        self.break_definition = Some(BreakDefinition::Relative {
            earliest_offset: SignedDuration::from_secs(earliest),
            latest_offset: SignedDuration::from_secs(latest),
            duration: SignedDuration::from_secs(duration),
        });
        self
    }
}

/// Problem on a 10x10 grid: location `i < 10` sits at `(i, 0)`. Travel time
/// in seconds equals the euclidean distance and only distance is charged.
pub fn create_test_problem(
    services: Vec<TestService>,
    shipments: Vec<TestShipment>,
    vehicles: Vec<TestVehicle>,
) -> VehicleRoutingProblem {
    build_test_problem(create_location_grid(10, 10), services, shipments, vehicles, false)
}

pub fn build_test_problem(
    locations: Vec<Location>,
    services: Vec<TestService>,
    shipments: Vec<TestShipment>,
    vehicles: Vec<TestVehicle>,
    infinite: bool,
) -> VehicleRoutingProblem {
    let services = services
        .into_iter()
        .enumerate()
        .map(|(index, service)| {
            let mut builder = ServiceBuilder::default();
            builder
                .set_external_id(service.id.unwrap_or_else(|| format!("s{index}")))
                .set_location_id(service.location)
                .set_demand(Capacity::from_vec(vec![service.demand]))
                .set_duration(SignedDuration::from_secs(service.duration))
                .set_setup_duration(SignedDuration::from_secs(service.setup))
                .set_service_type(service.service_type)
                .set_time_windows(service.time_windows)
                .set_cross_route_dependency(service.cross_route_dependency);
            if let Some(priority) = service.priority {
                builder.set_priority(priority);
            }
            for skill in service.skills {
                builder.add_skill(Skill::new(skill));
            }
            builder.build().unwrap()
        })
        .collect();

    let shipments = shipments
        .into_iter()
        .enumerate()
        .map(|(index, shipment)| {
            let mut pickup = ShipmentLocation::new(shipment.pickup);
            if let Some(window) = shipment.pickup_window {
                pickup = pickup.with_time_window(window);
            }
            let mut delivery = ShipmentLocation::new(shipment.delivery);
            if let Some(window) = shipment.delivery_window {
                delivery = delivery.with_time_window(window);
            }
            let mut builder = ShipmentBuilder::default();
            builder
                .set_external_id(format!("p{index}"))
                .set_demand(Capacity::from_vec(vec![shipment.demand]))
                .set_pickup(pickup)
                .set_delivery(delivery);
            builder.build().unwrap()
        })
        .collect();

    let vehicles = vehicles
        .into_iter()
        .enumerate()
        .map(|(index, vehicle)| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_vehicle_id(format!("v{index}"))
                .set_depot_location_id(vehicle.depot)
                .set_return_to_depot(vehicle.return_to_depot)
                .set_costs(VehicleCosts {
                    fixed: vehicle.fixed_cost,
                    ..VehicleCosts::default()
                });
            if let Some(capacity) = vehicle.capacity {
                builder.set_capacity(Capacity::from_vec(vec![capacity]));
            }
            if let Some(type_id) = vehicle.type_id {
                builder.set_type_id(type_id);
            }
            if let Some((start, end)) = vehicle.shift {
                builder.set_shift(VehicleShift::new(Some(timestamp(start)), Some(timestamp(end))));
            }
            if let Some(maximum_activities) = vehicle.maximum_activities {
                builder.set_maximum_activities(maximum_activities);
            }
            if let Some(break_definition) = vehicle.break_definition {
                builder.set_break(break_definition);
            }
            for skill in vehicle.skills {
                builder.add_skill(Skill::new(skill));
            }
            builder.build().unwrap()
        })
        .collect();

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .add_vehicle_profile(VehicleProfile::new(
            "default".to_owned(),
            TravelMatrices::from_euclidean(&locations),
        ))
        .set_locations(locations)
        .set_services(services)
        .set_shipments(shipments)
        .set_fleet(if infinite {
            Fleet::Infinite(vehicles)
        } else {
            Fleet::Finite(vehicles)
        });
    builder.build().unwrap()
}

/// Activities of `job_id` bound to their first time window.
pub fn create_activities(problem: &VehicleRoutingProblem, job_id: JobIdx) -> JobActivities {
    let mut activities = DefaultActivityFactory.create_activities(problem, job_id);
    for activity in activities.iter_mut() {
        let window = activity
            .activity_id()
            .and_then(|id| problem.job_activity(id))
            .and_then(|job_activity| {
                job_activity
                    .time_windows(Timestamp::UNIX_EPOCH)
                    .first()
                    .copied()
            })
            .unwrap_or(TimeWindow::UNBOUNDED);
        activity.set_time_window(window);
    }
    activities
}

pub fn create_activity(problem: &VehicleRoutingProblem, job_id: JobIdx) -> TourActivity {
    create_activities(problem, job_id).remove(0)
}

fn job_tour_activity(problem: &VehicleRoutingProblem, activity_id: ActivityId) -> TourActivity {
    create_activities(problem, activity_id.job_id())
        .into_iter()
        .find(|activity| activity.activity_id() == Some(activity_id))
        .unwrap()
}

/// Route serving every activity of `jobs`, in order, scheduled.
pub fn create_route(
    problem: &VehicleRoutingProblem,
    vehicle_id: VehicleIdx,
    jobs: &[usize],
) -> VehicleRoute {
    let activity_ids: Vec<ActivityId> = jobs
        .iter()
        .flat_map(|&job| {
            let job_id = JobIdx::new(job);
            problem.job(job_id).activity_ids(job_id)
        })
        .collect();
    create_route_with_activities(problem, vehicle_id, &activity_ids)
}

pub fn create_route_with_activities(
    problem: &VehicleRoutingProblem,
    vehicle_id: VehicleIdx,
    activity_ids: &[ActivityId],
) -> VehicleRoute {
    let mut route = VehicleRoute::new(problem, vehicle_id);
    for &activity_id in activity_ids {
        let index = route.len();
        route.insert_activity(index, job_tour_activity(problem, activity_id));
    }
    if !problem.vehicle(vehicle_id).should_return_to_depot() && !route.is_empty() {
        let last_location = route.last_location_id();
        route.end_mut().set_location_id(last_location);
    }
    update_route_schedule(problem, &mut route);
    route
}

/// Routes with up to date states and a fleet where the vehicles of the
/// non-empty routes are taken.
pub struct InsertionFixture {
    pub problem: VehicleRoutingProblem,
    pub routes: Vec<VehicleRoute>,
    pub states: StateCache,
    pub fleet: FleetManager,
}

impl InsertionFixture {
    pub fn new(problem: VehicleRoutingProblem, routes: Vec<VehicleRoute>) -> Self {
        let mut manager = StateManager::new(&problem);
        manager.update_all(&problem, &routes);
        let mut fleet = problem.create_fleet_manager();
        for route in routes.iter().filter(|route| !route.is_empty()) {
            if let Some(vehicle_id) = route.vehicle_id() {
                fleet.lock(vehicle_id);
            }
        }
        Self {
            states: manager.states().clone(),
            problem,
            routes,
            fleet,
        }
    }

    pub fn scope(&self) -> InsertionScope<'_> {
        InsertionScope {
            problem: &self.problem,
            states: &self.states,
            fleet: &self.fleet,
            completeness_ratio: 1.0,
            vehicle_switch_allowed: true,
        }
    }

    /// Context of `job` on `route` served by `vehicle`.
    pub fn context(&self, route: usize, job: usize, vehicle: usize) -> JobInsertionContext<'_> {
        let vehicle_id = VehicleIdx::new(vehicle);
        let route_ref = &self.routes[route];
        let departure_time = if route_ref.vehicle_id() == Some(vehicle_id) {
            route_ref.departure_time()
        } else {
            self.problem.vehicle(vehicle_id).earliest_start_time()
        };
        JobInsertionContext::new(
            &self.scope(),
            Some(RouteIdx::new(route)),
            route_ref,
            JobIdx::new(job),
            vehicle_id,
            None,
            departure_time,
        )
    }

    pub fn activity(&self, job: usize) -> TourActivity {
        create_activity(&self.problem, JobIdx::new(job))
    }
}
