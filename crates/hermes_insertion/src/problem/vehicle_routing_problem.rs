use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use jiff::{SignedDuration, Timestamp};

use crate::{error::ProblemError, utils::enumerate_idx::EnumerateIdx};

use super::{
    activity_costs::{ActivityCosts, WaitingTimeCosts},
    break_job::{Break, BreakDefinition, RelativeBreak},
    driver::{Driver, DriverIdx},
    fleet::{Fleet, FleetManager},
    job::{ActivityId, ActivityIdx, Job, JobActivity, JobIdx},
    location::{Location, LocationIdx},
    service::Service,
    shipment::Shipment,
    transport_costs::{MatrixTransportCosts, TransportCosts},
    travel_cost_matrix::{Cost, Distance},
    vehicle::{Vehicle, VehicleIdx, VehicleTypeIdx},
    vehicle_profile::VehicleProfile,
};

pub struct VehicleRoutingProblem {
    locations: Vec<Location>,
    vehicles: Vec<Vehicle>,
    drivers: Vec<Driver>,
    jobs: Vec<Job>,
    infinite_fleet: bool,
    transport_costs: Arc<dyn TransportCosts>,
    activity_costs: Arc<dyn ActivityCosts>,

    vehicle_types: Vec<VehicleTypeIdx>,
    vehicles_by_type: Vec<Vec<VehicleIdx>>,
    activity_offsets: Vec<ActivityIdx>,
    num_activities: usize,
    breaks_by_vehicle: Vec<Option<JobIdx>>,
}

impl VehicleRoutingProblem {
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, job_id: JobIdx) -> &Job {
        &self.jobs[job_id]
    }

    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: LocationIdx) -> &Location {
        &self.locations[location_id.get()]
    }

    pub fn transport_costs(&self) -> &dyn TransportCosts {
        self.transport_costs.as_ref()
    }

    pub fn activity_costs(&self) -> &dyn ActivityCosts {
        self.activity_costs.as_ref()
    }

    pub fn is_infinite_fleet(&self) -> bool {
        self.infinite_fleet
    }

    pub fn vehicle_type(&self, vehicle_id: VehicleIdx) -> VehicleTypeIdx {
        self.vehicle_types[vehicle_id.get()]
    }

    pub fn num_vehicle_types(&self) -> usize {
        self.vehicles_by_type.len()
    }

    /// First vehicle of the type. Vehicles of a type are interchangeable, so
    /// it stands in for the whole type in vehicle-dependent states.
    pub fn vehicle_type_representative(&self, vehicle_type: VehicleTypeIdx) -> VehicleIdx {
        self.vehicles_by_type[vehicle_type.get()][0]
    }

    pub fn create_fleet_manager(&self) -> FleetManager {
        FleetManager::new(
            self.vehicles_by_type.clone(),
            self.vehicle_types.clone(),
            self.infinite_fleet,
        )
    }

    /// Stable state-cache key of a job activity.
    pub fn activity_index(&self, activity_id: ActivityId) -> ActivityIdx {
        let offset = self.activity_offsets[activity_id.job_id().get()];
        ActivityIdx::new(offset.get() + activity_id.activity_offset())
    }

    pub fn num_activities(&self) -> usize {
        self.num_activities
    }

    pub fn job_activity(&self, activity_id: ActivityId) -> Option<JobActivity<'_>> {
        self.jobs
            .get(activity_id.job_id().get())
            .and_then(|job| job.activity(activity_id))
    }

    pub fn break_of_vehicle(&self, vehicle_id: VehicleIdx) -> Option<JobIdx> {
        self.breaks_by_vehicle[vehicle_id.get()]
    }

    pub fn break_jobs(&self) -> impl Iterator<Item = JobIdx> + '_ {
        self.breaks_by_vehicle.iter().flatten().copied()
    }

    /// Travel time between optional locations; a missing side costs nothing.
    pub fn transport_time(
        &self,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
        departure: Timestamp,
        driver_id: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> SignedDuration {
        match (from, to) {
            (Some(from), Some(to)) => {
                self.transport_costs
                    .transport_time(from, to, departure, driver_id, vehicle)
            }
            _ => SignedDuration::ZERO,
        }
    }

    pub fn backward_transport_time(
        &self,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
        arrival: Timestamp,
        driver_id: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> SignedDuration {
        match (from, to) {
            (Some(from), Some(to)) => self
                .transport_costs
                .backward_transport_time(from, to, arrival, driver_id, vehicle),
            _ => SignedDuration::ZERO,
        }
    }

    pub fn transport_cost(
        &self,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
        departure: Timestamp,
        driver_id: Option<DriverIdx>,
        vehicle: &Vehicle,
    ) -> Cost {
        match (from, to) {
            (Some(from), Some(to)) => {
                self.transport_costs
                    .transport_cost(from, to, departure, driver_id, vehicle)
            }
            _ => 0.0,
        }
    }

    pub fn distance(
        &self,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
        vehicle: &Vehicle,
    ) -> Distance {
        match (from, to) {
            (Some(from), Some(to)) => self.transport_costs.distance(from, to, vehicle),
            _ => 0.0,
        }
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    locations: Option<Vec<Location>>,
    services: Vec<Service>,
    shipments: Vec<Shipment>,
    fleet: Option<Fleet>,
    drivers: Vec<Driver>,
    vehicle_profiles: Vec<VehicleProfile>,
    transport_costs: Option<Arc<dyn TransportCosts>>,
    activity_costs: Option<Arc<dyn ActivityCosts>>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut VehicleRoutingProblemBuilder {
        self.locations = Some(locations);
        self
    }

    pub fn add_location(&mut self, location: Location) -> &mut VehicleRoutingProblemBuilder {
        self.locations.get_or_insert_with(Vec::new).push(location);
        self
    }

    pub fn set_services(&mut self, services: Vec<Service>) -> &mut VehicleRoutingProblemBuilder {
        self.services = services;
        self
    }

    pub fn add_service(&mut self, service: Service) -> &mut VehicleRoutingProblemBuilder {
        self.services.push(service);
        self
    }

    pub fn set_shipments(&mut self, shipments: Vec<Shipment>) -> &mut VehicleRoutingProblemBuilder {
        self.shipments = shipments;
        self
    }

    pub fn add_shipment(&mut self, shipment: Shipment) -> &mut VehicleRoutingProblemBuilder {
        self.shipments.push(shipment);
        self
    }

    pub fn set_fleet(&mut self, fleet: Fleet) -> &mut VehicleRoutingProblemBuilder {
        self.fleet = Some(fleet);
        self
    }

    pub fn set_drivers(&mut self, drivers: Vec<Driver>) -> &mut VehicleRoutingProblemBuilder {
        self.drivers = drivers;
        self
    }

    pub fn add_vehicle_profile(
        &mut self,
        profile: VehicleProfile,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.vehicle_profiles.push(profile);
        self
    }

    pub fn set_vehicle_profiles(
        &mut self,
        profiles: Vec<VehicleProfile>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.vehicle_profiles = profiles;
        self
    }

    /// Replaces the matrix based transport costs. Profiles are not required
    /// when a custom implementation is given.
    pub fn set_transport_costs(
        &mut self,
        transport_costs: Arc<dyn TransportCosts>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.transport_costs = Some(transport_costs);
        self
    }

    pub fn set_activity_costs(
        &mut self,
        activity_costs: Arc<dyn ActivityCosts>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.activity_costs = Some(activity_costs);
        self
    }

    pub fn build(self) -> Result<VehicleRoutingProblem, ProblemError> {
        let locations = self.locations.ok_or(ProblemError::MissingField {
            entity: "problem",
            field: "locations",
        })?;
        let (vehicles, infinite_fleet) = self.fleet.ok_or(ProblemError::NoVehicles)?.into_parts();
        if vehicles.is_empty() {
            return Err(ProblemError::NoVehicles);
        }

        let num_locations = locations.len();
        let check_location = |entity: &str, location: LocationIdx| {
            if location.get() >= num_locations {
                Err(ProblemError::UnknownLocation {
                    entity: entity.to_owned(),
                    location: location.get(),
                    num_locations,
                })
            } else {
                Ok(())
            }
        };

        for service in &self.services {
            check_location(service.external_id(), service.location_id())?;
        }
        for shipment in &self.shipments {
            check_location(shipment.external_id(), shipment.pickup().location_id())?;
            check_location(shipment.external_id(), shipment.delivery().location_id())?;
        }
        for vehicle in &vehicles {
            for location in [vehicle.depot_location_id(), vehicle.end_location_id()]
                .into_iter()
                .flatten()
            {
                check_location(vehicle.external_id(), location)?;
            }
            if let Some(BreakDefinition::Absolute {
                location_id: Some(location),
                ..
            }) = vehicle.break_definition()
            {
                check_location(vehicle.external_id(), LocationIdx::new(*location))?;
            }
        }

        let transport_costs = match self.transport_costs {
            Some(transport_costs) => transport_costs,
            None => {
                for vehicle in &vehicles {
                    if vehicle.profile_id().get() >= self.vehicle_profiles.len() {
                        return Err(ProblemError::UnknownProfile {
                            vehicle: vehicle.external_id().to_owned(),
                            profile: vehicle.profile_id().get(),
                        });
                    }
                }
                let costs = MatrixTransportCosts::new(self.vehicle_profiles);
                Arc::new(costs) as Arc<dyn TransportCosts>
            }
        };

        let (vehicle_types, vehicles_by_type) = group_vehicle_types(&vehicles)?;

        let mut jobs: Vec<Job> = self
            .services
            .into_iter()
            .map(Job::Service)
            .chain(self.shipments.into_iter().map(Job::Shipment))
            .collect();

        let mut breaks_by_vehicle = vec![None; vehicles.len()];
        for (vehicle_id, vehicle) in EnumerateIdx::<VehicleIdx>::enumerate_idx(vehicles.iter()) {
            if let Some(definition) = vehicle.break_definition() {
                breaks_by_vehicle[vehicle_id.get()] = Some(JobIdx::new(jobs.len()));
                jobs.push(create_break_job(vehicle_id, vehicle, definition));
            }
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for job in &jobs {
            if !seen.insert(job.external_id()) {
                return Err(ProblemError::DuplicateJob(job.external_id().to_owned()));
            }
        }

        let mut activity_offsets = Vec::with_capacity(jobs.len());
        let mut num_activities = 0;
        for job in &jobs {
            activity_offsets.push(ActivityIdx::new(num_activities));
            num_activities += job.activity_count();
        }

        Ok(VehicleRoutingProblem {
            locations,
            vehicles,
            drivers: self.drivers,
            jobs,
            infinite_fleet,
            transport_costs,
            activity_costs: self
                .activity_costs
                .unwrap_or_else(|| Arc::new(WaitingTimeCosts)),
            vehicle_types,
            vehicles_by_type,
            activity_offsets,
            num_activities,
            breaks_by_vehicle,
        })
    }
}

type VehicleTypes = (Vec<VehicleTypeIdx>, Vec<Vec<VehicleIdx>>);

fn group_vehicle_types(vehicles: &[Vehicle]) -> Result<VehicleTypes, ProblemError> {
    let mut type_ids = FxHashMap::default();
    let mut vehicle_types = Vec::with_capacity(vehicles.len());
    let mut vehicles_by_type: Vec<Vec<VehicleIdx>> = Vec::new();

    for (vehicle_id, vehicle) in vehicles.iter().enumerate_idx() {
        let next_type = VehicleTypeIdx::new(vehicles_by_type.len());
        let vehicle_type = *type_ids.entry(vehicle.type_key()).or_insert(next_type);
        if vehicle_type == next_type {
            vehicles_by_type.push(Vec::new());
        }
        vehicles_by_type[vehicle_type.get()].push(vehicle_id);
        vehicle_types.push(vehicle_type);
    }

    let mut first_of_type_id: FxHashMap<&str, &Vehicle> = FxHashMap::default();
    for vehicle in vehicles {
        let first = first_of_type_id.entry(vehicle.type_id()).or_insert(vehicle);
        if !first.is_consistent_with(vehicle) {
            return Err(ProblemError::InconsistentVehicleType(
                vehicle.type_id().to_owned(),
            ));
        }
    }

    Ok((vehicle_types, vehicles_by_type))
}

fn create_break_job(
    vehicle_id: VehicleIdx,
    vehicle: &Vehicle,
    definition: &BreakDefinition,
) -> Job {
    let external_id = format!("{}_break", vehicle.external_id());
    match definition {
        BreakDefinition::Absolute {
            time_windows,
            duration,
            location_id,
        } => Job::Break(Break::new(
            external_id,
            vehicle_id,
            time_windows.clone(),
            *duration,
            location_id.map(LocationIdx::new),
        )),
        BreakDefinition::Relative {
            earliest_offset,
            latest_offset,
            duration,
        } => Job::RelativeBreak(RelativeBreak::new(
            external_id,
            vehicle_id,
            *earliest_offset,
            *latest_offset,
            *duration,
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{
            capacity::Capacity, service::ServiceBuilder, shipment::ShipmentBuilder,
            shipment::ShipmentLocation, time_window::TimeWindow, travel_cost_matrix::TravelMatrices,
            vehicle::VehicleBuilder,
        },
        test_utils,
    };

    use super::*;

    fn vehicle(id: &str, type_id: &str, capacity: f64) -> Vehicle {
        let mut builder = VehicleBuilder::default();
        builder
            .set_vehicle_id(id)
            .set_type_id(type_id)
            .set_depot_location_id(0)
            .set_capacity(Capacity::from_vec(vec![capacity]));
        builder.build().unwrap()
    }

    fn builder_with(vehicles: Vec<Vehicle>) -> VehicleRoutingProblemBuilder {
        let locations = test_utils::create_location_grid(3, 3);
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_vehicle_profile(VehicleProfile::new(
                "car".to_owned(),
                TravelMatrices::from_euclidean(&locations),
            ))
            .set_locations(locations)
            .set_fleet(Fleet::Finite(vehicles));
        builder
    }

    #[test]
    fn test_vehicle_types_are_grouped() {
        let problem = builder_with(vec![
            vehicle("a", "small", 2.0),
            vehicle("b", "large", 5.0),
            vehicle("c", "small", 2.0),
        ])
        .build()
        .unwrap();

        assert_eq!(problem.num_vehicle_types(), 2);
        assert_eq!(
            problem.vehicle_type(VehicleIdx::new(0)),
            problem.vehicle_type(VehicleIdx::new(2))
        );
        assert_ne!(
            problem.vehicle_type(VehicleIdx::new(0)),
            problem.vehicle_type(VehicleIdx::new(1))
        );
    }

    #[test]
    fn test_inconsistent_vehicle_type() {
        let result = builder_with(vec![vehicle("a", "small", 2.0), vehicle("b", "small", 3.0)])
            .build();

        assert!(matches!(
            result,
            Err(ProblemError::InconsistentVehicleType(type_id)) if type_id == "small"
        ));
    }

    #[test]
    fn test_unknown_location() {
        let mut service = ServiceBuilder::default();
        service.set_external_id("far").set_location_id(42);
        let mut builder = builder_with(vec![vehicle("a", "default", 1.0)]);
        builder.add_service(service.build().unwrap());

        assert!(matches!(
            builder.build(),
            Err(ProblemError::UnknownLocation { location: 42, .. })
        ));
    }

    #[test]
    fn test_no_vehicles() {
        assert!(matches!(
            builder_with(vec![]).build(),
            Err(ProblemError::NoVehicles)
        ));
    }

    #[test]
    fn test_activity_indices_and_breaks() {
        let mut service = ServiceBuilder::default();
        service.set_external_id("s").set_location_id(1);
        let mut shipment = ShipmentBuilder::default();
        shipment
            .set_external_id("p")
            .set_pickup(ShipmentLocation::new(2))
            .set_delivery(ShipmentLocation::new(3));

        let mut with_break = VehicleBuilder::default();
        with_break
            .set_vehicle_id("v")
            .set_depot_location_id(0)
            .set_break(BreakDefinition::Absolute {
                time_windows: vec![TimeWindow::UNBOUNDED],
                duration: SignedDuration::from_mins(30),
                location_id: None,
            });

        let mut builder = builder_with(vec![with_break.build().unwrap()]);
        builder
            .add_service(service.build().unwrap())
            .add_shipment(shipment.build().unwrap());
        let problem = builder.build().unwrap();

        assert_eq!(problem.num_jobs(), 3);
        assert_eq!(problem.num_activities(), 4);
        assert_eq!(
            problem.activity_index(ActivityId::ShipmentDelivery(JobIdx::new(1))),
            ActivityIdx::new(2)
        );
        assert_eq!(
            problem.activity_index(ActivityId::Break(JobIdx::new(2))),
            ActivityIdx::new(3)
        );

        let break_id = problem.break_of_vehicle(VehicleIdx::new(0)).unwrap();
        assert_eq!(problem.job(break_id).external_id(), "v_break");
        assert_eq!(problem.job(break_id).owner_vehicle(), Some(VehicleIdx::new(0)));
    }

    #[test]
    fn test_duplicate_job() {
        let build_service = || {
            let mut service = ServiceBuilder::default();
            service.set_external_id("same").set_location_id(1);
            service.build().unwrap()
        };
        let mut builder = builder_with(vec![vehicle("a", "default", 1.0)]);
        builder.set_services(vec![build_service(), build_service()]);

        assert!(matches!(builder.build(), Err(ProblemError::DuplicateJob(_))));
    }
}
