use fxhash::FxHashSet;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{define_index_newtype, error::ProblemError};

use super::{
    break_job::BreakDefinition, capacity::Capacity, location::LocationIdx, skill::Skill,
    vehicle_profile::VehicleProfileIdx,
};

define_index_newtype!(VehicleIdx, Vehicle);
define_index_newtype!(VehicleTypeIdx);

pub const DEFAULT_VEHICLE_TYPE: &str = "default";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct VehicleCosts {
    pub fixed: f64,
    pub per_distance: f64,
    pub per_transport_second: f64,
    pub per_waiting_second: f64,
    pub per_service_second: f64,
}

impl Default for VehicleCosts {
    fn default() -> Self {
        Self {
            fixed: 0.0,
            per_distance: 1.0,
            per_transport_second: 0.0,
            per_waiting_second: 0.0,
            per_service_second: 0.0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VehicleShift {
    pub(crate) earliest_start: Option<Timestamp>,
    pub(crate) latest_end: Option<Timestamp>,
}

impl VehicleShift {
    pub fn new(earliest_start: Option<Timestamp>, latest_end: Option<Timestamp>) -> Self {
        Self {
            earliest_start,
            latest_end,
        }
    }

    pub fn earliest_start(&self) -> Option<Timestamp> {
        self.earliest_start
    }

    pub fn latest_end(&self) -> Option<Timestamp> {
        self.latest_end
    }
}

/// Vehicles with the same key are interchangeable: they share availability
/// and every vehicle-dependent state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct VehicleTypeKey {
    type_id: String,
    profile_id: VehicleProfileIdx,
    start_location_id: Option<LocationIdx>,
    end_location_id: Option<LocationIdx>,
    return_to_depot: bool,
    shift: VehicleShift,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    type_id: String,
    profile_id: VehicleProfileIdx,
    capacity: Capacity,
    skills: FxHashSet<Skill>,
    depot_location_id: Option<LocationIdx>,
    end_location_id: Option<LocationIdx>,
    return_to_depot: bool,
    shift: VehicleShift,
    maximum_activities: Option<usize>,
    costs: VehicleCosts,
    break_definition: Option<BreakDefinition>,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn profile_id(&self) -> VehicleProfileIdx {
        self.profile_id
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn depot_location_id(&self) -> Option<LocationIdx> {
        self.depot_location_id
    }

    /// Where the route ends, `None` for open routes.
    pub fn end_location_id(&self) -> Option<LocationIdx> {
        if self.return_to_depot {
            self.end_location_id.or(self.depot_location_id)
        } else {
            None
        }
    }

    pub fn should_return_to_depot(&self) -> bool {
        self.return_to_depot
    }

    pub fn shift(&self) -> &VehicleShift {
        &self.shift
    }

    pub fn earliest_start_time(&self) -> Timestamp {
        self.shift.earliest_start.unwrap_or(Timestamp::UNIX_EPOCH)
    }

    pub fn latest_end_time(&self) -> Timestamp {
        self.shift.latest_end.unwrap_or(Timestamp::MAX)
    }

    pub fn maximum_activities(&self) -> Option<usize> {
        self.maximum_activities
    }

    pub fn costs(&self) -> &VehicleCosts {
        &self.costs
    }

    pub fn break_definition(&self) -> Option<&BreakDefinition> {
        self.break_definition.as_ref()
    }

    pub fn has_skills<'a>(&self, required: impl IntoIterator<Item = &'a Skill>) -> bool {
        required.into_iter().all(|skill| self.skills.contains(skill))
    }

    pub(crate) fn type_key(&self) -> VehicleTypeKey {
        VehicleTypeKey {
            type_id: self.type_id.clone(),
            profile_id: self.profile_id,
            start_location_id: self.depot_location_id,
            end_location_id: self.end_location_id(),
            return_to_depot: self.return_to_depot,
            shift: self.shift,
        }
    }

    /// Vehicles sharing a type id must agree on everything that is not part
    /// of the type key.
    pub(crate) fn is_consistent_with(&self, other: &Vehicle) -> bool {
        self.capacity == other.capacity
            && self.skills == other.skills
            && self.costs == other.costs
            && self.maximum_activities == other.maximum_activities
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    type_id: Option<String>,
    profile_id: Option<usize>,
    capacity: Option<Capacity>,
    skills: FxHashSet<Skill>,
    depot_location_id: Option<usize>,
    end_location_id: Option<usize>,
    return_to_depot: Option<bool>,
    shift: Option<VehicleShift>,
    maximum_activities: Option<usize>,
    costs: Option<VehicleCosts>,
    break_definition: Option<BreakDefinition>,
}

impl VehicleBuilder {
    pub fn set_vehicle_id(&mut self, external_id: impl Into<String>) -> &mut VehicleBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_type_id(&mut self, type_id: impl Into<String>) -> &mut VehicleBuilder {
        self.type_id = Some(type_id.into());
        self
    }

    pub fn set_profile_id(&mut self, profile_id: usize) -> &mut VehicleBuilder {
        self.profile_id = Some(profile_id);
        self
    }

    pub fn set_capacity(&mut self, capacity: Capacity) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn add_skill(&mut self, skill: Skill) -> &mut VehicleBuilder {
        self.skills.insert(skill);
        self
    }

    pub fn set_depot_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.depot_location_id = Some(location_id);
        self
    }

    pub fn set_end_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.end_location_id = Some(location_id);
        self
    }

    pub fn set_return_to_depot(&mut self, return_to_depot: bool) -> &mut VehicleBuilder {
        self.return_to_depot = Some(return_to_depot);
        self
    }

    pub fn set_shift(&mut self, shift: VehicleShift) -> &mut VehicleBuilder {
        self.shift = Some(shift);
        self
    }

    pub fn set_maximum_activities(&mut self, maximum_activities: usize) -> &mut VehicleBuilder {
        self.maximum_activities = Some(maximum_activities);
        self
    }

    pub fn set_costs(&mut self, costs: VehicleCosts) -> &mut VehicleBuilder {
        self.costs = Some(costs);
        self
    }

    pub fn set_break(&mut self, break_definition: BreakDefinition) -> &mut VehicleBuilder {
        self.break_definition = Some(break_definition);
        self
    }

    pub fn build(self) -> Result<Vehicle, ProblemError> {
        let external_id = self.external_id.ok_or(ProblemError::MissingField {
            entity: "vehicle",
            field: "external_id",
        })?;

        if let Some(break_definition) = &self.break_definition
            && !break_definition.is_valid()
        {
            return Err(ProblemError::MalformedTimeWindow(format!(
                "{external_id}_break"
            )));
        }

        Ok(Vehicle {
            external_id,
            type_id: self
                .type_id
                .unwrap_or_else(|| DEFAULT_VEHICLE_TYPE.to_owned()),
            profile_id: VehicleProfileIdx::new(self.profile_id.unwrap_or(0)),
            capacity: self.capacity.unwrap_or_default(),
            skills: self.skills,
            depot_location_id: self.depot_location_id.map(LocationIdx::new),
            end_location_id: self.end_location_id.map(LocationIdx::new),
            return_to_depot: self.return_to_depot.unwrap_or(true),
            shift: self.shift.unwrap_or_default(),
            maximum_activities: self.maximum_activities,
            costs: self.costs.unwrap_or_default(),
            break_definition: self.break_definition,
        })
    }
}
