use fxhash::FxHashSet;
use jiff::SignedDuration;
use serde::Serialize;

use crate::error::ProblemError;

use super::{
    job::DEFAULT_PRIORITY,
    capacity::Capacity,
    location::LocationIdx,
    skill::Skill,
    time_window::{TimeWindow, TimeWindows},
};

#[derive(Serialize, Debug, Clone)]
pub struct ShipmentLocation {
    location_id: LocationIdx,
    duration: SignedDuration,
    setup_duration: SignedDuration,
    time_windows: TimeWindows,
}

impl ShipmentLocation {
    pub fn new(location_id: usize) -> Self {
        Self {
            location_id: LocationIdx::new(location_id),
            duration: SignedDuration::ZERO,
            setup_duration: SignedDuration::ZERO,
            time_windows: TimeWindows::new(),
        }
    }

    pub fn with_duration(mut self, duration: SignedDuration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_setup_duration(mut self, setup_duration: SignedDuration) -> Self {
        self.setup_duration = setup_duration;
        self
    }

    pub fn with_time_window(mut self, time_window: TimeWindow) -> Self {
        self.time_windows.push(time_window);
        self
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn setup_duration(&self) -> SignedDuration {
        self.setup_duration
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    pub fn has_time_windows(&self) -> bool {
        !self.time_windows.is_empty()
    }
}

/// A pickup and a delivery served by the same route, pickup first.
#[derive(Serialize, Debug, Clone)]
pub struct Shipment {
    external_id: String,
    demand: Capacity,
    pickup: ShipmentLocation,
    delivery: ShipmentLocation,
    skills: FxHashSet<Skill>,
    priority: u8,
    cross_route_dependency: bool,
}

impl Shipment {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn demand(&self) -> &Capacity {
        &self.demand
    }

    pub fn pickup(&self) -> &ShipmentLocation {
        &self.pickup
    }

    pub fn delivery(&self) -> &ShipmentLocation {
        &self.delivery
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn has_cross_route_dependency(&self) -> bool {
        self.cross_route_dependency
    }

    pub fn has_time_windows(&self) -> bool {
        self.pickup.has_time_windows() || self.delivery.has_time_windows()
    }
}

#[derive(Default)]
pub struct ShipmentBuilder {
    external_id: Option<String>,
    demand: Option<Capacity>,
    pickup: Option<ShipmentLocation>,
    delivery: Option<ShipmentLocation>,
    skills: FxHashSet<Skill>,
    priority: Option<u8>,
    cross_route_dependency: bool,
}

impl ShipmentBuilder {
    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut ShipmentBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_demand(&mut self, demand: Capacity) -> &mut ShipmentBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_pickup(&mut self, pickup: ShipmentLocation) -> &mut ShipmentBuilder {
        self.pickup = Some(pickup);
        self
    }

    pub fn set_delivery(&mut self, delivery: ShipmentLocation) -> &mut ShipmentBuilder {
        self.delivery = Some(delivery);
        self
    }

    pub fn add_skill(&mut self, skill: Skill) -> &mut ShipmentBuilder {
        self.skills.insert(skill);
        self
    }

    /// Between 1 (most urgent) and 10, defaults to 2.
    pub fn set_priority(&mut self, priority: u8) -> &mut ShipmentBuilder {
        self.priority = Some(priority);
        self
    }

    /// Marks the job as depending on routes other than the one it is
    /// inserted into, so its insertion costs are refreshed against every route.
    pub fn set_cross_route_dependency(&mut self, dependency: bool) -> &mut ShipmentBuilder {
        self.cross_route_dependency = dependency;
        self
    }

    pub fn build(self) -> Result<Shipment, ProblemError> {
        let external_id = self.external_id.ok_or(ProblemError::MissingField {
            entity: "shipment",
            field: "external_id",
        })?;
        let pickup = self.pickup.ok_or(ProblemError::MissingField {
            entity: "shipment",
            field: "pickup",
        })?;
        let delivery = self.delivery.ok_or(ProblemError::MissingField {
            entity: "shipment",
            field: "delivery",
        })?;

        let malformed = pickup
            .time_windows()
            .iter()
            .chain(delivery.time_windows())
            .any(|tw| !tw.is_valid());
        if malformed {
            return Err(ProblemError::MalformedTimeWindow(external_id));
        }

        let priority = self.priority.unwrap_or(DEFAULT_PRIORITY);
        if !(1..=10).contains(&priority) {
            return Err(ProblemError::InvalidPriority {
                job: external_id,
                priority,
            });
        }

        Ok(Shipment {
            external_id,
            demand: self.demand.unwrap_or_default(),
            pickup,
            delivery,
            skills: self.skills,
            priority,
            cross_route_dependency: self.cross_route_dependency,
        })
    }
}
