use fxhash::FxHashSet;
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::error::ProblemError;

use super::{
    job::DEFAULT_PRIORITY,
    capacity::Capacity,
    location::LocationIdx,
    skill::Skill,
    time_window::{TimeWindow, TimeWindows},
};

#[derive(Deserialize, Serialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ServiceType {
    Pickup,
    #[default]
    Delivery,
}

#[derive(Serialize, Debug, Clone)]
pub struct Service {
    external_id: String,
    location_id: LocationIdx,
    time_windows: TimeWindows,
    demand: Capacity,
    duration: SignedDuration,
    setup_duration: SignedDuration,
    service_type: ServiceType,
    skills: FxHashSet<Skill>,
    priority: u8,
    cross_route_dependency: bool,
}

impl Service {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn demand(&self) -> &Capacity {
        &self.demand
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn setup_duration(&self) -> SignedDuration {
        self.setup_duration
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
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
        self.time_windows.iter().any(|tw| !tw.is_empty())
    }
}

#[derive(Default)]
pub struct ServiceBuilder {
    external_id: Option<String>,
    location_id: Option<usize>,
    time_windows: Vec<TimeWindow>,
    demand: Option<Capacity>,
    duration: Option<SignedDuration>,
    setup_duration: Option<SignedDuration>,
    service_type: Option<ServiceType>,
    skills: FxHashSet<Skill>,
    priority: Option<u8>,
    cross_route_dependency: bool,
}

impl ServiceBuilder {
    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut ServiceBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_location_id(&mut self, location_id: usize) -> &mut ServiceBuilder {
        self.location_id = Some(location_id);
        self
    }

    pub fn add_time_window(&mut self, time_window: TimeWindow) -> &mut ServiceBuilder {
        self.time_windows.push(time_window);
        self
    }

    pub fn set_time_windows(&mut self, time_windows: Vec<TimeWindow>) -> &mut ServiceBuilder {
        self.time_windows = time_windows;
        self
    }

    pub fn set_demand(&mut self, demand: Capacity) -> &mut ServiceBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_duration(&mut self, duration: SignedDuration) -> &mut ServiceBuilder {
        self.duration = Some(duration);
        self
    }

    pub fn set_setup_duration(&mut self, setup_duration: SignedDuration) -> &mut ServiceBuilder {
        self.setup_duration = Some(setup_duration);
        self
    }

    pub fn set_service_type(&mut self, service_type: ServiceType) -> &mut ServiceBuilder {
        self.service_type = Some(service_type);
        self
    }

    pub fn add_skill(&mut self, skill: Skill) -> &mut ServiceBuilder {
        self.skills.insert(skill);
        self
    }

    /// Between 1 (most urgent) and 10, defaults to 2.
    pub fn set_priority(&mut self, priority: u8) -> &mut ServiceBuilder {
        self.priority = Some(priority);
        self
    }

    /// Marks the job as depending on routes other than the one it is
    /// inserted into, so its insertion costs are refreshed against every route.
    pub fn set_cross_route_dependency(&mut self, dependency: bool) -> &mut ServiceBuilder {
        self.cross_route_dependency = dependency;
        self
    }

    pub fn build(self) -> Result<Service, ProblemError> {
        let external_id = self.external_id.ok_or(ProblemError::MissingField {
            entity: "service",
            field: "external_id",
        })?;
        let location_id = self.location_id.ok_or(ProblemError::MissingField {
            entity: "service",
            field: "location_id",
        })?;

        if self.time_windows.iter().any(|tw| !tw.is_valid()) {
            return Err(ProblemError::MalformedTimeWindow(external_id));
        }

        let priority = self.priority.unwrap_or(DEFAULT_PRIORITY);
        if !(1..=10).contains(&priority) {
            return Err(ProblemError::InvalidPriority {
                job: external_id,
                priority,
            });
        }

        Ok(Service {
            external_id,
            location_id: LocationIdx::new(location_id),
            time_windows: TimeWindows::from_vec(self.time_windows),
            demand: self.demand.unwrap_or_default(),
            duration: self.duration.unwrap_or(SignedDuration::ZERO),
            setup_duration: self.setup_duration.unwrap_or(SignedDuration::ZERO),
            service_type: self.service_type.unwrap_or_default(),
            skills: self.skills,
            priority,
            cross_route_dependency: self.cross_route_dependency,
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    #[test]
    fn test_builder() {
        let mut builder = ServiceBuilder::default();
        builder
            .set_external_id("service_id")
            .set_location_id(1)
            .set_demand(Capacity::from_vec(vec![1.0, 2.0]))
            .add_skill(Skill::new("fridge"));

        let service = builder.build().unwrap();

        assert_eq!(service.external_id(), "service_id");
        assert_eq!(service.location_id(), LocationIdx::new(1));
        assert_eq!(service.service_type(), ServiceType::Delivery);
        assert_eq!(service.duration(), SignedDuration::ZERO);
        assert!(service.skills().contains(&Skill::new("fridge")));
        assert!(!service.has_time_windows());
        assert_eq!(service.priority(), DEFAULT_PRIORITY);
        assert!(!service.has_cross_route_dependency());
    }

    #[test]
    fn test_builder_rejects_malformed_time_window() {
        let start: Timestamp = "2025-06-10T10:00:00Z".parse().unwrap();
        let end: Timestamp = "2025-06-10T08:00:00Z".parse().unwrap();

        let mut builder = ServiceBuilder::default();
        builder
            .set_external_id("service_id")
            .set_location_id(0)
            .add_time_window(TimeWindow::new(Some(start), Some(end)));

        assert!(matches!(
            builder.build(),
            Err(ProblemError::MalformedTimeWindow(id)) if id == "service_id"
        ));
    }

    #[test]
    fn test_builder_rejects_priority_out_of_range() {
        let mut builder = ServiceBuilder::default();
        builder
            .set_external_id("service_id")
            .set_location_id(0)
            .set_priority(11);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::InvalidPriority { priority: 11, .. })
        ));
    }

    #[test]
    fn test_builder_requires_location() {
        let mut builder = ServiceBuilder::default();
        builder.set_external_id("service_id");

        assert!(matches!(
            builder.build(),
            Err(ProblemError::MissingField {
                field: "location_id",
                ..
            })
        ));
    }
}
