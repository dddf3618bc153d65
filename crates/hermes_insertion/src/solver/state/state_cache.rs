use fxhash::{FxHashMap, FxHashSet};
use jiff::{SignedDuration, Timestamp};

use crate::{
    define_index_newtype,
    problem::{
        capacity::Capacity,
        job::ActivityIdx,
        skill::Skill,
        travel_cost_matrix::Cost,
        vehicle::VehicleTypeIdx,
    },
    solver::solution::{route_id::RouteIdx, tour_activity::TourActivity},
};

define_index_newtype!(StateId);

static NO_LOAD: Capacity = Capacity::ZERO;

/// Key of a caller-defined state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    Activity(ActivityIdx),
    Route(RouteIdx),
    ActivityForType(ActivityIdx, VehicleTypeIdx),
    RouteForType(RouteIdx, VehicleTypeIdx),
}

/// Value of a caller-defined state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Number(f64),
    Time(Timestamp),
    Duration(SignedDuration),
    Load(Capacity),
    Flag(bool),
}

/// Quantities derived from the routes, read by constraints and cost
/// calculators while routes are not being mutated.
///
/// Per-activity states are keyed by [`ActivityIdx`]: an activity belongs to
/// at most one route at a time. Per-route states are keyed by [`RouteIdx`].
/// Vehicle dependent states are stored once per vehicle type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateCache {
    num_vehicle_types: usize,

    load: Vec<Capacity>,
    past_max_load: Vec<Capacity>,
    future_max_load: Vec<Capacity>,
    accumulated_costs: Vec<Cost>,
    future_waiting: Vec<SignedDuration>,
    latest_start: Vec<Timestamp>,

    route_load_at_beginning: Vec<Capacity>,
    route_load_at_end: Vec<Capacity>,
    route_max_load: Vec<Capacity>,
    route_costs: Vec<Cost>,
    route_skills: Vec<FxHashSet<Skill>>,
    switch_not_feasible: Vec<bool>,

    custom: FxHashMap<(StateId, StateKey), StateValue>,
}

impl StateCache {
    pub fn new(num_activities: usize, num_vehicle_types: usize) -> Self {
        Self {
            num_vehicle_types,
            load: vec![Capacity::ZERO; num_activities],
            past_max_load: vec![Capacity::ZERO; num_activities],
            future_max_load: vec![Capacity::ZERO; num_activities],
            accumulated_costs: vec![0.0; num_activities],
            future_waiting: vec![SignedDuration::ZERO; num_activities],
            latest_start: vec![Timestamp::MAX; num_activities * num_vehicle_types],
            ..Default::default()
        }
    }

    /// Grows the per-route storage so that `route_id` is addressable.
    pub fn ensure_route(&mut self, route_id: RouteIdx) {
        let len = route_id.get() + 1;
        if self.route_costs.len() >= len {
            return;
        }
        self.route_load_at_beginning.resize(len, Capacity::ZERO);
        self.route_load_at_end.resize(len, Capacity::ZERO);
        self.route_max_load.resize(len, Capacity::ZERO);
        self.route_costs.resize(len, 0.0);
        self.route_skills.resize_with(len, FxHashSet::default);
        self.switch_not_feasible
            .resize(len * self.num_vehicle_types, false);
    }

    pub fn num_routes(&self) -> usize {
        self.route_costs.len()
    }

    pub fn load(&self, activity: ActivityIdx) -> &Capacity {
        &self.load[activity.get()]
    }

    pub fn past_max_load(&self, activity: ActivityIdx) -> &Capacity {
        &self.past_max_load[activity.get()]
    }

    pub fn future_max_load(&self, activity: ActivityIdx) -> &Capacity {
        &self.future_max_load[activity.get()]
    }

    pub fn accumulated_costs(&self, activity: ActivityIdx) -> Cost {
        self.accumulated_costs[activity.get()]
    }

    /// Waiting time accumulated by the activities after this one.
    pub fn future_waiting(&self, activity: ActivityIdx) -> SignedDuration {
        self.future_waiting[activity.get()]
    }

    pub fn latest_start(&self, activity: ActivityIdx, vehicle_type: VehicleTypeIdx) -> Timestamp {
        self.latest_start[activity.get() * self.num_vehicle_types + vehicle_type.get()]
    }

    pub fn route_load_at_beginning(&self, route_id: RouteIdx) -> &Capacity {
        self.route_load_at_beginning
            .get(route_id.get())
            .unwrap_or(&NO_LOAD)
    }

    pub fn route_load_at_end(&self, route_id: RouteIdx) -> &Capacity {
        self.route_load_at_end.get(route_id.get()).unwrap_or(&NO_LOAD)
    }

    pub fn route_max_load(&self, route_id: RouteIdx) -> &Capacity {
        self.route_max_load.get(route_id.get()).unwrap_or(&NO_LOAD)
    }

    pub fn route_costs(&self, route_id: RouteIdx) -> Cost {
        self.route_costs.get(route_id.get()).copied().unwrap_or(0.0)
    }

    pub fn route_skills(&self, route_id: RouteIdx) -> Option<&FxHashSet<Skill>> {
        self.route_skills.get(route_id.get())
    }

    pub fn is_switch_not_feasible(&self, route_id: RouteIdx, vehicle_type: VehicleTypeIdx) -> bool {
        self.switch_not_feasible
            .get(route_id.get() * self.num_vehicle_types + vehicle_type.get())
            .copied()
            .unwrap_or(false)
    }

    /// Load after `activity`, the route load at beginning for the Start.
    pub fn load_after(&self, route_id: Option<RouteIdx>, activity: &TourActivity) -> &Capacity {
        match (activity.index(), route_id) {
            (Some(index), _) => self.load(index),
            (None, Some(route_id)) if activity.is_start() => self.route_load_at_beginning(route_id),
            (None, Some(route_id)) => self.route_load_at_end(route_id),
            (None, None) => &NO_LOAD,
        }
    }

    /// Highest load reached up to and including `activity`.
    pub fn past_max_load_at(
        &self,
        route_id: Option<RouteIdx>,
        activity: &TourActivity,
    ) -> &Capacity {
        match (activity.index(), route_id) {
            (Some(index), _) => self.past_max_load(index),
            (None, Some(route_id)) if activity.is_start() => self.route_load_at_beginning(route_id),
            (None, Some(route_id)) => self.route_max_load(route_id),
            (None, None) => &NO_LOAD,
        }
    }

    /// Highest load reached from `activity` onwards.
    pub fn future_max_load_at(
        &self,
        route_id: Option<RouteIdx>,
        activity: &TourActivity,
    ) -> &Capacity {
        match (activity.index(), route_id) {
            (Some(index), _) => self.future_max_load(index),
            (None, Some(route_id)) if activity.is_start() => self.route_max_load(route_id),
            (None, Some(route_id)) => self.route_load_at_end(route_id),
            (None, None) => &NO_LOAD,
        }
    }

    pub(crate) fn set_activity_loads(
        &mut self,
        activity: ActivityIdx,
        load: Capacity,
        past_max_load: Capacity,
    ) {
        self.load[activity.get()] = load;
        self.past_max_load[activity.get()] = past_max_load;
    }

    pub(crate) fn set_future_max_load(&mut self, activity: ActivityIdx, future_max_load: Capacity) {
        self.future_max_load[activity.get()] = future_max_load;
    }

    pub(crate) fn set_accumulated_costs(&mut self, activity: ActivityIdx, costs: Cost) {
        self.accumulated_costs[activity.get()] = costs;
    }

    pub(crate) fn set_future_waiting(&mut self, activity: ActivityIdx, waiting: SignedDuration) {
        self.future_waiting[activity.get()] = waiting;
    }

    pub(crate) fn set_latest_start(
        &mut self,
        activity: ActivityIdx,
        vehicle_type: VehicleTypeIdx,
        latest_start: Timestamp,
    ) {
        self.latest_start[activity.get() * self.num_vehicle_types + vehicle_type.get()] =
            latest_start;
    }

    pub(crate) fn set_route_loads(
        &mut self,
        route_id: RouteIdx,
        at_beginning: Capacity,
        at_end: Capacity,
        max_load: Capacity,
    ) {
        self.ensure_route(route_id);
        self.route_load_at_beginning[route_id.get()] = at_beginning;
        self.route_load_at_end[route_id.get()] = at_end;
        self.route_max_load[route_id.get()] = max_load;
    }

    pub(crate) fn set_route_costs(&mut self, route_id: RouteIdx, costs: Cost) {
        self.ensure_route(route_id);
        self.route_costs[route_id.get()] = costs;
    }

    pub(crate) fn set_route_skills(&mut self, route_id: RouteIdx, skills: FxHashSet<Skill>) {
        self.ensure_route(route_id);
        self.route_skills[route_id.get()] = skills;
    }

    pub(crate) fn set_switch_not_feasible(
        &mut self,
        route_id: RouteIdx,
        vehicle_type: VehicleTypeIdx,
        not_feasible: bool,
    ) {
        self.ensure_route(route_id);
        self.switch_not_feasible[route_id.get() * self.num_vehicle_types + vehicle_type.get()] =
            not_feasible;
    }

    pub fn custom(&self, state_id: StateId, key: StateKey) -> Option<&StateValue> {
        self.custom.get(&(state_id, key))
    }

    pub fn put_custom(&mut self, state_id: StateId, key: StateKey, value: StateValue) {
        self.custom.insert((state_id, key), value);
    }

    pub fn remove_custom(&mut self, state_id: StateId, key: StateKey) -> Option<StateValue> {
        self.custom.remove(&(state_id, key))
    }
}
