use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use crate::{
    problem::vehicle::VehicleIdx,
    solver::{insertion::insertion_data::InsertionData, solution::route_id::RouteIdx},
};

/// Route an insertion was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteTarget {
    Existing(RouteIdx),
    /// A route the vehicle would open.
    New(VehicleIdx),
}

/// A cached insertion with the round of its target it was computed in.
#[derive(Debug, Clone)]
pub struct VersionedInsertion {
    pub data: InsertionData,
    pub version: usize,
    pub target: RouteTarget,
}

impl VersionedInsertion {
    /// Whether the target has not changed since this entry was computed.
    /// `route_rounds` holds the round each route last changed in, `round`
    /// the current one.
    pub fn is_current(&self, route_rounds: &[usize], round: usize) -> bool {
        match self.target {
            RouteTarget::Existing(route_id) => {
                route_rounds.get(route_id.get()) == Some(&self.version)
            }
            RouteTarget::New(_) => self.version == round,
        }
    }
}

impl PartialEq for VersionedInsertion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionedInsertion {}

impl PartialOrd for VersionedInsertion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionedInsertion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data
            .cost
            .total_cmp(&other.data.cost)
            .then(self.version.cmp(&other.version))
            .then(self.target.cmp(&other.target))
    }
}

/// Best and second best valid insertions of a job, on distinct routes.
#[derive(Debug, Default)]
pub struct BestInsertions {
    pub best: Option<VersionedInsertion>,
    pub second: Option<VersionedInsertion>,
    /// Constraints named by the valid infeasible entries.
    pub failed_constraints: Vec<&'static str>,
}

/// Min-heap of the insertions computed for one job.
#[derive(Debug, Default)]
pub struct JobInsertionQueue {
    heap: BinaryHeap<Reverse<VersionedInsertion>>,
}

impl JobInsertionQueue {
    pub fn push(&mut self, insertion: VersionedInsertion) {
        self.heap.push(Reverse(insertion));
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Drops every entry rejected by `keep`.
    pub fn retain(&mut self, keep: impl Fn(&VersionedInsertion) -> bool) {
        self.heap.retain(|Reverse(entry)| keep(entry));
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pops entries in cost order. Entries rejected by `is_current` are
    /// dropped for good; entries rejected by `is_usable` are skipped but
    /// kept, as is every entry read.
    pub fn best_two(
        &mut self,
        is_current: impl Fn(&VersionedInsertion) -> bool,
        is_usable: impl Fn(&VersionedInsertion) -> bool,
    ) -> BestInsertions {
        let mut result = BestInsertions::default();
        let mut kept = Vec::new();

        while let Some(Reverse(entry)) = self.heap.pop() {
            if !is_current(&entry) {
                continue;
            }
            if !entry.data.is_feasible() {
                for &name in &entry.data.failed_constraints {
                    if !result.failed_constraints.contains(&name) {
                        result.failed_constraints.push(name);
                    }
                }
                kept.push(entry);
                continue;
            }
            if !is_usable(&entry) {
                kept.push(entry);
                continue;
            }

            let same_route = result
                .best
                .as_ref()
                .is_some_and(|best| best.target == entry.target);
            if result.best.is_none() {
                result.best = Some(entry.clone());
            } else if !same_route {
                result.second = Some(entry.clone());
                kept.push(entry);
                break;
            }
            kept.push(entry);
        }

        self.heap.extend(kept.into_iter().map(Reverse));
        result
    }
}
