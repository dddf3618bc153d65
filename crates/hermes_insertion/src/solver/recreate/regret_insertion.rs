use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use jiff::SignedDuration;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use tracing::{Level, debug, instrument, trace, warn};

use crate::{
    error::InsertionError,
    problem::{
        fleet::FleetManager, job::JobIdx, travel_cost_matrix::Cost,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        constraints::constraint_manager::ConstraintManager,
        insertion::{
            activity_insertion_costs::LocalActivityInsertionCosts,
            insertion_context::InsertionScope,
            insertion_data::InsertionData,
            inserter::apply_insertion,
            job_insertion_calculator::{InsertionRequest, JobInsertionCostsCalculator},
        },
        solution::{
            activity_factory::DefaultActivityFactory, route_id::RouteIdx,
            vehicle_route::VehicleRoute,
        },
        state::{state_manager::StateManager, state_updater::StateUpdater},
    },
    timer_debug,
    utils::enumerate_idx::EnumerateIdx,
};

use super::{
    insertion_cache::{JobInsertionQueue, RouteTarget, VersionedInsertion},
    insertion_listener::{InsertionListener, UnassignedJobReasons},
    insertion_params::InsertionParams,
    noise::{NoiseGenerator, estimate_max_cost},
    scoring::{DefaultScorer, RegretScorer, regret_score},
};

/// Reason reported for a break whose vehicle never got a route.
pub const BREAK_VEHICLE_UNUSED: &str = "break_vehicle_unused";

enum RegretState {
    Idle,
    RefreshCaches,
    Score,
    Commit {
        job_id: JobIdx,
        insertion: VersionedInsertion,
    },
    Done,
}

/// Bookkeeping of one `insert_jobs` call.
struct InsertionRun {
    fleet: FleetManager,
    queues: FxHashMap<JobIdx, JobInsertionQueue>,
    /// Round after which each route last changed.
    route_rounds: Vec<usize>,
    /// Routes given as input keep their vehicle.
    pinned: Vec<bool>,
    round: usize,
    full_refresh: bool,
    last_committed: Option<RouteIdx>,
    pending_breaks: Vec<JobIdx>,
    deferred_breaks: Vec<JobIdx>,
    bad_jobs: Vec<JobIdx>,
    assigned: usize,
    total: usize,
}

impl InsertionRun {
    fn new(
        problem: &VehicleRoutingProblem,
        routes: &[VehicleRoute],
        jobs: &[JobIdx],
        breaks: Vec<JobIdx>,
    ) -> Self {
        let mut fleet = problem.create_fleet_manager();
        for route in routes.iter().filter(|route| !route.is_empty()) {
            if let Some(vehicle_id) = route.vehicle_id() {
                fleet.lock(vehicle_id);
            }
        }

        let assigned = routes
            .iter()
            .flat_map(|route| route.jobs().iter())
            .filter(|&&job_id| !problem.job(job_id).is_break())
            .count();

        Self {
            fleet,
            queues: jobs
                .iter()
                .map(|&job_id| (job_id, JobInsertionQueue::default()))
                .collect(),
            route_rounds: vec![0; routes.len()],
            pinned: routes.iter().map(|route| !route.is_empty()).collect(),
            round: 0,
            full_refresh: true,
            last_committed: None,
            pending_breaks: breaks,
            deferred_breaks: Vec::new(),
            bad_jobs: Vec::new(),
            assigned,
            total: assigned + jobs.len(),
        }
    }

    fn completeness_ratio(&self, minimum: f64) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.assigned as f64 / self.total as f64).max(minimum)
    }
}

fn route_duration(route: &VehicleRoute) -> SignedDuration {
    if route.is_empty() {
        SignedDuration::ZERO
    } else {
        route.end_time().duration_since(route.departure_time())
    }
}

/// Regret-k construction heuristic.
///
/// Each round, every unassigned job keeps a heap of its insertions into the
/// routes and into the routes the free vehicles would open. Only the routes
/// changed by the last commit are re-evaluated, unless the set of free
/// vehicles changed. The job with the highest regret, the gap between its
/// best and second best insertion, is committed first.
pub struct RegretInsertion {
    problem: Arc<VehicleRoutingProblem>,
    params: InsertionParams,
    calculator: JobInsertionCostsCalculator,
    scorer: Box<dyn RegretScorer>,
    rng: SmallRng,
    thread_pool: rayon::ThreadPool,
    state_manager: StateManager,
    unassigned_reasons: UnassignedJobReasons,
    listeners: Vec<Box<dyn InsertionListener>>,
}

impl RegretInsertion {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        params: InsertionParams,
        rng: SmallRng,
    ) -> Result<Self, InsertionError> {
        let constraints = ConstraintManager::with_core_constraints(params.fixed_cost_weight);
        Self::with_constraints(problem, params, constraints, rng)
    }

    pub fn with_constraints(
        problem: Arc<VehicleRoutingProblem>,
        params: InsertionParams,
        constraints: ConstraintManager,
        rng: SmallRng,
    ) -> Result<Self, InsertionError> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.threads.number_of_threads())
            .build()?;

        let calculator = JobInsertionCostsCalculator::new(
            Arc::new(constraints),
            Arc::new(LocalActivityInsertionCosts::new(params.activity_cost_weight)),
            Arc::new(DefaultActivityFactory),
        );

        Ok(Self {
            state_manager: StateManager::new(&problem),
            scorer: Box::new(DefaultScorer::new(&params.regret)),
            problem,
            params,
            calculator,
            rng,
            thread_pool,
            unassigned_reasons: UnassignedJobReasons::default(),
            listeners: Vec::new(),
        })
    }

    pub fn problem(&self) -> &VehicleRoutingProblem {
        &self.problem
    }

    pub fn params(&self) -> &InsertionParams {
        &self.params
    }

    pub fn set_scorer(&mut self, scorer: Box<dyn RegretScorer>) -> &mut Self {
        self.scorer = scorer;
        self
    }

    pub fn add_listener(&mut self, listener: Box<dyn InsertionListener>) -> &mut Self {
        self.listeners.push(listener);
        self
    }

    pub fn add_state_updater(&mut self, updater: Box<dyn StateUpdater>) -> &mut Self {
        self.state_manager.add_updater(updater);
        self
    }

    pub fn state_manager(&self) -> &StateManager {
        &self.state_manager
    }

    pub fn state_manager_mut(&mut self) -> &mut StateManager {
        &mut self.state_manager
    }

    /// Reasons collected during the last `insert_jobs` call.
    pub fn unassigned_reasons(&self) -> &UnassignedJobReasons {
        &self.unassigned_reasons
    }

    /// Inserts `unassigned` into `routes`, opening new routes as needed.
    /// Returns the jobs that could not be inserted.
    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn insert_jobs(
        &mut self,
        routes: &mut Vec<VehicleRoute>,
        unassigned: Vec<JobIdx>,
    ) -> Result<Vec<JobIdx>, InsertionError> {
        let problem_handle = Arc::clone(&self.problem);
        let problem: &VehicleRoutingProblem = &problem_handle;

        let (jobs, breaks) = Self::validate(problem, routes, unassigned)?;
        debug!(
            jobs = jobs.len(),
            breaks = breaks.len(),
            routes = routes.len(),
            "Starting regret insertion"
        );

        let notified: Vec<JobIdx> = jobs.iter().chain(&breaks).copied().collect();
        let mut run = InsertionRun::new(problem, routes, &jobs, breaks);
        let noise = NoiseGenerator::new(
            problem.num_jobs(),
            estimate_max_cost(problem),
            self.params.noise_probability,
            self.params.noise_level,
            &mut self.rng,
        );

        {
            let routes: &[VehicleRoute] = routes;
            self.notify(|listener| listener.insertion_starts(problem, routes, &notified));
        }

        let mut state = RegretState::Idle;
        loop {
            state = match state {
                RegretState::Idle => {
                    self.insert_initial_breaks(problem, routes, &mut run)?;
                    if run.queues.is_empty() {
                        RegretState::Done
                    } else {
                        RegretState::RefreshCaches
                    }
                }
                RegretState::RefreshCaches => {
                    self.refresh_caches(problem, routes, &mut run)?;
                    RegretState::Score
                }
                RegretState::Score => match self.select(problem, routes, &mut run, &noise) {
                    Some((job_id, insertion)) => RegretState::Commit { job_id, insertion },
                    None => RegretState::Done,
                },
                RegretState::Commit { job_id, insertion } => {
                    self.commit(problem, routes, &mut run, job_id, insertion)?;
                    if run.queues.is_empty() {
                        RegretState::Done
                    } else {
                        RegretState::RefreshCaches
                    }
                }
                RegretState::Done => break,
            };
        }

        for break_id in std::mem::take(&mut run.deferred_breaks) {
            self.mark_unassigned(problem, &mut run, break_id, &[BREAK_VEHICLE_UNUSED]);
        }

        {
            let routes: &[VehicleRoute] = routes;
            self.notify(|listener| listener.insertion_ends(problem, routes));
        }

        debug!(
            rounds = run.round,
            routes = routes.len(),
            unassigned = run.bad_jobs.len(),
            "Regret insertion done"
        );

        Ok(run.bad_jobs)
    }

    /// Splits the requested jobs into regular jobs and breaks, dropping
    /// duplicates.
    fn validate(
        problem: &VehicleRoutingProblem,
        routes: &[VehicleRoute],
        unassigned: Vec<JobIdx>,
    ) -> Result<(Vec<JobIdx>, Vec<JobIdx>), InsertionError> {
        let mut seen = FxHashSet::default();
        let mut jobs = Vec::new();
        let mut breaks = Vec::new();

        for job_id in unassigned {
            if job_id.get() >= problem.num_jobs() {
                return Err(InsertionError::UnknownJob(job_id.get()));
            }
            if routes.iter().any(|route| route.contains_job(job_id)) {
                return Err(InsertionError::JobAlreadyAssigned(
                    problem.job(job_id).external_id().to_owned(),
                ));
            }
            if !seen.insert(job_id) {
                continue;
            }

            if problem.job(job_id).is_break() {
                breaks.push(job_id);
            } else {
                jobs.push(job_id);
            }
        }

        Ok((jobs, breaks))
    }

    fn notify(&mut self, mut event: impl FnMut(&mut dyn InsertionListener)) {
        event(&mut self.state_manager);
        event(&mut self.unassigned_reasons);
        for listener in &mut self.listeners {
            event(listener.as_mut());
        }
    }

    fn mark_unassigned(
        &mut self,
        problem: &VehicleRoutingProblem,
        run: &mut InsertionRun,
        job_id: JobIdx,
        reasons: &[&'static str],
    ) {
        warn!(
            job = problem.job(job_id).external_id(),
            ?reasons,
            "Job cannot be inserted"
        );
        run.bad_jobs.push(job_id);
        self.notify(|listener| listener.job_unassigned(problem, job_id, reasons));
    }

    /// Breaks go into the route of their vehicle, or wait until it opens one.
    fn insert_initial_breaks(
        &mut self,
        problem: &VehicleRoutingProblem,
        routes: &mut [VehicleRoute],
        run: &mut InsertionRun,
    ) -> Result<(), InsertionError> {
        for break_id in std::mem::take(&mut run.pending_breaks) {
            let owner = problem.job(break_id).owner_vehicle();
            let route_id = EnumerateIdx::<RouteIdx>::enumerate_idx(routes.iter())
                .find(|(_, route)| {
                    !route.is_empty() && owner.is_some() && route.vehicle_id() == owner
                })
                .map(|(route_id, _)| route_id);

            match route_id {
                Some(route_id) => self.insert_break(problem, routes, run, route_id, break_id)?,
                None => run.deferred_breaks.push(break_id),
            }
        }
        Ok(())
    }

    fn insert_break(
        &mut self,
        problem: &VehicleRoutingProblem,
        routes: &mut [VehicleRoute],
        run: &mut InsertionRun,
        route_id: RouteIdx,
        break_id: JobIdx,
    ) -> Result<(), InsertionError> {
        let route = &routes[route_id];
        let Some(vehicle_id) = route.vehicle_id() else {
            run.deferred_breaks.push(break_id);
            return Ok(());
        };

        let scope = InsertionScope {
            problem,
            states: self.state_manager.states(),
            fleet: &run.fleet,
            completeness_ratio: run.completeness_ratio(self.params.minimum_completeness_ratio),
            vehicle_switch_allowed: false,
        };
        let request =
            InsertionRequest::new(Some(route_id), route, break_id).with_vehicle(vehicle_id);
        let data = self.calculator.evaluate(&scope, &request, Cost::MAX)?;

        if data.is_feasible() {
            self.commit_insertion(problem, routes, run, route_id, break_id, data);
        } else {
            self.mark_unassigned(problem, run, break_id, &data.failed_constraints);
        }
        Ok(())
    }

    /// Breaks waiting for the vehicle now serving `route_id`.
    fn insert_deferred_breaks(
        &mut self,
        problem: &VehicleRoutingProblem,
        routes: &mut [VehicleRoute],
        run: &mut InsertionRun,
        route_id: RouteIdx,
    ) -> Result<(), InsertionError> {
        let Some(vehicle_id) = routes[route_id].vehicle_id() else {
            return Ok(());
        };
        let (ready, waiting): (Vec<_>, Vec<_>) = run
            .deferred_breaks
            .drain(..)
            .partition(|&break_id| problem.job(break_id).owner_vehicle() == Some(vehicle_id));
        run.deferred_breaks = waiting;

        for break_id in ready {
            self.insert_break(problem, routes, run, route_id, break_id)?;
        }
        Ok(())
    }

    fn refresh_caches(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &[VehicleRoute],
        run: &mut InsertionRun,
    ) -> Result<(), InsertionError> {
        let full_refresh = run.full_refresh;
        let open_routes: Vec<RouteIdx> = routes
            .iter()
            .enumerate_idx()
            .filter(|(_, route)| !route.is_empty())
            .map(|(route_id, _)| route_id)
            .collect();
        let changed_routes: Vec<RouteIdx> = if full_refresh {
            open_routes.clone()
        } else {
            run.last_committed.into_iter().collect()
        };
        let available = run.fleet.available_vehicles();

        trace!(
            round = run.round,
            full_refresh,
            routes = changed_routes.len(),
            new_routes = available.len(),
            "Refreshing insertion caches"
        );

        let scope = InsertionScope {
            problem,
            states: self.state_manager.states(),
            fleet: &run.fleet,
            completeness_ratio: run.completeness_ratio(self.params.minimum_completeness_ratio),
            vehicle_switch_allowed: self.params.vehicle_switch_allowed,
        };
        let calculator = &self.calculator;
        let route_rounds = &run.route_rounds;
        let pinned = &run.pinned;
        let round = run.round;
        let empty_route = VehicleRoute::empty();
        let queues = &mut run.queues;

        timer_debug!(
            "Refresh insertion caches",
            self.thread_pool.install(|| {
                queues.par_iter_mut().try_for_each(|(&job_id, queue)| {
                    let reevaluate_all =
                        full_refresh || problem.job(job_id).has_cross_route_dependency();
                    let targets = if reevaluate_all {
                        queue.clear();
                        &open_routes
                    } else {
                        &changed_routes
                    };

                    for &route_id in targets {
                        let route = &routes[route_id];
                        let mut request = InsertionRequest::new(Some(route_id), route, job_id);
                        if pinned[route_id.get()]
                            && let Some(vehicle_id) = route.vehicle_id()
                        {
                            request = request.with_vehicle(vehicle_id);
                        }
                        let data = calculator.evaluate(&scope, &request, Cost::MAX)?;
                        queue.push(VersionedInsertion {
                            data,
                            version: route_rounds[route_id.get()],
                            target: RouteTarget::Existing(route_id),
                        });
                    }

                    for &vehicle_id in &available {
                        let request = InsertionRequest::new(None, &empty_route, job_id)
                            .with_vehicle(vehicle_id);
                        let data = calculator.evaluate(&scope, &request, Cost::MAX)?;
                        queue.push(VersionedInsertion {
                            data,
                            version: round,
                            target: RouteTarget::New(vehicle_id),
                        });
                    }

                    queue.retain(|entry| entry.is_current(route_rounds, round));

                    Ok::<(), InsertionError>(())
                })
            })
        )?;

        run.full_refresh = false;
        Ok(())
    }

    /// Picks the job with the highest score. Jobs without any feasible
    /// insertion left are reported as unassigned.
    fn select(
        &mut self,
        problem: &VehicleRoutingProblem,
        routes: &[VehicleRoute],
        run: &mut InsertionRun,
        noise: &NoiseGenerator,
    ) -> Option<(JobIdx, VersionedInsertion)> {
        let round = run.round;
        let mut winner: Option<(f64, JobIdx, VersionedInsertion)> = None;
        let mut hopeless: Vec<(JobIdx, Vec<&'static str>)> = Vec::new();

        {
            let InsertionRun {
                fleet,
                queues,
                route_rounds,
                ..
            } = &mut *run;
            let route_rounds: &[usize] = route_rounds;

            let is_current = |entry: &VersionedInsertion| entry.is_current(route_rounds, round);
            let is_usable = |entry: &VersionedInsertion| {
                match (entry.target, entry.data.vehicle_id) {
                    (RouteTarget::New(vehicle_id), _) => !fleet.is_locked(vehicle_id),
                    (RouteTarget::Existing(route_id), Some(vehicle_id)) => {
                        routes[route_id].vehicle_id() == Some(vehicle_id)
                            || !fleet.is_locked(vehicle_id)
                    }
                    (RouteTarget::Existing(_), None) => false,
                }
            };

            for (&job_id, queue) in queues.iter_mut() {
                let read = queue.best_two(&is_current, &is_usable);
                let Some(best) = read.best else {
                    hopeless.push((job_id, read.failed_constraints));
                    continue;
                };

                let job = problem.job(job_id);
                let score = regret_score(
                    &self.params.regret,
                    job.priority(),
                    best.data.cost,
                    read.second.map(|second| second.data.cost),
                ) + self.scorer.score(problem, job_id, &best.data)
                    + noise.create_noise(job_id);

                let is_better = match &winner {
                    None => true,
                    Some((winner_score, winner_job, _)) => {
                        score > *winner_score
                            || (score == *winner_score
                                && job.external_id() < problem.job(*winner_job).external_id())
                    }
                };
                if is_better {
                    winner = Some((score, job_id, best));
                }
            }
        }

        hopeless.sort_by(|(a, _), (b, _)| {
            problem
                .job(*a)
                .external_id()
                .cmp(problem.job(*b).external_id())
        });
        for (job_id, reasons) in hopeless {
            run.queues.remove(&job_id);
            self.mark_unassigned(problem, run, job_id, &reasons);
        }

        winner.map(|(score, job_id, insertion)| {
            trace!(
                round,
                job = problem.job(job_id).external_id(),
                score,
                cost = insertion.data.cost,
                "Selected job"
            );
            (job_id, insertion)
        })
    }

    fn commit(
        &mut self,
        problem: &VehicleRoutingProblem,
        routes: &mut Vec<VehicleRoute>,
        run: &mut InsertionRun,
        job_id: JobIdx,
        insertion: VersionedInsertion,
    ) -> Result<(), InsertionError> {
        run.queues.remove(&job_id);
        let available_before = run.fleet.available_vehicles();

        let route_id = match insertion.target {
            RouteTarget::Existing(route_id) => route_id,
            RouteTarget::New(_) => {
                routes.push(VehicleRoute::empty());
                run.route_rounds.push(run.round);
                run.pinned.push(false);
                RouteIdx::new(routes.len() - 1)
            }
        };

        self.commit_insertion(problem, routes, run, route_id, job_id, insertion.data);
        self.insert_deferred_breaks(problem, routes, run, route_id)?;

        run.full_refresh = run.fleet.available_vehicles() != available_before;
        run.last_committed = Some(route_id);
        run.round += 1;
        Ok(())
    }

    fn commit_insertion(
        &mut self,
        problem: &VehicleRoutingProblem,
        routes: &mut [VehicleRoute],
        run: &mut InsertionRun,
        route_id: RouteIdx,
        job_id: JobIdx,
        data: InsertionData,
    ) {
        let cost = data.cost;
        let route = &mut routes[route_id];
        let duration_before = route_duration(route);
        let removed_break = apply_insertion(problem, route, &mut run.fleet, data);
        let added_time = route_duration(route) - duration_before;

        run.route_rounds[route_id.get()] = run.round + 1;
        if !problem.job(job_id).is_break() {
            run.assigned += 1;
        }

        trace!(
            job = problem.job(job_id).external_id(),
            route = %route_id,
            cost,
            "Committed insertion"
        );

        let routes: &[VehicleRoute] = routes;
        self.notify(|listener| {
            listener.job_inserted(problem, job_id, route_id, routes, cost, added_time)
        });

        if let Some(break_id) = removed_break {
            trace!(
                job = problem.job(break_id).external_id(),
                "Break deferred after vehicle switch"
            );
            run.deferred_breaks.push(break_id);
        }
    }
}
