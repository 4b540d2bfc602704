//! # Reference-line search
//!
//! Estimates the position of the start/finish line and of the sector borders from the lap
//! timing of a session, by testing candidate points of the tour with the
//! [`ReferenceCondition`] strategies.
//!
//! Workflow
//! -----------------
//! 1. [`SyncSolver::new`] with the shared [`TrackTopology`] and [`SessionData`].
//! 2. [`SyncSolver::add_condition`] for every strategy to evaluate.
//! 3. [`SyncSolver::setup`] estimates the coarse candidate range (optional, `solve` runs it
//!    when needed).
//! 4. [`SyncSolver::solve`] (or [`SyncSolver::solve_with_observer`]) evaluates every
//!    candidate on the worker pool and returns the [`SearchResults`].
//!
//! Candidate range
//! -----------------
//! The recorded lap end times already give a rough position of the line: the position of
//! each vehicle at `session_start + lap time` for all usable laps. Far outliers are dropped
//! ([`reject_outliers`] with a very permissive multiplier), the remaining positions are
//! snapped to the tour and the two extreme tour indices bound the short arc searched.
//! Only every `candidate_stride`-th point of that arc is evaluated.
//!
//! Iteration protocol
//! -----------------
//! For every candidate: one task per `(condition, vehicle)` pair, barrier, merge, one
//! [`CandidateStat`] per condition, resume. Iterations are strictly sequential; see
//! [`worker`] for the barrier guarantees.
//!
//! Assumptions
//! -----------------
//! * The reference line is at a fixed position.
//! * `previous lap start + lap time = lap start`.
//! * Lap and sector times are reported with roughly ±0.5 s accuracy, so the estimate is
//!   statistical: the candidate with the lowest dispersion wins, and the caller judges
//!   whether that dispersion is acceptable.
use std::sync::Arc;

use itertools::{Itertools, MinMaxResult};
use log::{debug, info};

use crate::conditions::{CandidateStat, ReferenceCondition};
use crate::constants::{TourIndex, ETA_SMOOTHING};
use crate::point::TrackPoint;
use crate::session::SessionData;
use crate::statistics::reject_outliers;
use crate::track::{TourArc, TrackTopology};
use crate::trackmap_errors::TrackError;

pub mod params;
pub mod progress;
pub(crate) mod worker;

pub use params::{SolverParams, SolverParamsBuilder};
pub use progress::SearchProgress;

use progress::CandidateTimer;
use worker::{SharedState, Task, WorkerPool};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Outcome of [`SyncSolver::setup`].
#[derive(Debug, Clone, PartialEq)]
pub struct SetupStats {
    pub vehicles: usize,
    /// Laps passing the usability rule, all vehicles combined.
    pub usable_laps: usize,
    /// Usable laps whose end position could be interpolated.
    pub located_laps: usize,
    pub rejected_outliers: usize,
    pub range_start: TourIndex,
    pub range_end: TourIndex,
    /// Tour points on the arc between `range_start` and `range_end`, both included.
    pub range_len: usize,
    /// Candidates left after subsampling.
    pub candidates: usize,
}

/// Statistics of every evaluated candidate for one condition, in evaluation order.
#[derive(Debug, Clone)]
pub struct ConditionResults {
    pub condition: ReferenceCondition,
    pub candidates: Vec<TourIndex>,
    pub stats: Vec<CandidateStat>,
}

impl ConditionResults {
    fn new(condition: ReferenceCondition) -> Self {
        ConditionResults {
            condition,
            candidates: Vec::new(),
            stats: Vec::new(),
        }
    }

    fn push(&mut self, candidate: TourIndex, stat: CandidateStat) {
        self.candidates.push(candidate);
        self.stats.push(stat);
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Candidate with the minimum [`score`](CandidateStat::score).
    ///
    /// Candidates with an empty border are never selected; the first one wins on ties.
    pub fn best(&self) -> Option<(TourIndex, &CandidateStat)> {
        self.candidates
            .iter()
            .zip(&self.stats)
            .filter_map(|(&index, stat)| stat.score().map(|score| (index, stat, score)))
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(index, stat, _)| (index, stat))
    }
}

/// Results of a search, one entry per registered condition (registration order).
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub conditions: Vec<ConditionResults>,
}

impl SearchResults {
    fn new(conditions: &[ReferenceCondition]) -> Self {
        SearchResults {
            conditions: conditions
                .iter()
                .map(|&c| ConditionResults::new(c))
                .collect(),
        }
    }

    /// Results of the first registered occurrence of `condition`.
    pub fn get(&self, condition: ReferenceCondition) -> Option<&ConditionResults> {
        self.conditions.iter().find(|r| r.condition == condition)
    }
}

/// Coordinator of the reference-line search.
pub struct SyncSolver {
    track: Arc<TrackTopology>,
    session: Arc<SessionData>,
    conditions: Vec<ReferenceCondition>,
    params: SolverParams,
    candidates: Vec<TourIndex>,
    setup: Option<SetupStats>,
}

impl SyncSolver {
    pub fn new(track: Arc<TrackTopology>, session: Arc<SessionData>, params: SolverParams) -> Self {
        SyncSolver {
            track,
            session,
            conditions: Vec::new(),
            params,
            candidates: Vec::new(),
            setup: None,
        }
    }

    /// Register a condition. Duplicates are not checked and are evaluated twice.
    pub fn add_condition(&mut self, condition: ReferenceCondition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[ReferenceCondition] {
        &self.conditions
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Candidate tour indices, available after [`SyncSolver::setup`].
    pub fn candidates(&self) -> &[TourIndex] {
        &self.candidates
    }

    pub fn setup_stats(&self) -> Option<&SetupStats> {
        self.setup.as_ref()
    }

    /// One-off computations before the search: coarse candidate range and its subsampling.
    ///
    /// Errors
    /// ----------
    /// * [`TrackError::NoUsableLaps`] if no usable lap end position could be located.
    pub fn setup(&mut self) -> Result<SetupStats, TrackError> {
        let (candidates, stats) = candidate_range(
            &self.track,
            &self.session,
            self.params.range_outlier_multiplier,
            self.params.candidate_stride,
        )?;

        info!(
            "Setup: {} vehicles, {} usable laps ({} located), {} outliers rejected",
            stats.vehicles, stats.usable_laps, stats.located_laps, stats.rejected_outliers
        );
        if let (Some(a), Some(b)) = (
            self.track.point(stats.range_start),
            self.track.point(stats.range_end),
        ) {
            info!(
                "Searching reference line between x={}, y={} and x={}, y={}: {} candidates",
                a.x, a.y, b.x, b.y, stats.candidates
            );
        }

        self.candidates = candidates;
        self.setup = Some(stats.clone());
        Ok(stats)
    }

    /// Run the search, reporting every completed candidate to `observer`.
    ///
    /// Errors
    /// ----------
    /// * [`TrackError::InvalidParameter`] if no condition is registered.
    /// * Setup errors if [`SyncSolver::setup`] was not run before.
    /// * Worker pool errors (spawn failure, stalled barrier, lost tasks).
    pub fn solve_with_observer<F>(&mut self, mut observer: F) -> Result<SearchResults, TrackError>
    where
        F: FnMut(&SearchProgress),
    {
        if self.conditions.is_empty() {
            return Err(TrackError::InvalidParameter(
                "at least one condition must be registered".into(),
            ));
        }
        if self.setup.is_none() {
            self.setup()?;
        }

        let shared = Arc::new(SharedState {
            track: Arc::clone(&self.track),
            session: Arc::clone(&self.session),
            conditions: self.conditions.clone(),
            crossing_window: self.params.crossing_window,
        });
        let mut pool = WorkerPool::spawn(
            self.params.workers,
            Arc::clone(&shared),
            self.params.barrier_timeout,
        )?;
        info!(
            "Starting search: {} candidates, {} conditions, {} workers",
            self.candidates.len(),
            self.conditions.len(),
            pool.size()
        );

        let mut results = SearchResults::new(&self.conditions);
        let mut timer = CandidateTimer::new(ETA_SMOOTHING);
        let total = self.candidates.len();
        let vehicles = self.session.vehicles();

        for (iteration, &index) in self.candidates.iter().enumerate() {
            let candidate = *self.track.point(index).ok_or(TrackError::IndexOutOfRange {
                index,
                len: self.track.len(),
            })?;

            let tasks: Vec<Task> = (0..self.conditions.len())
                .cartesian_product(vehicles)
                .map(|(condition, vehicle)| Task {
                    condition,
                    vehicle: vehicle.clone(),
                    candidate,
                })
                .collect();
            let task_count = tasks.len();

            let merged = pool.run_iteration(tasks)?;

            for (c, (condition, acc)) in self
                .conditions
                .iter()
                .zip(results.conditions.iter_mut())
                .enumerate()
            {
                let stat = match merged.get(&c) {
                    Some(samples) => condition.aggregate(samples, &candidate),
                    None => condition.aggregate(&Default::default(), &candidate),
                };
                acc.push(index, stat);
            }

            pool.resume_all()?;

            let last = timer.finish_candidate();
            observer(&SearchProgress {
                iteration,
                total,
                candidate_index: index,
                candidate,
                tasks: task_count,
                last,
                average: timer.smoothed(),
            });
        }

        pool.shutdown()?;
        info!("Search finished: {total} candidates evaluated");
        Ok(results)
    }

    /// Run the search with a progress bar.
    #[cfg(feature = "progress")]
    pub fn solve(&mut self) -> Result<SearchResults, TrackError> {
        use progress::short_duration;

        if self.setup.is_none() && !self.conditions.is_empty() {
            self.setup()?;
        }

        let pb = ProgressBar::new((self.candidates.len() as u64).max(1));
        pb.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | ETA {eta_precise} | {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(200));

        let results = self.solve_with_observer(|p| {
            pb.set_message(format!(
                "last: {}, avg: {}",
                short_duration(p.last),
                short_duration(p.average)
            ));
            pb.inc(1);
        });

        pb.disable_steady_tick();
        pb.finish_and_clear();
        results
    }

    /// Run the search, logging progress at debug level.
    #[cfg(not(feature = "progress"))]
    pub fn solve(&mut self) -> Result<SearchResults, TrackError> {
        use progress::short_duration;

        self.solve_with_observer(|p| {
            debug!(
                "Candidate {}/{} (tour index {}): {} tasks in {}, avg {}, ETA {}",
                p.iteration + 1,
                p.total,
                p.candidate_index,
                p.tasks,
                short_duration(p.last),
                short_duration(p.average),
                short_duration(p.eta())
            );
        })
    }
}

/// Coarse candidate range of the search.
///
/// Arguments
/// -----------------
/// * `track`, `session`: shared session data.
/// * `outlier_multiplier`: median-deviation multiplier of the outlier rejection.
/// * `stride`: subsampling step of the range (`>= 1`).
///
/// Return
/// ----------
/// * The candidate tour indices, running from the lower to the higher extreme index along
///   the short arc, and the setup statistics.
///
/// Errors
/// ----------
/// * [`TrackError::NoUsableLaps`] if no lap end position could be located.
pub fn candidate_range(
    track: &TrackTopology,
    session: &SessionData,
    outlier_multiplier: f64,
    stride: usize,
) -> Result<(Vec<TourIndex>, SetupStats), TrackError> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut usable_laps = 0;

    for vehicle in session.vehicles() {
        for lap in session.laps().usable_laps(vehicle) {
            usable_laps += 1;
            let lap_end = session.date_of(lap.session_time);
            match track.position_at_time(session, vehicle, lap_end) {
                Some(p) => {
                    xs.push(p.x);
                    ys.push(p.y);
                }
                None => debug!("Vehicle {vehicle}: lap end at {lap_end} could not be located"),
            }
        }
    }

    if xs.is_empty() {
        return Err(TrackError::NoUsableLaps);
    }
    let located_laps = xs.len();

    let (xs, filtered) = reject_outliers(&xs, &[&ys], outlier_multiplier)?;
    let ys = filtered.into_iter().next().unwrap_or_default();

    let indices: Vec<TourIndex> = xs
        .iter()
        .zip(&ys)
        .map(|(&x, &y)| track.closest_index(&TrackPoint::new(x, y)))
        .collect();

    let (range_start, range_end) = match indices.iter().copied().minmax() {
        MinMaxResult::NoElements => return Err(TrackError::NoUsableLaps),
        MinMaxResult::OneElement(i) => (i, i),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };

    let range = track.indices_between(range_start, range_end, TourArc::Short, true)?;
    let range_len = range.len();
    let candidates: Vec<TourIndex> = range.into_iter().step_by(stride.max(1)).collect();

    let stats = SetupStats {
        vehicles: session.vehicles().len(),
        usable_laps,
        located_laps,
        rejected_outliers: located_laps - xs.len(),
        range_start,
        range_end,
        range_len,
        candidates: candidates.len(),
    };

    Ok((candidates, stats))
}
