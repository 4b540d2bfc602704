//! # Search parameters
//!
//! [`SolverParams`] holds the knobs of the reference-line search: pool size, coarse range
//! estimate, candidate subsampling, crossing window and barrier timeout.
//! Build customized values with [`SolverParams::builder`].
use std::cmp::Ordering::Greater;
use std::time::Duration as StdDuration;

use hifitime::Duration;

use crate::constants::{
    BARRIER_TIMEOUT_SECONDS, CANDIDATE_STRIDE, CROSSING_WINDOW_SECONDS, RANGE_OUTLIER_MULTIPLIER,
};
use crate::trackmap_errors::TrackError;

/// Configuration of [`SyncSolver`](crate::solver::SyncSolver).
///
/// Fields
/// -----------------
/// * `workers` – number of worker threads. One worker keeps one core busy; the default
///   leaves one core to the coordinator and the rest of the system.
/// * `range_outlier_multiplier` – outlier multiplier applied to the lap-end positions before
///   deriving the coarse candidate range. Very permissive by default.
/// * `candidate_stride` – only every n-th tour point of the candidate range is evaluated.
/// * `crossing_window` – half width of the time window searched around each recorded lap end.
/// * `barrier_timeout` – maximum wait for the worker reports of one iteration.
///   `None` waits forever.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    pub workers: usize,
    pub range_outlier_multiplier: f64,
    pub candidate_stride: usize,
    pub crossing_window: Duration,
    pub barrier_timeout: Option<StdDuration>,
}

impl SolverParams {
    pub fn builder() -> SolverParamsBuilder {
        SolverParamsBuilder::new()
    }
}

/// Available cores minus one, at least one.
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            workers: default_workers(),
            range_outlier_multiplier: RANGE_OUTLIER_MULTIPLIER,
            candidate_stride: CANDIDATE_STRIDE,
            crossing_window: Duration::from_seconds(CROSSING_WINDOW_SECONDS),
            barrier_timeout: Some(StdDuration::from_secs(BARRIER_TIMEOUT_SECONDS)),
        }
    }
}

/// Builder for [`SolverParams`], with validation.
#[derive(Debug, Clone)]
pub struct SolverParamsBuilder {
    params: SolverParams,
}

impl Default for SolverParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: SolverParams::default(),
        }
    }

    pub fn workers(mut self, v: usize) -> Self {
        self.params.workers = v;
        self
    }
    pub fn range_outlier_multiplier(mut self, v: f64) -> Self {
        self.params.range_outlier_multiplier = v;
        self
    }
    pub fn candidate_stride(mut self, v: usize) -> Self {
        self.params.candidate_stride = v;
        self
    }
    pub fn crossing_window(mut self, v: Duration) -> Self {
        self.params.crossing_window = v;
        self
    }
    pub fn barrier_timeout(mut self, v: Option<StdDuration>) -> Self {
        self.params.barrier_timeout = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `workers >= 1`, `candidate_stride >= 1`
    /// * `range_outlier_multiplier > 0.0`
    /// * `crossing_window > 0`
    /// * `barrier_timeout`, when set, must be non-zero.
    pub fn build(self) -> Result<SolverParams, TrackError> {
        let p = &self.params;

        if p.workers == 0 {
            return Err(TrackError::InvalidParameter("workers must be >= 1".into()));
        }
        if p.candidate_stride == 0 {
            return Err(TrackError::InvalidParameter(
                "candidate_stride must be >= 1".into(),
            ));
        }
        if p.range_outlier_multiplier.partial_cmp(&0.0) != Some(Greater) {
            return Err(TrackError::InvalidParameter(
                "range_outlier_multiplier must be > 0".into(),
            ));
        }
        if p.crossing_window.to_seconds().partial_cmp(&0.0) != Some(Greater) {
            return Err(TrackError::InvalidParameter(
                "crossing_window must be > 0".into(),
            ));
        }
        if p.barrier_timeout.is_some_and(|t| t.is_zero()) {
            return Err(TrackError::InvalidParameter(
                "barrier_timeout must be non-zero".into(),
            ));
        }

        Ok(self.params)
    }
}

#[cfg(test)]
mod test_solver_params {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = SolverParams::default();
        assert!(params.workers >= 1);
        assert_eq!(params.candidate_stride, 3);
        assert_eq!(params.crossing_window, Duration::from_seconds(10.0));
        assert_eq!(params.barrier_timeout, Some(StdDuration::from_secs(600)));
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            SolverParams::builder().workers(0).build(),
            Err(TrackError::InvalidParameter("workers must be >= 1".into()))
        );
        assert!(SolverParams::builder().candidate_stride(0).build().is_err());
        assert!(SolverParams::builder()
            .range_outlier_multiplier(f64::NAN)
            .build()
            .is_err());
        assert!(SolverParams::builder()
            .crossing_window(Duration::ZERO)
            .build()
            .is_err());
        assert!(SolverParams::builder()
            .barrier_timeout(Some(StdDuration::ZERO))
            .build()
            .is_err());

        let params = SolverParams::builder()
            .workers(2)
            .barrier_timeout(None)
            .build()
            .unwrap();
        assert_eq!(params.workers, 2);
        assert_eq!(params.barrier_timeout, None);
    }
}
