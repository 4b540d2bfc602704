//! # Tour construction parameters
//!
//! [`TopologyParams`] groups the heuristics of the tour construction. All defaults come from
//! [`constants`](crate::constants) and reproduce the empirically tuned values. Use
//! [`TopologyParams::builder`] to customize and validate them.
use std::cmp::Ordering::{Equal, Greater, Less};

use crate::constants::{DIRECTION_SAMPLE_INDEX, OUTLIER_DISTANCE, WRAP_FRACTION};
use crate::trackmap_errors::TrackError;

/// Heuristics of the tour construction and of the direction detection.
///
/// Fields
/// -----------------
/// * `outlier_threshold` – maximum distance proxy between a point and its nearest remaining
///   neighbour. Farther points are moved to the excluded set.
/// * `wrap_fraction` – fraction of the tour length above which the index gap of the two
///   direction reference samples is read as a jump across the end → start boundary.
/// * `direction_sample_index` – index (among the on-track samples of a vehicle) of the
///   first direction reference sample. The second one is the next on-track sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyParams {
    pub outlier_threshold: f64,
    pub wrap_fraction: f64,
    pub direction_sample_index: usize,
}

impl TopologyParams {
    pub fn builder() -> TopologyParamsBuilder {
        TopologyParamsBuilder::new()
    }
}

impl Default for TopologyParams {
    fn default() -> Self {
        TopologyParams {
            outlier_threshold: OUTLIER_DISTANCE,
            wrap_fraction: WRAP_FRACTION,
            direction_sample_index: DIRECTION_SAMPLE_INDEX,
        }
    }
}

/// Builder for [`TopologyParams`], with validation.
#[derive(Debug, Clone)]
pub struct TopologyParamsBuilder {
    params: TopologyParams,
}

impl Default for TopologyParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: TopologyParams::default(),
        }
    }

    pub fn outlier_threshold(mut self, v: f64) -> Self {
        self.params.outlier_threshold = v;
        self
    }
    pub fn wrap_fraction(mut self, v: f64) -> Self {
        self.params.wrap_fraction = v;
        self
    }
    pub fn direction_sample_index(mut self, v: usize) -> Self {
        self.params.direction_sample_index = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `outlier_threshold > 0.0`
    /// * `0.0 < wrap_fraction <= 1.0`
    ///
    /// Return
    /// ----------
    /// * `Ok(TopologyParams)` or [`TrackError::InvalidParameter`] naming the offending field.
    pub fn build(self) -> Result<TopologyParams, TrackError> {
        let p = &self.params;

        if !Self::gt0(p.outlier_threshold) {
            return Err(TrackError::InvalidParameter(
                "outlier_threshold must be > 0".into(),
            ));
        }
        if !Self::gt0(p.wrap_fraction)
            || !matches!(p.wrap_fraction.partial_cmp(&1.0), Some(Less | Equal))
        {
            return Err(TrackError::InvalidParameter(
                "wrap_fraction must be in (0, 1]".into(),
            ));
        }

        Ok(self.params)
    }
}
