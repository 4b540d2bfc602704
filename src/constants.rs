//! # Constants and type definitions for trackmap
//!
//! This module centralizes the **tuning defaults** and **common type aliases** used
//! throughout the crate.
//!
//! ## Overview
//!
//! - Default heuristics of the tour construction (outlier gap, wrap-around fraction)
//! - Default knobs of the reference-line search (candidate stride, crossing window, ...)
//! - Core type aliases shared by the session, track and solver modules
//!
//! Coordinates are expressed in the unit of the timing feed position data, which is
//! roughly a tenth of a meter (value / 3.61 ≈ meters). No conversion is ever applied.

// -------------------------------------------------------------------------------------------------
// Tour construction
// -------------------------------------------------------------------------------------------------

/// Maximum distance proxy (sum of absolute coordinate deltas) between a point and its
/// nearest remaining neighbour before the point is rejected as an outlier.
///
/// Determined empirically: consecutive unique points are usually about 100 apart.
pub const OUTLIER_DISTANCE: Coordinate = 200.0;

/// Fraction of the tour length above which an index gap between two consecutive samples
/// is interpreted as a jump across the tour end → start boundary.
pub const WRAP_FRACTION: f64 = 0.9;

/// Index of the first on-track sample used as direction reference (the next sample is
/// the second one). Any pair works; skipping the first samples avoids grid formation noise.
pub const DIRECTION_SAMPLE_INDEX: usize = 100;

// -------------------------------------------------------------------------------------------------
// Reference-line search
// -------------------------------------------------------------------------------------------------

/// Outlier multiplier applied to the lap-end positions when estimating the coarse
/// candidate range. Very permissive: only the really far away positions are dropped.
pub const RANGE_OUTLIER_MULTIPLIER: f64 = 100.0;

/// Only every n-th tour point of the candidate range is evaluated.
pub const CANDIDATE_STRIDE: usize = 3;

/// Half width (seconds) of the time window searched around the recorded lap end
/// when estimating the instant a vehicle passed a candidate point.
pub const CROSSING_WINDOW_SECONDS: f64 = 10.0;

/// Default upper bound (seconds) on the time the coordinator waits for all workers
/// to report during one search iteration.
pub const BARRIER_TIMEOUT_SECONDS: u64 = 600;

/// Weight of the newest candidate duration in the smoothed duration behind the ETA.
pub const ETA_SMOOTHING: f64 = 0.2;

/// Status value of a position sample taken while the car is on track.
pub const ON_TRACK_STATUS: &str = "OnTrack";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Planar coordinate in timing feed units
pub type Coordinate = f64;

/// Identifier of a vehicle (the car number as reported by the timing feed)
pub type VehicleId = String;

/// Index of a point in the ordered tour
pub type TourIndex = usize;
