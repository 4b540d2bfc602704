//! # Track points
//!
//! [`TrackPoint`] is the atomic geometric sample of the crate: a planar coordinate pair
//! with an optional absolute instant ([`Epoch`]).
//!
//! Equality is **coordinate equality** only; the date is carried along as metadata.
//! Points stored in a [`TrackTopology`](crate::track::TrackTopology) are addressed by
//! their tour index, never by identity.
//!
//! Distances
//! -----------------
//! * [`TrackPoint::sqr_dist`] – cheap proxy metric (sum of absolute coordinate deltas).
//!   Historically named "squared" distance, it is used for every nearest-point search and
//!   for the outlier gap test of the tour construction.
//! * [`TrackPoint::distance`] – true Euclidean distance, used where a linear ratio along
//!   the track is needed (interpolation, cumulative distances).
use hifitime::Epoch;

use crate::constants::Coordinate;

/// Axis selector for single-coordinate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackPoint {
    pub x: Coordinate,
    pub y: Coordinate,
    pub date: Option<Epoch>,
}

impl TrackPoint {
    pub fn new(x: Coordinate, y: Coordinate) -> Self {
        TrackPoint { x, y, date: None }
    }

    pub fn with_date(x: Coordinate, y: Coordinate, date: Epoch) -> Self {
        TrackPoint {
            x,
            y,
            date: Some(date),
        }
    }

    /// Coordinate along the requested axis.
    #[inline]
    pub fn coord(&self, axis: Axis) -> Coordinate {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Distance proxy to another point: `|Δx| + |Δy|`.
    ///
    /// Not a true squared distance. Monotonic enough along a track to rank neighbours,
    /// and much cheaper than the Euclidean norm in the O(n²) tour construction.
    #[inline]
    pub fn sqr_dist(&self, other: &TrackPoint) -> Coordinate {
        (other.x - self.x).abs() + (other.y - self.y).abs()
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &TrackPoint) -> Coordinate {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl PartialEq for TrackPoint {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}
