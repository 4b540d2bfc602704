//! # Track topology
//!
//! Reconstruction of the circuit layout from the unordered position samples of a session,
//! and geometric / temporal queries against the reconstructed tour.
//!
//! Overview
//! -----------------
//! [`TrackTopology::build`] runs the whole pipeline once per session:
//!
//! 1. [`unique_track_points`](crate::ingest::unique_track_points) – unordered unique
//!    on-track coordinates of all vehicles.
//! 2. [`ordering`] – greedy nearest-neighbour chaining into a closed tour, rejecting
//!    isolated points.
//! 3. [`direction`] – reversal of the tour if it runs against the driving direction.
//!
//! The topology is immutable afterwards and can be shared across threads (`Arc`).
//!
//! Indexing
//! -----------------
//! Every point of the tour is addressed by its [`TourIndex`], assigned when the tour is
//! frozen. The tour is cyclic: index `len - 1` is followed by index `0`.
//! Queries take and return indices; [`TrackTopology::point`] resolves them.
//!
//! Disclaimer
//! -----------------
//! The map is built only from points reported by the cars, one point every few meters.
//! A point nobody reported does not exist for the map, so queries on arbitrary coordinates
//! snap to the closest reported point. The map is only valid for the session it was
//! computed from.
//!
//! See also
//! ------------
//! * [`queries`] – nearest point, arcs between points, linear coordinate interpolation.
//! * [`temporal`] – position of a vehicle at a date, date at which a point was passed.
//! * [`TopologyParams`] – tuning of the heuristics.
use std::collections::HashSet;

use ahash::RandomState;
use itertools::Itertools;
use log::info;
use ordered_float::OrderedFloat;

use crate::constants::{Coordinate, TourIndex};
use crate::ingest::unique_track_points;
use crate::point::TrackPoint;
use crate::session::PositionData;
use crate::trackmap_errors::TrackError;

pub mod direction;
pub mod ordering;
pub mod params;
pub mod queries;
pub mod temporal;

pub use params::{TopologyParams, TopologyParamsBuilder};
pub use queries::TourArc;

/// Minimum number of ordered points of a usable tour.
const MIN_TOUR_LEN: usize = 3;

/// Closed, ordered tour of unique track points.
///
/// Invariants
/// -----------------
/// * `points.len() + excluded.len() == input_len`
/// * no two points of `points` share the same coordinates
/// * `points.len() >= 3`
#[derive(Debug, Clone)]
pub struct TrackTopology {
    points: Vec<TrackPoint>,
    excluded: Vec<TrackPoint>,
    input_len: usize,
    xs: HashSet<OrderedFloat<Coordinate>, RandomState>,
    ys: HashSet<OrderedFloat<Coordinate>, RandomState>,
    params: TopologyParams,
}

impl TrackTopology {
    /// Build the track map of a session.
    ///
    /// Arguments
    /// -----------------
    /// * `positions`: per-vehicle position series, each sorted by date (as returned by
    ///   [`SessionData::positions`](crate::session::SessionData::positions)).
    /// * `params`: tour construction heuristics.
    ///
    /// Return
    /// ----------
    /// * The oriented tour.
    ///
    /// Errors
    /// ----------
    /// * [`TrackError::EmptyPointSet`] if no on-track sample exists.
    /// * [`TrackError::InsufficientTrackPoints`] if fewer than three points survive the ordering.
    /// * [`TrackError::NoDirectionReference`] if no vehicle has enough on-track samples to
    ///   orient the tour.
    pub fn build(positions: &PositionData, params: TopologyParams) -> Result<Self, TrackError> {
        let unique = unique_track_points(positions);
        info!("{} unique track points extracted", unique.len());

        let mut track = Self::from_points(unique, params)?;
        direction::orient(&mut track, positions)?;
        Ok(track)
    }

    /// Order an explicit point list into a tour, without direction detection.
    ///
    /// Duplicated coordinates are dropped (first occurrence wins) before ordering, and
    /// count as input points of the excluded set.
    pub fn from_points(points: Vec<TrackPoint>, params: TopologyParams) -> Result<Self, TrackError> {
        let input_len = points.len();

        let mut seen: HashSet<(OrderedFloat<Coordinate>, OrderedFloat<Coordinate>), RandomState> =
            HashSet::default();
        let (unique, duplicates): (Vec<_>, Vec<_>) = points
            .into_iter()
            .partition(|p| seen.insert((OrderedFloat(p.x), OrderedFloat(p.y))));

        let tour = ordering::order_tour(unique, params.outlier_threshold)?;
        if tour.sorted.len() < MIN_TOUR_LEN {
            return Err(TrackError::InsufficientTrackPoints(tour.sorted.len()));
        }

        let mut excluded = tour.excluded;
        excluded.extend(duplicates);

        let xs = tour.sorted.iter().map(|p| OrderedFloat(p.x)).collect();
        let ys = tour.sorted.iter().map(|p| OrderedFloat(p.y)).collect();

        Ok(TrackTopology {
            points: tour.sorted,
            excluded,
            input_len,
            xs,
            ys,
            params,
        })
    }

    /// Number of points of the tour.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a built topology; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Ordered tour points.
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn point(&self, index: TourIndex) -> Option<&TrackPoint> {
        self.points.get(index)
    }

    /// Points rejected as outliers (and duplicated inputs, see [`TrackTopology::from_points`]).
    pub fn excluded(&self) -> &[TrackPoint] {
        &self.excluded
    }

    /// Number of points the tour was built from.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    pub fn params(&self) -> &TopologyParams {
        &self.params
    }

    /// Lazy check whether `(x, y)` is a tour point.
    ///
    /// Both coordinates are checked independently: `x` must be the x of some tour point and
    /// `y` the y of some (possibly other) tour point. The pair itself is not verified.
    #[inline]
    pub fn is_track_point(&self, x: Coordinate, y: Coordinate) -> bool {
        self.xs.contains(&OrderedFloat(x)) && self.ys.contains(&OrderedFloat(y))
    }

    pub(crate) fn check_index(&self, index: TourIndex) -> Result<(), TrackError> {
        if index < self.points.len() {
            Ok(())
        } else {
            Err(TrackError::IndexOutOfRange {
                index,
                len: self.points.len(),
            })
        }
    }

    /// Distance along the tour from index 0 to every point (Euclidean segments).
    ///
    /// The closing segment (last → first) is not included.
    pub fn cumulative_distances(&self) -> Vec<f64> {
        std::iter::once(0.0)
            .chain(
                self.points
                    .iter()
                    .tuple_windows()
                    .map(|(a, b)| a.distance(b))
                    .scan(0.0, |covered, segment| {
                        *covered += segment;
                        Some(*covered)
                    }),
            )
            .collect()
    }

    /// [`cumulative_distances`](TrackTopology::cumulative_distances) scaled to `[0, 1]`.
    pub fn normalized_distances(&self) -> Vec<f64> {
        let distances = self.cumulative_distances();
        let total = distances.last().copied().unwrap_or(0.0);
        if total == 0.0 {
            return vec![0.0; distances.len()];
        }
        distances.into_iter().map(|d| d / total).collect()
    }

    /// Copy of the tour re-indexed so that `start` becomes index 0.
    ///
    /// Typically used once the start/finish line position is known, so that tour indices and
    /// distances count from the line.
    pub fn rotated_to(&self, start: TourIndex) -> Result<TrackTopology, TrackError> {
        self.check_index(start)?;
        let mut rotated = self.clone();
        rotated.points.rotate_left(start);
        Ok(rotated)
    }
}
