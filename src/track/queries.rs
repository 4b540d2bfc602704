//! # Geometric queries on the tour
//!
//! * [`TrackTopology::closest_index`] / [`TrackTopology::closest_point`] – snap an arbitrary
//!   coordinate to the tour.
//! * [`TrackTopology::indices_between`] / [`TrackTopology::points_between`] – points on
//!   the short or long arc between two tour points.
//! * [`TrackTopology::second_coordinate_from`] – linear interpolation of the missing
//!   coordinate on a near-straight arc.
//!
//! All lookups are brute-force linear scans in tour order. Ties resolve to the first
//! minimum encountered, so replacing the scan by a spatial index must keep that order.
use itertools::Itertools;

use crate::constants::{Coordinate, TourIndex};
use crate::point::{Axis, TrackPoint};
use crate::trackmap_errors::TrackError;

use super::TrackTopology;

/// Which of the two arcs joining two tour points is requested.
///
/// The arc whose index span is lower than half the tour length is the short one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourArc {
    Short,
    Long,
}

impl TrackTopology {
    /// Index of the tour point closest to `point` (distance proxy, first minimum wins).
    ///
    /// If `point` is a tour point, its own index is returned.
    pub fn closest_index(&self, point: &TrackPoint) -> TourIndex {
        self.points
            .iter()
            .position_min_by(|a, b| a.sqr_dist(point).total_cmp(&b.sqr_dist(point)))
            .unwrap_or(0)
    }

    /// Tour point closest to `point`.
    pub fn closest_point(&self, point: &TrackPoint) -> &TrackPoint {
        &self.points[self.closest_index(point)]
    }

    /// Tour indices on the requested arc between `first` and `second`.
    ///
    /// The result always runs from `first` towards `second` along the arc, so that the
    /// first returned index is `first` when the reference points are included.
    ///
    /// Arguments
    /// -----------------
    /// * `first`, `second`: tour indices of the boundary points.
    /// * `arc`: [`TourArc::Short`] or [`TourArc::Long`].
    /// * `include_ref`: whether the boundary indices are part of the result.
    ///
    /// Return
    /// ----------
    /// * The ordered indices. The short and long arcs of the same pair partition the tour
    ///   minus the two boundary points.
    ///
    /// Special case
    /// -----------------
    /// * `first == second`: the short arc is `[first]` (empty without references), the long
    ///   arc is every other point in tour order starting after `first` (preceded by `first`
    ///   with references).
    ///
    /// Errors
    /// ----------
    /// * [`TrackError::IndexOutOfRange`] if an index is not a tour index.
    pub fn indices_between(
        &self,
        first: TourIndex,
        second: TourIndex,
        arc: TourArc,
        include_ref: bool,
    ) -> Result<Vec<TourIndex>, TrackError> {
        self.check_index(first)?;
        self.check_index(second)?;
        let n = self.len();

        if first == second {
            let head = include_ref.then_some(first);
            return Ok(match arc {
                TourArc::Short => head.into_iter().collect(),
                TourArc::Long => head
                    .into_iter()
                    .chain((first + 1..n).chain(0..first))
                    .collect(),
            });
        }

        let (lo, hi) = (first.min(second), first.max(second));
        let short_is_inner = ((hi - lo) as f64) < 0.5 * n as f64;
        let inner = (arc == TourArc::Short) == short_is_inner;

        let mut range: Vec<TourIndex> = if inner {
            // lo ..= hi without wrapping
            let mut inside: Vec<TourIndex> = (lo + 1..hi).collect();
            if include_ref {
                inside.insert(0, lo);
                inside.push(hi);
            }
            inside
        } else {
            // hi ..= n-1, 0 ..= lo across the end -> start boundary
            let mut tail: Vec<TourIndex> = (hi + 1..n).collect();
            let mut head: Vec<TourIndex> = (0..lo).collect();
            if include_ref {
                tail.insert(0, hi);
                head.push(lo);
            }
            tail.extend(head);
            tail
        };

        // both constructions run from hi-side or lo-side; orient them from `first`
        let starts_at_first = if inner { first == lo } else { first == hi };
        if !starts_at_first {
            range.reverse();
        }
        Ok(range)
    }

    /// Tour points on the requested arc between `first` and `second`.
    ///
    /// See [`TrackTopology::indices_between`] for the ordering contract.
    pub fn points_between(
        &self,
        first: TourIndex,
        second: TourIndex,
        arc: TourArc,
        include_ref: bool,
    ) -> Result<Vec<TrackPoint>, TrackError> {
        Ok(self
            .indices_between(first, second, arc, include_ref)?
            .into_iter()
            .map(|i| self.points[i])
            .collect())
    }

    /// Interpolate the unknown coordinate of a point from its known one.
    ///
    /// The known coordinate does not need to belong to a tour point. Two reference tour
    /// points bound the search: on the short arc between them, the point whose `axis`
    /// coordinate is closest to `value` is selected, then the better fitting of its arc
    /// neighbours. The other coordinate is interpolated linearly between these two.
    ///
    /// The result is only meaningful if the arc is roughly straight. On a long or curved arc
    /// several points may match `value` and one of them is used silently.
    ///
    /// Arguments
    /// -----------------
    /// * `value`: known coordinate along `axis`.
    /// * `first`, `second`: tour indices bounding the arc.
    /// * `axis`: axis of `value`.
    ///
    /// Return
    /// ----------
    /// * `None` if an index is invalid, the arc has fewer than two points, or both
    ///   selected points share the same `axis` coordinate.
    pub fn second_coordinate_from(
        &self,
        value: Coordinate,
        first: TourIndex,
        second: TourIndex,
        axis: Axis,
    ) -> Option<TrackPoint> {
        let range = self
            .indices_between(first, second, TourArc::Short, true)
            .ok()?;
        if range.len() < 2 {
            return None;
        }

        let gaps: Vec<f64> = range
            .iter()
            .map(|&i| (self.points[i].coord(axis) - value).abs())
            .collect();
        let closest = gaps.iter().position_min_by(|a, b| a.total_cmp(b))?;

        let partner = if closest == 0 {
            1
        } else if closest == range.len() - 1 {
            closest - 1
        } else if gaps[closest + 1] < gaps[closest - 1] {
            closest + 1
        } else {
            closest - 1
        };

        let a = &self.points[range[closest]];
        let b = &self.points[range[partner]];

        let span = b.coord(axis) - a.coord(axis);
        if span == 0.0 {
            return None;
        }
        let t = (value - a.coord(axis)) / span;

        Some(match axis {
            Axis::X => TrackPoint::new(value, a.y + (b.y - a.y) * t),
            Axis::Y => TrackPoint::new(a.x + (b.x - a.x) * t, value),
        })
    }
}
