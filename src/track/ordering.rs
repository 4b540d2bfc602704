//! # Greedy nearest-neighbour tour construction
//!
//! Chains the unordered unique points into a closed tour:
//!
//! 1. The first input point becomes the current point.
//! 2. Among the remaining points, find the one closest to the current point
//!    ([`TrackPoint::sqr_dist`], first minimum wins).
//! 3. If that distance exceeds the outlier threshold, the **current** point is an outlier
//!    and goes to the excluded set, otherwise it is appended to the tour.
//! 4. The closest point becomes the current point. Repeat until no point remains.
//! 5. The last current point is tested against the last tour point.
//!
//! This is O(n²) in the number of unique points. For a few thousand points processed once
//! per session, this is acceptable.
//!
//! The result depends on the input order only through the starting point and tie-breaks,
//! so a given input always yields the same tour.
use itertools::Itertools;
use log::debug;

use crate::point::TrackPoint;
use crate::trackmap_errors::TrackError;

/// Outcome of [`order_tour`]: the tour and the rejected points.
#[derive(Debug, Clone, Default)]
pub(crate) struct TourOrdering {
    pub sorted: Vec<TrackPoint>,
    pub excluded: Vec<TrackPoint>,
}

/// Order `unsorted` into a tour, rejecting isolated points.
///
/// Arguments
/// -----------------
/// * `unsorted`: unique points, in ingestion order. Consumed.
/// * `threshold`: maximum accepted gap (distance proxy) to the nearest neighbour.
///
/// Return
/// ----------
/// * The ordered tour and the excluded points, with
///   `sorted.len() + excluded.len() == unsorted.len()`.
///
/// Errors
/// ----------
/// * [`TrackError::EmptyPointSet`] if `unsorted` is empty.
pub(crate) fn order_tour(
    mut unsorted: Vec<TrackPoint>,
    threshold: f64,
) -> Result<TourOrdering, TrackError> {
    if unsorted.is_empty() {
        return Err(TrackError::EmptyPointSet);
    }

    let total = unsorted.len();
    let mut sorted = Vec::with_capacity(total);
    let mut excluded = Vec::new();

    let mut current = unsorted.remove(0);

    while let Some(idx) = unsorted
        .iter()
        .position_min_by(|a, b| current.sqr_dist(a).total_cmp(&current.sqr_dist(b)))
    {
        if current.sqr_dist(&unsorted[idx]) > threshold {
            excluded.push(current);
        } else {
            sorted.push(current);
        }

        // order-preserving removal keeps the tie-breaks reproducible
        current = unsorted.remove(idx);
    }

    match sorted.last() {
        Some(last) if current.sqr_dist(last) <= threshold => sorted.push(current),
        _ => excluded.push(current),
    }

    debug!(
        "Tour construction: {} points ordered, {} excluded (input {total})",
        sorted.len(),
        excluded.len()
    );

    Ok(TourOrdering { sorted, excluded })
}
