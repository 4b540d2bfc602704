//! # Direction detection
//!
//! The greedy ordering starts from an arbitrary point and may run against the driving
//! direction. Two consecutive on-track samples of one vehicle tell which way is forward:
//! once mapped onto the tour, the first sample must have the lower tour index.
//!
//! The exception is a pair straddling the tour end → start boundary. The first sample then
//! sits at the very end of the tour and the second one at its beginning. An index gap larger
//! than `wrap_fraction · len` is read as such a jump, and the order is accepted as-is.
//! This is a heuristic, not a proof: it relies on two consecutive samples being close
//! compared to the tour length.
use log::{debug, info};

use crate::constants::TourIndex;
use crate::point::TrackPoint;
use crate::session::PositionData;
use crate::trackmap_errors::TrackError;

use super::TrackTopology;

/// Tour indices of the two direction reference samples of one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DirectionReference {
    pub vehicle: String,
    pub first: TourIndex,
    pub second: TourIndex,
}

/// Whether a tour must be reversed, given the tour indices of two consecutive samples.
#[inline]
pub(crate) fn needs_reversal(
    first: TourIndex,
    second: TourIndex,
    tour_len: usize,
    wrap_fraction: f64,
) -> bool {
    first > second && ((first - second) as f64) <= wrap_fraction * tour_len as f64
}

/// Select the direction reference pair from the first vehicle with enough on-track samples.
///
/// Vehicles are tried in map order. A vehicle qualifies if it has at least
/// `sample_index + 2` on-track samples.
///
/// Errors
/// ----------
/// * [`TrackError::NoDirectionReference`] if no vehicle qualifies.
pub(crate) fn find_reference(
    track: &TrackTopology,
    positions: &PositionData,
    sample_index: usize,
) -> Result<DirectionReference, TrackError> {
    for (vehicle, series) in positions {
        let mut on_track = series.iter().filter(|s| s.on_track).skip(sample_index);

        let (Some(a), Some(b)) = (on_track.next(), on_track.next()) else {
            debug!("Vehicle {vehicle}: not enough on-track samples for direction detection");
            continue;
        };

        return Ok(DirectionReference {
            vehicle: vehicle.clone(),
            first: track.closest_index(&TrackPoint::new(a.x, a.y)),
            second: track.closest_index(&TrackPoint::new(b.x, b.y)),
        });
    }

    Err(TrackError::NoDirectionReference)
}

/// Reverse the tour in place if the reference pair runs against it.
///
/// Return
/// ----------
/// * `true` if the tour was reversed.
pub(crate) fn orient(
    track: &mut TrackTopology,
    positions: &PositionData,
) -> Result<bool, TrackError> {
    let reference = find_reference(track, positions, track.params.direction_sample_index)?;
    let reverse = needs_reversal(
        reference.first,
        reference.second,
        track.len(),
        track.params.wrap_fraction,
    );

    info!(
        "Track direction from vehicle {}: indices {} -> {}, {}",
        reference.vehicle,
        reference.first,
        reference.second,
        if reverse { "reversing tour" } else { "keeping tour order" }
    );

    if reverse {
        track.points.reverse();
    }
    Ok(reverse)
}
