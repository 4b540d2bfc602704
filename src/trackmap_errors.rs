use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("The session contains no position sample")]
    EmptySession,

    #[error("No track point could be extracted from the position data")]
    EmptyPointSet,

    #[error("Too few points left to build a closed tour: {0}")]
    InsufficientTrackPoints(usize),

    #[error("No vehicle has enough on-track samples to detect the track direction")]
    NoDirectionReference,

    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),

    #[error("Tour index {index} out of range (tour length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No usable lap found to estimate the candidate range")]
    NoUsableLaps,

    #[error("Array length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid date string: {0}")]
    InvalidDate(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Worker barrier stalled after {waited:?}: {received}/{expected} reports received")]
    WorkerStalled {
        waited: Duration,
        received: usize,
        expected: usize,
    },

    #[error("All workers disconnected before reporting")]
    WorkersDisconnected,

    #[error("Worker barrier lost tasks: {completed} completed out of {expected} enqueued")]
    BarrierMismatch { expected: usize, completed: usize },

    #[error("Worker channel closed: {0}")]
    ChannelClosed(String),
}

impl PartialEq for TrackError {
    fn eq(&self, other: &Self) -> bool {
        use TrackError::*;
        match (self, other) {
            (InsufficientTrackPoints(a), InsufficientTrackPoints(b)) => a == b,
            (UnknownVehicle(a), UnknownVehicle(b)) => a == b,
            (
                IndexOutOfRange { index: a, len: la },
                IndexOutOfRange { index: b, len: lb },
            ) => a == b && la == lb,
            (
                LengthMismatch {
                    expected: ea,
                    found: fa,
                },
                LengthMismatch {
                    expected: eb,
                    found: fb,
                },
            ) => ea == eb && fa == fb,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (ChannelClosed(a), ChannelClosed(b)) => a == b,
            (
                BarrierMismatch {
                    expected: ea,
                    completed: ca,
                },
                BarrierMismatch {
                    expected: eb,
                    completed: cb,
                },
            ) => ea == eb && ca == cb,

            // Payloads not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (WorkerStalled { .. }, WorkerStalled { .. }) => true,

            (EmptySession, EmptySession) => true,
            (EmptyPointSet, EmptyPointSet) => true,
            (NoDirectionReference, NoDirectionReference) => true,
            (NoUsableLaps, NoUsableLaps) => true,
            (WorkersDisconnected, WorkersDisconnected) => true,

            _ => false,
        }
    }
}
