pub mod conditions;
pub mod constants;
pub mod ingest;
pub mod point;
pub mod session;
pub mod solver;
pub mod statistics;
pub mod track;
pub mod trackmap_errors;

pub use conditions::{Border, CandidateStat, ReferenceCondition};
pub use point::{Axis, TrackPoint};
pub use session::{LapRecord, LapTable, PositionData, PositionSample, SessionData};
pub use solver::{SearchProgress, SearchResults, SolverParams, SyncSolver};
pub use track::{TopologyParams, TourArc, TrackTopology};
pub use trackmap_errors::TrackError;
