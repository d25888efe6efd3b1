use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    #[error("track has no waypoints")]
    Empty,
    #[error("waypoint index {index} out of range (track has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
