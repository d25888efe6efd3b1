mod error;
mod geodesy;
mod recorder;
mod stopover;
mod types;

pub use error::TrackError;
pub use geodesy::{distance_between, haversine_distance_m, EARTH_RADIUS_M};
pub use recorder::TrackRecorder;
pub use stopover::StopoverPolicy;
pub use types::{Track, TrackSummary, Waypoint};
