mod arbiter;
mod last_known;
mod types;

pub use arbiter::{
    evaluate, is_better_location, is_current, AcceptReason, LocationPolicy, RejectReason, Verdict,
};
pub use last_known::determine_last_known_location;
pub use types::{Fix, Provider};
