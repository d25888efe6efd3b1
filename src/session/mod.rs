mod error;
mod recorder;
mod session;

pub use error::{RecorderError, SessionError};
pub use recorder::{Recorder, RecorderHandle, RecorderMode, RecorderStatus};
pub use session::{CurrentLocation, FixOutcome, Session};
