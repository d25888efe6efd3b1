use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("recording already running")]
    AlreadyRecording,
    #[error("no recording running")]
    NotRecording,
    #[error("no track has been recorded")]
    NoTrack,
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("recorder worker is not running")]
    WorkerGone,
}
