use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::{RecorderError, SessionError};
use super::session::{CurrentLocation, FixOutcome, Session};
use crate::location::{is_current, Fix, LocationPolicy};
use crate::track::{TrackSummary, Waypoint};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RecorderMode {
    Idle,
    Recording {
        track_id: Uuid,
        start: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecorderStatus {
    pub mode: RecorderMode,
    pub current_fix: Option<Fix>,
    pub track: Option<TrackSummary>,
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug)]
struct Shared {
    status: RecorderStatus,
}

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum Message {
    Fix(Fix, oneshot::Sender<FixOutcome>),
    Start(Reply<TrackSummary>),
    Stop(Reply<TrackSummary>),
    SetStepCount(f64, Reply<()>),
    SetDuration(Duration, Reply<()>),
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<Session>,
}

/// Cloneable entry point for provider feeds and API handlers.
///
/// Every handle talks to the same worker, which is the single writer of the
/// session; concurrent feeds are serialized in arrival order.
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<Message>,
    shared: Arc<StdMutex<Shared>>,
    policy: LocationPolicy,
}

/// Owns the worker task driving a [`Session`].
pub struct Recorder {
    handle: RecorderHandle,
    worker: Option<WorkerHandle>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Fix(fix, _) => write!(f, "Fix({} @ {})", fix.provider, fix.timestamp),
            Message::Start(_) => write!(f, "Start"),
            Message::Stop(_) => write!(f, "Stop"),
            Message::SetStepCount(count, _) => write!(f, "SetStepCount({count})"),
            Message::SetDuration(duration, _) => write!(f, "SetDuration({duration})"),
        }
    }
}

impl Recorder {
    /// Spawn the worker. Must be called from within a tokio runtime.
    pub fn spawn(session: Session) -> Self {
        let policy = *session.policy();
        let shared = Arc::new(StdMutex::new(Shared {
            status: snapshot(&session),
        }));
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = oneshot::channel();

        let join = tokio::spawn(run_worker_loop(session, shared.clone(), rx, stop_rx));

        Self {
            handle: RecorderHandle { tx, shared, policy },
            worker: Some(WorkerHandle { stop_tx, join }),
        }
    }

    pub fn handle(&self) -> RecorderHandle {
        self.handle.clone()
    }

    /// Stop the worker, ending an active recording, and hand back the session.
    pub async fn shutdown(mut self) -> Option<Session> {
        let worker = self.worker.take()?;
        let _ = worker.stop_tx.send(());
        match worker.join.await {
            Ok(session) => Some(session),
            Err(e) => {
                log::error!("Recorder worker failed: {}", e);
                None
            }
        }
    }
}

impl RecorderHandle {
    /// Full copy of the published status, waypoints included.
    pub fn status(&self) -> RecorderStatus {
        lock(&self.shared).status.clone()
    }

    pub fn mode(&self) -> RecorderMode {
        lock(&self.shared).status.mode.clone()
    }

    pub fn track_summary(&self) -> Option<TrackSummary> {
        lock(&self.shared).status.track.clone()
    }

    pub fn waypoints(&self) -> Vec<Waypoint> {
        lock(&self.shared).status.waypoints.clone()
    }

    /// Best known fix from the last published snapshot, with its liveness.
    pub fn current_location(&self, now: DateTime<Utc>) -> CurrentLocation {
        let fix = lock(&self.shared).status.current_fix.clone();
        CurrentLocation {
            is_current: fix.as_ref().is_some_and(|f| is_current(f, now, &self.policy)),
            fix,
        }
    }

    pub async fn submit(&self, fix: Fix) -> Result<FixOutcome, RecorderError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Message::Fix(fix, reply_tx)).await?;
        reply_rx.await.map_err(|_| RecorderError::WorkerGone)
    }

    pub async fn start_recording(&self) -> Result<TrackSummary, RecorderError> {
        self.request(Message::Start).await
    }

    pub async fn stop_recording(&self) -> Result<TrackSummary, RecorderError> {
        self.request(Message::Stop).await
    }

    pub async fn set_step_count(&self, step_count: f64) -> Result<(), RecorderError> {
        self.request(|reply| Message::SetStepCount(step_count, reply))
            .await
    }

    pub async fn set_duration(&self, duration: Duration) -> Result<(), RecorderError> {
        self.request(|reply| Message::SetDuration(duration, reply))
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Message,
    ) -> Result<T, RecorderError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx)).await?;
        let result = reply_rx.await.map_err(|_| RecorderError::WorkerGone)?;
        Ok(result?)
    }

    async fn send(&self, message: Message) -> Result<(), RecorderError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| RecorderError::WorkerGone)
    }
}

async fn run_worker_loop(
    mut session: Session,
    shared: Arc<StdMutex<Shared>>,
    mut rx: mpsc::Receiver<Message>,
    mut stop_rx: oneshot::Receiver<()>,
) -> Session {
    loop {
        let message = tokio::select! {
            message = rx.recv() => message,
            _ = &mut stop_rx => None,
        };
        let Some(message) = message else {
            break;
        };

        log::trace!("Recorder handling {:?}", message);
        // Status is published before replying so callers read their own writes.
        match message {
            Message::Fix(fix, reply) => {
                let outcome = session.offer(fix);
                if outcome.verdict.is_accepted() {
                    publish_fix(&mut lock(&shared).status, &session, outcome.waypoint.as_ref());
                }
                let _ = reply.send(outcome);
            }
            Message::Start(reply) => {
                let result = session.start_recording();
                if result.is_ok() {
                    lock(&shared).status = snapshot(&session);
                }
                let _ = reply.send(result);
            }
            Message::Stop(reply) => {
                let result = session.stop_recording();
                publish_track(&mut lock(&shared).status, &session);
                let _ = reply.send(result);
            }
            Message::SetStepCount(count, reply) => {
                let result = session.set_step_count(count);
                publish_track(&mut lock(&shared).status, &session);
                let _ = reply.send(result);
            }
            Message::SetDuration(duration, reply) => {
                let result = session.set_duration(duration);
                publish_track(&mut lock(&shared).status, &session);
                let _ = reply.send(result);
            }
        }
    }

    if session.is_recording() {
        if let Err(e) = session.stop_recording() {
            log::warn!("Failed to end recording on shutdown: {}", e);
        }
    }
    publish_track(&mut lock(&shared).status, &session);
    log::info!("Recorder worker stopped");
    session
}

fn mode_of(session: &Session, track: Option<&TrackSummary>) -> RecorderMode {
    match (track, session.is_recording()) {
        (Some(summary), true) => RecorderMode::Recording {
            track_id: summary.id,
            start: summary.recording_start,
        },
        _ => RecorderMode::Idle,
    }
}

fn snapshot(session: &Session) -> RecorderStatus {
    let track = session.summary();
    RecorderStatus {
        mode: mode_of(session, track.as_ref()),
        current_fix: session.current_fix().cloned(),
        track,
        waypoints: session.waypoints(),
    }
}

/// Refresh summary and mode; the waypoint list is left alone.
fn publish_track(status: &mut RecorderStatus, session: &Session) {
    status.track = session.summary();
    status.mode = mode_of(session, status.track.as_ref());
}

/// Tracks only grow by one waypoint per accepted fix, and only the previous
/// waypoint's stopover flag can change, so the published list is patched
/// rather than copied.
fn publish_fix(status: &mut RecorderStatus, session: &Session, waypoint: Option<&Waypoint>) {
    status.current_fix = session.current_fix().cloned();
    let (Some(waypoint), Some(track)) = (waypoint, session.track()) else {
        return;
    };

    if let Some(index) = status.waypoints.len().checked_sub(1) {
        if let (Some(published), Ok(recorded)) =
            (status.waypoints.get_mut(index), track.waypoint_at(index))
        {
            published.is_stopover = recorded.is_stopover;
        }
    }
    status.waypoints.push(waypoint.clone());
    status.track = Some(track.summary());
}

fn lock(shared: &StdMutex<Shared>) -> std::sync::MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Provider;

    fn fix(lon: f64, seconds: i64) -> Fix {
        Fix::new(0.0, lon, Provider::Gps, Utc::now() + Duration::seconds(seconds)).with_accuracy(5.0)
    }

    #[tokio::test]
    async fn test_worker_records_submitted_fixes() {
        let recorder = Recorder::spawn(Session::default());
        let handle = recorder.handle();

        let started = handle.start_recording().await.unwrap();
        assert!(matches!(
            handle.status().mode,
            RecorderMode::Recording { track_id, .. } if track_id == started.id
        ));

        handle.submit(fix(0.0, 0)).await.unwrap();
        handle.submit(fix(0.001, 10)).await.unwrap();
        let outcome = handle.submit(fix(0.001, 20)).await.unwrap();
        assert!(outcome.waypoint.is_some());

        let status = handle.status();
        assert_eq!(status.waypoints.len(), 3);
        assert!(status.waypoints[1].is_stopover);

        let stopped = handle.stop_recording().await.unwrap();
        assert_eq!(stopped.waypoint_count, 3);
        assert!(matches!(handle.mode(), RecorderMode::Idle));
        assert_eq!(handle.track_summary(), Some(stopped.clone()));

        let session = recorder.shutdown().await.unwrap();
        assert_eq!(session.summary().unwrap().id, started.id);
    }

    #[tokio::test]
    async fn test_concurrent_feeds_are_serialized() {
        let recorder = Recorder::spawn(Session::default());
        let handle = recorder.handle();
        handle.start_recording().await.unwrap();

        let mut tasks = Vec::new();
        for feed in 0..4 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..10 {
                    let _ = handle.submit(fix(0.0001 * i as f64, feed * 100 + i)).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let status = handle.status();
        let track = status.track.unwrap();
        assert_eq!(track.waypoint_count, status.waypoints.len());
        for pair in status.waypoints.windows(2) {
            assert!(pair[0].distance_from_start <= pair[1].distance_from_start);
        }
        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_published_waypoints_follow_the_track() {
        let recorder = Recorder::spawn(Session::default());
        let handle = recorder.handle();
        handle.start_recording().await.unwrap();

        let lons = [0.0, 0.001, 0.001, 0.001, 0.002, 0.002, 0.003];
        for (i, lon) in lons.into_iter().enumerate() {
            handle.submit(fix(lon, i as i64 * 10)).await.unwrap();
        }
        let rejected = handle.submit(fix(0.004, -600)).await.unwrap();
        assert!(!rejected.verdict.is_accepted());

        let published = handle.waypoints();
        let summary = handle.track_summary().unwrap();
        let session = recorder.shutdown().await.unwrap();

        assert_eq!(published, session.waypoints());
        assert_eq!(summary.waypoint_count, lons.len());
        assert_eq!(summary.stopover_count, 3);
        assert_eq!(
            published.iter().filter(|w| w.is_stopover).count(),
            summary.stopover_count
        );
    }

    #[tokio::test]
    async fn test_session_errors_are_reported() {
        let recorder = Recorder::spawn(Session::default());
        let handle = recorder.handle();

        assert!(matches!(
            handle.stop_recording().await,
            Err(RecorderError::Session(SessionError::NotRecording))
        ));
        assert!(matches!(
            handle.set_step_count(5.0).await,
            Err(RecorderError::Session(SessionError::NoTrack))
        ));
        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_ends_recording() {
        let recorder = Recorder::spawn(Session::default());
        let handle = recorder.handle();
        handle.start_recording().await.unwrap();
        handle.set_duration(Duration::seconds(12)).await.unwrap();

        let session = recorder.shutdown().await.unwrap();
        assert!(!session.is_recording());
        assert_eq!(session.summary().unwrap().duration_seconds, 12);

        assert!(matches!(
            handle.submit(fix(0.0, 0)).await,
            Err(RecorderError::WorkerGone)
        ));
    }
}
