use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::error::SessionError;
use crate::location::{
    determine_last_known_location, evaluate, is_current, Fix, LocationPolicy, RejectReason,
    Verdict,
};
use crate::track::{StopoverPolicy, Track, TrackRecorder, TrackSummary, Waypoint};

/// What happened to a submitted fix.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FixOutcome {
    pub verdict: Verdict,
    /// The waypoint appended to the active track, if any.
    pub waypoint: Option<Waypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CurrentLocation {
    pub fix: Option<Fix>,
    /// False when the fix is older than the significant time delta.
    pub is_current: bool,
}

#[derive(Debug, Clone)]
enum RecordingState {
    /// Not recording; `last` keeps the finished track readable.
    Idle { last: Option<TrackRecorder> },
    Recording(TrackRecorder),
}

/// Owns the best known fix and the track being recorded.
///
/// Raw fixes from every provider go through [`Session::offer`]; only the ones
/// the arbiter accepts reach the track.
#[derive(Debug, Clone)]
pub struct Session {
    policy: LocationPolicy,
    stopover: StopoverPolicy,
    current: Option<Fix>,
    state: RecordingState,
}

impl Session {
    pub fn new(policy: LocationPolicy, stopover: StopoverPolicy) -> Self {
        Self {
            policy,
            stopover,
            current: None,
            state: RecordingState::Idle { last: None },
        }
    }

    pub fn policy(&self) -> &LocationPolicy {
        &self.policy
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecordingState::Recording(_))
    }

    pub fn current_fix(&self) -> Option<&Fix> {
        self.current.as_ref()
    }

    /// Run `fix` through the arbiter and, when accepted while recording,
    /// append it to the track. Fixes with unusable coordinates are rejected
    /// before arbitration.
    pub fn offer(&mut self, fix: Fix) -> FixOutcome {
        let verdict = if fix.has_valid_coordinates() {
            evaluate(&fix, self.current.as_ref(), &self.policy)
        } else {
            Verdict::Reject(RejectReason::InvalidCoordinates)
        };
        if !verdict.is_accepted() {
            log::debug!(
                "Rejected {} fix at {}: {:?}",
                fix.provider,
                fix.timestamp,
                verdict
            );
            return FixOutcome {
                verdict,
                waypoint: None,
            };
        }

        log::debug!(
            "Accepted {} fix at {} ({:.6}, {:.6}): {:?}",
            fix.provider,
            fix.timestamp,
            fix.latitude,
            fix.longitude,
            verdict
        );
        self.current = Some(fix.clone());

        let waypoint = match &mut self.state {
            RecordingState::Recording(recorder) => Some(recorder.add_fix(fix)),
            RecordingState::Idle { .. } => None,
        };

        FixOutcome { verdict, waypoint }
    }

    pub fn current_location(&self, now: DateTime<Utc>) -> CurrentLocation {
        CurrentLocation {
            is_current: self
                .current
                .as_ref()
                .is_some_and(|fix| is_current(fix, now, &self.policy)),
            fix: self.current.clone(),
        }
    }

    /// Adopt a previously saved fix, but only while it is still current.
    pub fn restore_location(&mut self, saved: Fix, now: DateTime<Utc>) -> bool {
        if is_current(&saved, now, &self.policy) {
            self.current = Some(saved);
            true
        } else {
            log::debug!("Discarding saved fix from {}", saved.timestamp);
            false
        }
    }

    /// Seed the session from each provider's last known fix when nothing
    /// better is known yet. Returns the fix that was adopted.
    pub fn seed_last_known<I>(&mut self, fixes: I) -> Option<&Fix>
    where
        I: IntoIterator<Item = Fix>,
    {
        if self.current.is_none() {
            self.current = determine_last_known_location(fixes, &self.policy);
        }
        self.current.as_ref()
    }

    pub fn start_recording(&mut self) -> Result<TrackSummary, SessionError> {
        self.start_recording_at(Utc::now())
    }

    /// Begin a fresh track, replacing any finished one.
    pub fn start_recording_at(&mut self, now: DateTime<Utc>) -> Result<TrackSummary, SessionError> {
        if self.is_recording() {
            return Err(SessionError::AlreadyRecording);
        }
        let recorder = TrackRecorder::starting_at(now, self.stopover);
        let summary = recorder.track().summary();
        log::info!("Recording track {} started at {}", summary.id, now);

        self.state = RecordingState::Recording(recorder);
        Ok(summary)
    }

    pub fn stop_recording(&mut self) -> Result<TrackSummary, SessionError> {
        self.stop_recording_at(Utc::now())
    }

    pub fn stop_recording_at(&mut self, now: DateTime<Utc>) -> Result<TrackSummary, SessionError> {
        match std::mem::replace(&mut self.state, RecordingState::Idle { last: None }) {
            RecordingState::Recording(mut recorder) => {
                recorder.end_recording_at(now);
                let summary = recorder.track().summary();
                log::info!(
                    "Recording track {} stopped: {} waypoints, {:.0} m",
                    summary.id,
                    summary.waypoint_count,
                    summary.total_distance_m
                );
                self.state = RecordingState::Idle {
                    last: Some(recorder),
                };
                Ok(summary)
            }
            idle => {
                self.state = idle;
                Err(SessionError::NotRecording)
            }
        }
    }

    pub fn set_step_count(&mut self, step_count: f64) -> Result<(), SessionError> {
        self.recorder_mut()?.set_step_count(step_count);
        Ok(())
    }

    pub fn set_duration(&mut self, duration: Duration) -> Result<(), SessionError> {
        self.recorder_mut()?.set_duration(duration);
        Ok(())
    }

    /// The track being recorded, or the last finished one.
    pub fn track(&self) -> Option<&Track> {
        match &self.state {
            RecordingState::Recording(recorder) => Some(recorder.track()),
            RecordingState::Idle { last } => last.as_ref().map(TrackRecorder::track),
        }
    }

    pub fn summary(&self) -> Option<TrackSummary> {
        self.track().map(Track::summary)
    }

    pub fn waypoints(&self) -> Vec<Waypoint> {
        self.track()
            .map(|t| t.waypoints().to_vec())
            .unwrap_or_default()
    }

    fn recorder_mut(&mut self) -> Result<&mut TrackRecorder, SessionError> {
        match &mut self.state {
            RecordingState::Recording(recorder) => Ok(recorder),
            RecordingState::Idle { last } => last.as_mut().ok_or(SessionError::NoTrack),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LocationPolicy::default(), StopoverPolicy::default())
    }
}
