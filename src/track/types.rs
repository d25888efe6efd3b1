use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::TrackError;
use crate::location::Fix;

/// A recorded fix together with its position along the track.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Waypoint {
    pub fix: Fix,
    /// Set once the following fix shows the device did not move away.
    pub is_stopover: bool,
    /// Cumulative track distance in meters up to and including this point.
    pub distance_from_start: f64,
}

#[derive(Debug, Clone)]
pub struct Track {
    id: Uuid,
    pub(super) waypoints: Vec<Waypoint>,
    pub(super) total_distance: f64,
    pub(super) stopover_count: usize,
    pub(super) duration: Duration,
    pub(super) step_count: f64,
    recording_start: DateTime<Utc>,
    pub(super) recording_stop: DateTime<Utc>,
}

/// Plain snapshot of a track's summary values, metric units.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackSummary {
    pub id: Uuid,
    pub waypoint_count: usize,
    pub total_distance_m: f64,
    pub recording_start: DateTime<Utc>,
    pub recording_stop: DateTime<Utc>,
    pub duration_seconds: i64,
    pub step_count: f64,
    pub stopover_count: usize,
}

impl Track {
    pub fn new(recording_start: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            waypoints: Vec::new(),
            total_distance: 0.0,
            stopover_count: 0,
            duration: Duration::zero(),
            step_count: 0.0,
            recording_start,
            recording_stop: recording_start,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoint_at(&self, index: usize) -> Result<&Waypoint, TrackError> {
        self.waypoints.get(index).ok_or(TrackError::IndexOutOfRange {
            index,
            len: self.waypoints.len(),
        })
    }

    pub fn first_waypoint(&self) -> Result<&Waypoint, TrackError> {
        self.waypoints.first().ok_or(TrackError::Empty)
    }

    pub fn last_waypoint(&self) -> Result<&Waypoint, TrackError> {
        self.waypoints.last().ok_or(TrackError::Empty)
    }

    /// Length of the track in meters, read from the last waypoint.
    pub fn track_length(&self) -> Result<f64, TrackError> {
        self.last_waypoint().map(|w| w.distance_from_start)
    }

    /// Running distance in meters; zero before the first fix.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn stopover_count(&self) -> usize {
        self.stopover_count
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn step_count(&self) -> f64 {
        self.step_count
    }

    pub fn recording_start(&self) -> DateTime<Utc> {
        self.recording_start
    }

    pub fn recording_stop(&self) -> DateTime<Utc> {
        self.recording_stop
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.id,
            waypoint_count: self.waypoints.len(),
            total_distance_m: self.total_distance,
            recording_start: self.recording_start,
            recording_stop: self.recording_stop,
            duration_seconds: self.duration.num_seconds(),
            step_count: self.step_count,
            stopover_count: self.stopover_count,
        }
    }
}
