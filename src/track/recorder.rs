use chrono::{DateTime, Duration, Utc};

use super::geodesy::distance_between;
use super::stopover::StopoverPolicy;
use super::types::{Track, Waypoint};
use crate::location::Fix;

/// Folds accepted fixes into a [`Track`].
///
/// Calls must be serialized: the recorder is the only writer of its track.
#[derive(Debug, Clone)]
pub struct TrackRecorder {
    track: Track,
    stopover: StopoverPolicy,
}

impl TrackRecorder {
    pub fn new(stopover: StopoverPolicy) -> Self {
        Self::starting_at(Utc::now(), stopover)
    }

    pub fn starting_at(recording_start: DateTime<Utc>, stopover: StopoverPolicy) -> Self {
        Self {
            track: Track::new(recording_start),
            stopover,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn into_track(self) -> Track {
        self.track
    }

    /// Append `fix` to the track and return the new waypoint.
    ///
    /// The previous waypoint is marked as a stopover when `fix` shows the
    /// device stayed put. A first waypoint is never marked.
    ///
    /// Coordinates must be finite; [`Session::offer`](crate::session::Session::offer)
    /// rejects fixes that are not.
    pub fn add_fix(&mut self, fix: Fix) -> Waypoint {
        let track = &mut self.track;
        let count = track.waypoints.len();

        let segment = track
            .waypoints
            .last()
            .map(|last| distance_between(&last.fix, &fix))
            .unwrap_or(0.0);
        let total = track.total_distance + segment;

        if count > 1 {
            let last = &mut track.waypoints[count - 1];
            if self.stopover.is_stationary(&last.fix, &fix, segment) {
                log::debug!(
                    "Waypoint {} marked as stopover ({:.1} m to next fix)",
                    count - 1,
                    segment
                );
                last.is_stopover = true;
                track.stopover_count += 1;
            }
        }

        let waypoint = Waypoint {
            fix,
            is_stopover: false,
            distance_from_start: total,
        };
        track.waypoints.push(waypoint.clone());
        track.total_distance = total;

        waypoint
    }

    pub fn end_recording(&mut self) {
        self.end_recording_at(Utc::now());
    }

    /// Repeated calls move the stop time forward; it never precedes the start.
    pub fn end_recording_at(&mut self, now: DateTime<Utc>) {
        self.track.recording_stop = now.max(self.track.recording_start());
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.track.duration = duration;
    }

    pub fn set_step_count(&mut self, step_count: f64) {
        self.track.step_count = step_count;
    }
}
