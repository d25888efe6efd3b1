use chrono::Duration;
use serde::Deserialize;

use crate::config::deserialize_duration;
use crate::location::Fix;

const DEFAULT_RADIUS_M: f64 = 5.0;
const DEFAULT_MAX_INTERVAL: Duration = Duration::minutes(2);

/// Stationarity test between two consecutive recorded fixes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StopoverPolicy {
    pub radius_m: f64,
    /// Fix pairs further apart in time than this say nothing about a stop.
    #[serde(deserialize_with = "deserialize_duration")]
    pub max_interval: Duration,
}

impl Default for StopoverPolicy {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            max_interval: DEFAULT_MAX_INTERVAL,
        }
    }
}

impl StopoverPolicy {
    /// `distance_m` is the already computed segment length from `last` to `next`.
    pub fn is_stationary(&self, last: &Fix, next: &Fix, distance_m: f64) -> bool {
        let elapsed = next.timestamp - last.timestamp;
        distance_m < self.radius_m && elapsed >= Duration::zero() && elapsed <= self.max_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Provider;
    use chrono::{TimeZone, Utc};

    fn fix_at(seconds: i64) -> Fix {
        Fix::new(0.0, 0.0, Provider::Gps, Utc.timestamp_opt(seconds, 0).unwrap())
    }

    #[test]
    fn test_close_and_recent_is_stationary() {
        let policy = StopoverPolicy::default();
        assert!(policy.is_stationary(&fix_at(0), &fix_at(10), 0.0));
        assert!(policy.is_stationary(&fix_at(0), &fix_at(0), 4.9));
        assert!(policy.is_stationary(&fix_at(0), &fix_at(120), 1.0));
    }

    #[test]
    fn test_moving_is_not_stationary() {
        let policy = StopoverPolicy::default();
        assert!(!policy.is_stationary(&fix_at(0), &fix_at(10), 5.0));
        assert!(!policy.is_stationary(&fix_at(0), &fix_at(10), 111.0));
    }

    #[test]
    fn test_outside_interval_is_not_stationary() {
        let policy = StopoverPolicy::default();
        assert!(!policy.is_stationary(&fix_at(0), &fix_at(121), 0.0));
        assert!(!policy.is_stationary(&fix_at(10), &fix_at(0), 0.0));
    }
}
