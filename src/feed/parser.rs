use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::config::parse_duration;
use crate::location::{Fix, Provider};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("fix {0}: {1}")]
    Fix(usize, String),
    #[error("invalid start time: {0}")]
    Start(String),
}

/// A recorded stream of raw fixes, in delivery order.
#[derive(Debug, Clone)]
pub struct Feed {
    pub start: DateTime<Utc>,
    pub fixes: Vec<Fix>,
    pub steps: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum TimeExpr {
    Relative(Duration),
    Absolute(DateTime<Utc>),
}

impl TimeExpr {
    /// `None` when the offset leaves chrono's representable range.
    pub fn resolve(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeExpr::Relative(d) => start.checked_add_signed(*d),
            TimeExpr::Absolute(dt) => Some(*dt),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawFeed {
    start: Option<String>,
    #[serde(default)]
    steps: Option<f64>,
    fixes: Vec<RawFix>,
}

#[derive(Debug, Deserialize)]
struct RawFix {
    lat: f64,
    lon: f64,
    #[serde(default)]
    accuracy: Option<f64>,
    provider: Provider,
    time: String,
}

impl Feed {
    pub fn from_str(yaml: &str) -> Result<Self, FeedError> {
        Self::from_str_at(yaml, Utc::now())
    }

    /// Parse a feed, resolving relative times against `default_start` when
    /// the feed does not name its own start.
    pub fn from_str_at(yaml: &str, default_start: DateTime<Utc>) -> Result<Self, FeedError> {
        let raw: RawFeed = serde_yaml::from_str(yaml)?;

        let start = match raw.start {
            Some(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| FeedError::Start(e.to_string()))?,
            None => default_start,
        };

        let fixes = raw
            .fixes
            .into_iter()
            .enumerate()
            .map(|(i, f)| parse_fix(i, f, start))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Feed {
            start,
            fixes,
            steps: raw.steps,
        })
    }
}

fn parse_fix(i: usize, raw: RawFix, start: DateTime<Utc>) -> Result<Fix, FeedError> {
    let err = |msg: &str| FeedError::Fix(i, msg.into());

    if !(-90.0..=90.0).contains(&raw.lat) {
        return Err(err(&format!("latitude out of range: {}", raw.lat)));
    }
    if !(-180.0..=180.0).contains(&raw.lon) {
        return Err(err(&format!("longitude out of range: {}", raw.lon)));
    }

    let timestamp = parse_time(&raw.time)
        .map_err(|e| err(&e))?
        .resolve(start)
        .ok_or_else(|| err("time out of range"))?;

    Ok(Fix {
        latitude: raw.lat,
        longitude: raw.lon,
        accuracy: raw.accuracy,
        provider: raw.provider,
        timestamp,
    })
}

pub fn parse_time(s: &str) -> Result<TimeExpr, String> {
    let s = s.trim();

    // Relative: T+10s, T-5m
    if s.to_lowercase().starts_with('t') {
        let rest = &s[1..];
        let (neg, rest) = split_sign(rest);
        let dur = parse_duration(rest)?;
        return Ok(TimeExpr::Relative(if neg { -dur } else { dur }));
    }

    // Absolute with offset: 2026-01-12T10:00:00Z + 10s
    if let Some(idx) = s.rfind(['+', '-']) {
        if idx > 10 {
            if let Ok(base) = DateTime::parse_from_rfc3339(s[..idx].trim()) {
                let (neg, rest) = split_sign(&s[idx..]);
                let dur = parse_duration(rest)?;
                let base = base.with_timezone(&Utc);
                let resolved = if neg {
                    base.checked_sub_signed(dur)
                } else {
                    base.checked_add_signed(dur)
                };
                return resolved
                    .map(TimeExpr::Absolute)
                    .ok_or_else(|| "time out of range".to_string());
            }
        }
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| TimeExpr::Absolute(dt.with_timezone(&Utc)))
        .map_err(|e| e.to_string())
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_feed() {
        let yaml = r#"
start: 2026-01-12T10:00:00Z
steps: 321
fixes:
  - { lat: 0.0, lon: 0.0, accuracy: 8, provider: gps, time: T+0s }
  - { lat: 0.0, lon: 0.001, provider: network, time: "2026-01-12T10:00:10Z" }
  - { lat: 0.0, lon: 0.001, accuracy: 4.5, provider: passive, time: "2026-01-12T10:00:10Z + 10s" }
"#;
        let feed = Feed::from_str(yaml).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0).unwrap();

        assert_eq!(feed.start, start);
        assert_eq!(feed.steps, Some(321.0));
        assert_eq!(feed.fixes.len(), 3);
        assert_eq!(feed.fixes[0].accuracy, Some(8.0));
        assert_eq!(feed.fixes[0].timestamp, start);
        assert_eq!(feed.fixes[1].accuracy, None);
        assert_eq!(feed.fixes[1].provider, Provider::Network);
        assert_eq!(feed.fixes[1].timestamp, start + Duration::seconds(10));
        assert_eq!(feed.fixes[2].provider, Provider::Passive);
        assert_eq!(feed.fixes[2].timestamp, start + Duration::seconds(20));
    }

    #[test]
    fn test_relative_times_use_default_start() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let yaml = "fixes:\n  - { lat: 1, lon: 2, provider: gps, time: T+1m }\n  - { lat: 1, lon: 2, provider: gps, time: t-30s }\n";
        let feed = Feed::from_str_at(yaml, start).unwrap();

        assert_eq!(feed.start, start);
        assert_eq!(feed.fixes[0].timestamp, start + Duration::minutes(1));
        assert_eq!(feed.fixes[1].timestamp, start - Duration::seconds(30));
    }

    #[test]
    fn test_errors_carry_fix_index() {
        let yaml = "fixes:\n  - { lat: 1, lon: 2, provider: gps, time: T+0s }\n  - { lat: 95, lon: 2, provider: gps, time: T+1s }\n";
        let err = Feed::from_str(yaml).unwrap_err();
        assert!(matches!(err, FeedError::Fix(1, _)), "got {err}");

        let yaml = "fixes:\n  - { lat: 1, lon: 2, provider: gps, time: yesterday }\n";
        assert!(matches!(Feed::from_str(yaml), Err(FeedError::Fix(0, _))));
    }

    #[test]
    fn test_time_beyond_calendar_range_is_an_error() {
        let yaml = "start: 2026-01-12T10:00:00Z\nfixes:\n  - { lat: 1, lon: 2, provider: gps, time: T+300000y }\n";
        match Feed::from_str(yaml) {
            Err(FeedError::Fix(0, msg)) => assert_eq!(msg, "time out of range"),
            other => panic!("expected fix error, got {other:?}"),
        }

        let yaml = "fixes:\n  - { lat: 1, lon: 2, provider: gps, time: \"2026-01-12T10:00:00Z - 300000y\" }\n";
        assert!(matches!(Feed::from_str(yaml), Err(FeedError::Fix(0, _))));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let yaml = "fixes:\n  - { lat: 1, lon: 2, provider: wifi, time: T+0s }\n";
        assert!(matches!(Feed::from_str(yaml), Err(FeedError::Yaml(_))));
    }

    #[test]
    fn test_invalid_start() {
        let yaml = "start: noon\nfixes: []\n";
        assert!(matches!(Feed::from_str(yaml), Err(FeedError::Start(_))));
    }
}
