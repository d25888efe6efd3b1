use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::Fix;
use crate::config::deserialize_duration;

const DEFAULT_SIGNIFICANT_TIME_DELTA: Duration = Duration::minutes(2);
const DEFAULT_SIGNIFICANT_ACCURACY_DELTA_M: f64 = 200.0;

/// Thresholds used when deciding between two fixes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocationPolicy {
    /// Fixes further apart than this are not comparable by accuracy.
    #[serde(deserialize_with = "deserialize_duration")]
    pub significant_time_delta: Duration,
    pub significant_accuracy_delta_m: f64,
}

impl Default for LocationPolicy {
    fn default() -> Self {
        Self {
            significant_time_delta: DEFAULT_SIGNIFICANT_TIME_DELTA,
            significant_accuracy_delta_m: DEFAULT_SIGNIFICANT_ACCURACY_DELTA_M,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AcceptReason {
    NoCurrentFix,
    CurrentIsStale,
    MoreAccurate,
    NewerAndNotLessAccurate,
    NewerFromSameProvider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    CandidateIsStale,
    LessAccurate,
    InvalidCoordinates,
}

/// Outcome of comparing a candidate fix against the current best one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Accept(AcceptReason),
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accept(_))
    }
}

/// Decide whether `candidate` should replace `current` as the best known fix.
///
/// Rules are checked in order and the first match decides:
/// 1. no current fix: accept
/// 2. candidate newer by more than the significant time delta: accept
/// 3. candidate older by more than the significant time delta: reject
/// 4. otherwise compare accuracy, recency and provider
pub fn evaluate(candidate: &Fix, current: Option<&Fix>, policy: &LocationPolicy) -> Verdict {
    let Some(current) = current else {
        return Verdict::Accept(AcceptReason::NoCurrentFix);
    };

    let time_delta = candidate.timestamp - current.timestamp;
    if time_delta > policy.significant_time_delta {
        return Verdict::Accept(AcceptReason::CurrentIsStale);
    }
    if time_delta < -policy.significant_time_delta {
        return Verdict::Reject(RejectReason::CandidateIsStale);
    }

    let is_newer = time_delta > Duration::zero();

    let accuracy_delta = accuracy_delta(candidate, current);
    let is_less_accurate = accuracy_delta > 0.0;
    let is_more_accurate = accuracy_delta < 0.0;
    let is_significantly_less_accurate = accuracy_delta > policy.significant_accuracy_delta_m;
    let is_from_same_provider = candidate.provider == current.provider;

    if is_more_accurate {
        Verdict::Accept(AcceptReason::MoreAccurate)
    } else if is_newer && !is_less_accurate {
        Verdict::Accept(AcceptReason::NewerAndNotLessAccurate)
    } else if is_newer && !is_significantly_less_accurate && is_from_same_provider {
        Verdict::Accept(AcceptReason::NewerFromSameProvider)
    } else {
        Verdict::Reject(RejectReason::LessAccurate)
    }
}

pub fn is_better_location(candidate: &Fix, current: Option<&Fix>, policy: &LocationPolicy) -> bool {
    evaluate(candidate, current, policy).is_accepted()
}

/// A fix is current when it is no older than the significant time delta.
pub fn is_current(fix: &Fix, now: DateTime<Utc>, policy: &LocationPolicy) -> bool {
    now - fix.timestamp <= policy.significant_time_delta
}

// Unknown accuracy counts as infinite uncertainty.
fn accuracy_delta(candidate: &Fix, current: &Fix) -> f64 {
    match (candidate.known_accuracy(), current.known_accuracy()) {
        (Some(a), Some(b)) => a - b,
        (None, None) => 0.0,
        (None, Some(_)) => f64::INFINITY,
        (Some(_), None) => f64::NEG_INFINITY,
    }
}
