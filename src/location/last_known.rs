use super::arbiter::{is_better_location, LocationPolicy};
use super::types::Fix;

/// Pick the best of the last known fixes reported by each provider.
///
/// Fixes are folded through the arbiter in the given order, so the result is
/// whatever a live stream delivering them in that order would have settled on.
pub fn determine_last_known_location<I>(fixes: I, policy: &LocationPolicy) -> Option<Fix>
where
    I: IntoIterator<Item = Fix>,
{
    fixes.into_iter().fold(None, |best, candidate| {
        if is_better_location(&candidate, best.as_ref(), policy) {
            Some(candidate)
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Provider;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_no_fixes() {
        assert_eq!(
            determine_last_known_location(Vec::new(), &LocationPolicy::default()),
            None
        );
    }

    #[test]
    fn test_prefers_accurate_gps_over_contemporaneous_network() {
        let gps = Fix::new(1.0, 1.0, Provider::Gps, base()).with_accuracy(8.0);
        let network =
            Fix::new(1.1, 1.1, Provider::Network, base() + Duration::seconds(30)).with_accuracy(900.0);

        let best = determine_last_known_location(vec![gps.clone(), network], &LocationPolicy::default());
        assert_eq!(best, Some(gps));
    }

    #[test]
    fn test_prefers_fresh_network_over_stale_gps() {
        let gps = Fix::new(1.0, 1.0, Provider::Gps, base()).with_accuracy(8.0);
        let network =
            Fix::new(1.1, 1.1, Provider::Network, base() + Duration::minutes(10)).with_accuracy(900.0);

        let best = determine_last_known_location(vec![gps, network.clone()], &LocationPolicy::default());
        assert_eq!(best, Some(network));
    }
}
