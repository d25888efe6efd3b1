use crate::location::Fix;

/// Mean Earth radius (IUGG), meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine distance between two coordinates in meters.
pub fn haversine_distance_m(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> f64 {
    let lat1 = lat1_deg.to_radians();
    let lat2 = lat2_deg.to_radians();
    let dlat = (lat2_deg - lat1_deg).to_radians();
    let dlon = (lon2_deg - lon1_deg).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

pub fn distance_between(from: &Fix, to: &Fix) -> f64 {
    haversine_distance_m(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_distance_m(48.1, 11.5, 48.1, 11.5), 0.0);
    }

    #[test]
    fn test_thousandth_degree_at_equator() {
        let d = haversine_distance_m(0.0, 0.0, 0.0, 0.001);
        assert!((d - 111.2).abs() < 0.5, "got {d}");
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_distance_m(10.0, 20.0, 11.0, 20.0);
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_symmetric() {
        let a = haversine_distance_m(52.52, 13.405, 48.8566, 2.3522);
        let b = haversine_distance_m(48.8566, 2.3522, 52.52, 13.405);
        assert!((a - b).abs() < 1e-6);
        // Berlin to Paris
        assert!((a - 878_000.0).abs() < 5_000.0, "got {a}");
    }

    #[test]
    fn test_antipodes_do_not_produce_nan() {
        let d = haversine_distance_m(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }
}
