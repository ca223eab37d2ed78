//! Great-circle distance on a spherical Earth.

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// A point in decimal degrees. Values are not range-checked.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Haversine distance in miles from `from` to `to`.
///
/// `a` is clamped into `[0, 1]` before the square root and arcsine, so
/// coincident and antipodal points never produce `NaN` through rounding.
#[must_use]
pub fn haversine_miles(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = to.lon.to_radians() - from.lon.to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.max(0.0).sqrt().min(1.0).asin();

    EARTH_RADIUS_MILES * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHILLY: GeoPoint = GeoPoint::new(39.9526, -75.1652);
    const NYC: GeoPoint = GeoPoint::new(40.7128, -74.0060);

    #[test]
    fn same_point_is_zero() {
        assert_eq!(haversine_miles(PHILLY, PHILLY), 0.0);
        assert_eq!(haversine_miles(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.0)), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = haversine_miles(PHILLY, NYC);
        let back = haversine_miles(NYC, PHILLY);
        assert!((there - back).abs() < 1e-9, "{there} != {back}");
    }

    #[test]
    fn philadelphia_to_new_york_is_about_eighty_miles() {
        let d = haversine_miles(PHILLY, NYC);
        assert!((78.0..83.0).contains(&d), "unexpected distance {d}");
    }

    #[test]
    fn tenth_of_a_degree_diagonal_near_forty_north() {
        let d = haversine_miles(GeoPoint::new(40.0, -75.0), GeoPoint::new(40.1, -75.1));
        assert!((8.6..8.8).contains(&d), "unexpected distance {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = haversine_miles(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!(!d.is_nan());
        let half = std::f64::consts::PI * EARTH_RADIUS_MILES;
        assert!((d - half).abs() < 1e-6, "{d} vs {half}");

        let poles = haversine_miles(GeoPoint::new(90.0, 0.0), GeoPoint::new(-90.0, 0.0));
        assert!(!poles.is_nan());
        assert!((poles - half).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_coordinates_still_yield_a_number() {
        let d = haversine_miles(GeoPoint::new(120.0, 400.0), GeoPoint::new(-95.0, -361.0));
        assert!(d.is_finite());
        assert!(d >= 0.0);
    }
}
