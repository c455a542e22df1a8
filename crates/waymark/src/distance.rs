//! Great-circle distance between coordinate pairs.

use waymark_data::Coordinates;

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Haversine distance in miles.
///
/// Symmetric, total, and exactly zero for identical points.
pub fn distance_miles(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = (b.latitude - a.latitude).abs().to_radians();
    let dlon = (b.longitude - a.longitude).abs().to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_MILES * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUSTIN: Coordinates = Coordinates::new(-97.7431, 30.2672);
    const ROUND_ROCK: Coordinates = Coordinates::new(-97.6789, 30.5083);
    const RENO: Coordinates = Coordinates::new(-119.8138, 39.5296);

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_miles(AUSTIN, AUSTIN), 0.0);
        assert_eq!(distance_miles(RENO, RENO), 0.0);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(distance_miles(AUSTIN, RENO), distance_miles(RENO, AUSTIN));
        assert_eq!(
            distance_miles(AUSTIN, ROUND_ROCK),
            distance_miles(ROUND_ROCK, AUSTIN)
        );
    }

    #[test]
    fn test_known_distances() {
        let d = distance_miles(AUSTIN, ROUND_ROCK);
        assert!((d - 17.1).abs() < 1.0, "Expected ~17 miles, got {d}");

        let d = distance_miles(AUSTIN, RENO);
        assert!((d - 1390.0).abs() < 30.0, "Expected ~1390 miles, got {d}");
    }

    #[test]
    fn test_antipodal_points_are_half_circumference() {
        let d = distance_miles(Coordinates::new(0.0, 0.0), Coordinates::new(180.0, 0.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_MILES).abs() < 1e-6);
    }
}
