use geo::GeodesicDistance;

use super::matcher_types::{MatcherError, Point};

pub const DISTANCE_DECIMALS: usize = 5;

/**
 * Geodesic distance in kilometers on the WGS-84 ellipsoid (Karney's inverse
 * solution, which converges for every pair including nearly antipodal ones).
 *
 * Fails only for non-finite coordinates.
 */
pub fn geodesic_distance_km(from: &Point, to: &Point) -> Result<f64, MatcherError> {
    let failure = || MatcherError::DistanceComputationFailure {
        from: (from.lat, from.lon),
        to: (to.lat, to.lon),
    };

    if !from.is_finite() || !to.is_finite() {
        return Err(failure());
    }

    let meters = from.to_geo().geodesic_distance(&to.to_geo());

    if !meters.is_finite() {
        return Err(failure());
    }

    // abs() folds a -0.0 for coincident points into 0.0.
    Ok(meters.abs() / 1000.0)
}

/**
 * Rounds to `DISTANCE_DECIMALS` places, ties to even, on the exact decimal
 * expansion of the double. Fixed precision formatting already does exactly
 * that, so we go through it instead of scaling by a power of ten.
 */
pub fn round_distance(km: f64) -> f64 {
    format!("{:.*}", DISTANCE_DECIMALS, km)
        .parse()
        .unwrap_or(km)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn it_should_be_zero_for_the_same_point() {
        let p = Point::new("P", 19.320921, -103.8088817);

        assert_eq!(geodesic_distance_km(&p, &p).unwrap(), 0.0);
    }

    #[test]
    fn it_should_be_symmetric() {
        let a = Point::new("A", 28.14606, -105.34232);
        let b = Point::new("B", 22.22553, -97.90096);

        let ab = geodesic_distance_km(&a, &b).unwrap();
        let ba = geodesic_distance_km(&b, &a).unwrap();

        assert!((ab - ba).abs() < 1e-9);
        assert_eq!(round_distance(ab), round_distance(ba));
    }

    #[test]
    fn it_should_use_the_ellipsoid_on_the_equator() {
        // a * dlon on the equator, a = 6378137 m.
        let d = geodesic_distance_km(&Point::new("A", 0.0, 0.0), &Point::new("B", 0.0, 0.01))
            .unwrap();

        assert_eq!(round_distance(d), 1.11319);
    }

    #[test]
    fn it_should_differ_from_a_sphere_along_a_meridian() {
        // One degree of latitude at the equator is ~110.574 km on WGS-84,
        // a mean-radius sphere would give ~111.195 km.
        let d = geodesic_distance_km(&Point::new("A", 0.0, 0.0), &Point::new("B", 1.0, 0.0))
            .unwrap();

        assert!((d - 110.574).abs() < 0.001, "distance was {}", d);
    }

    #[test]
    fn it_should_converge_for_nearly_antipodal_points() {
        let origin = Point::new("A", 0.0, 0.0);

        for other in &[Point::new("B", 0.5, 179.7), Point::new("C", 0.0, 179.9)] {
            let d = geodesic_distance_km(&origin, other).unwrap();
            // Exact antipodes on the equator are ~20003.93 km apart.
            assert!(d > 19_900.0 && d < 20_004.0, "distance was {}", d);
        }
    }

    #[test]
    fn it_should_fail_with_non_finite_coordinates() {
        let a = Point::new("A", std::f64::NAN, 0.0);
        let b = Point::new("B", 0.0, 0.0);

        assert_matches!(
            geodesic_distance_km(&a, &b),
            Err(MatcherError::DistanceComputationFailure { .. })
        );
    }

    #[test]
    fn it_should_round_ties_to_even() {
        // Both are exact binary fractions sitting on a 5th decimal tie.
        assert_eq!(round_distance(0.015625), 0.01562);
        assert_eq!(round_distance(0.046875), 0.04688);
    }

    #[test]
    fn it_should_round_to_five_decimals() {
        assert_eq!(round_distance(1.113194907), 1.11319);
        assert_eq!(round_distance(2.000006), 2.00001);
        assert_eq!(round_distance(0.0), 0.0);
    }
}
