//! Property tests for coordinate classification and conversion.

use geopipe::normalize::coords::{from_web_mercator, normalize, to_web_mercator};
use proptest::prelude::*;

proptest! {
    /// Forward then inverse Web-Mercator recovers the point within 1e-3
    /// degrees. Latitudes are kept off the projection's polar asymptote.
    #[test]
    fn mercator_roundtrip(lat in -85.0f64..85.0, lon in -180.0f64..180.0) {
        let (x, y) = to_web_mercator(lat, lon);
        let (lat2, lon2) = from_web_mercator(x, y);
        prop_assert!((lat - lat2).abs() < 1e-3, "lat {lat} -> {lat2}");
        prop_assert!((lon - lon2).abs() < 1e-3, "lon {lon} -> {lon2}");
    }

    /// Whatever branch of the classification chain runs, an accepted
    /// conversion is always inside geographic bounds.
    #[test]
    fn accepted_conversions_are_in_bounds(
        x in -25_000_000.0f64..25_000_000.0,
        y in -25_000_000.0f64..25_000_000.0,
    ) {
        if let Some(c) = normalize(x, y, None, None) {
            prop_assert!((-90.0..=90.0).contains(&c.lat));
            prop_assert!((-180.0..=180.0).contains(&c.lon));
            prop_assert!(c.projected_x.is_finite());
            prop_assert!(c.projected_y.is_finite());
        }
    }

    /// Geographic input is passed through untouched, and the canonical
    /// projected pair always agrees with the forward formula.
    #[test]
    fn geographic_passthrough_is_exact(lat in -85.0f64..85.0, lon in -180.0f64..180.0) {
        let c = normalize(lon, lat, None, None).expect("geographic input accepted");
        prop_assert_eq!(c.lat, lat);
        prop_assert_eq!(c.lon, lon);
        let (fx, fy) = to_web_mercator(lat, lon);
        prop_assert_eq!(c.projected_x, fx);
        prop_assert_eq!(c.projected_y, fy);
    }
}
