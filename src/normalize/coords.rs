//! Coordinate normalizer — classifies a raw coordinate pair and converts it
//! to canonical geographic (WGS84) and projected (Web-Mercator) forms.
//!
//! Backends do not reliably say which coordinate system a feature uses, so
//! classification is an ordered guard chain over magnitudes. The chain
//! order is load-bearing; each guard only sees coordinates the previous
//! guards declined:
//!
//! 1. explicit state-plane hint from the backend
//! 2. |x| <= 180 and |y| <= 90: already geographic
//! 3. |x| > 1e6 or |y| > 1e6: Web-Mercator
//! 4. magnitudes in the regional metric grid range: regional linear
//!    transform; other plausible projected magnitudes: generic linear
//!    approximation
//! 5. everything else: treat as Web-Mercator
//!
//! Whatever branch ran, the projected pair is recomputed forward from the
//! recovered lat/lon so downstream rendering always sees one projection.

use std::f64::consts::PI;

use crate::catalog::BoundingBox;

/// Spherical Web-Mercator radius (EPSG:3857), meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Coordinate system a backend explicitly declared for its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCrs {
    /// WGS84 degrees.
    Geographic,
    /// Spherical Web-Mercator meters.
    WebMercator,
    /// Regional state-plane grid, US survey feet.
    StatePlane,
}

/// A coordinate pair in both canonical forms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalCoords {
    pub lat: f64,
    pub lon: f64,
    pub projected_x: f64,
    pub projected_y: f64,
}

// ============================================================================
// Regional state-plane constants (California zone 6 style grid, usft)
// ============================================================================

const USFT_TO_M: f64 = 0.304_800_609_6;
const STATE_PLANE_FALSE_EASTING_USFT: f64 = 6_561_666.667;
const STATE_PLANE_FALSE_NORTHING_USFT: f64 = 1_640_416.667;
/// Latitude of grid origin and central meridian for the back-solve.
const STATE_PLANE_LAT0_DEG: f64 = 32.166_666_7;
const STATE_PLANE_LON0_DEG: f64 = -116.25;
/// Meters per degree of latitude, and of longitude at the equator.
const METERS_PER_DEGREE: f64 = 111_320.0;
/// The approximate back-solve is only trustworthy near the zone; results
/// outside this envelope are rejected outright.
const STATE_PLANE_ENVELOPE: BoundingBox = BoundingBox::new(31.0, 35.0, -119.0, -114.0);

// Regional metric grid variant: same origin, metric false easting/northing.
const REGIONAL_METRIC_FALSE_EASTING_M: f64 = 500_000.0;
const REGIONAL_METRIC_FALSE_NORTHING_M: f64 = 200_000.0;

// ============================================================================
// Web-Mercator forward / inverse
// ============================================================================

/// Forward spherical Web-Mercator: WGS84 degrees to meters.
pub fn to_web_mercator(lat: f64, lon: f64) -> (f64, f64) {
    let x = lon.to_radians() * EARTH_RADIUS_M;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M;
    (x, y)
}

/// Inverse spherical Web-Mercator: meters to WGS84 degrees.
pub fn from_web_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x / EARTH_RADIUS_M * 180.0 / PI;
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - PI / 2.0) * 180.0 / PI;
    (lat, lon)
}

// ============================================================================
// State-plane inverse
// ============================================================================

/// Approximate inverse of the regional state-plane projection.
///
/// Removes the false origin, converts survey feet to meters, then linearly
/// back-solves lat/lon around the zone origin. Valid only near the zone;
/// returns `None` outside the envelope.
fn from_state_plane_usft(x: f64, y: f64) -> Option<(f64, f64)> {
    let easting_m = (x - STATE_PLANE_FALSE_EASTING_USFT) * USFT_TO_M;
    let northing_m = (y - STATE_PLANE_FALSE_NORTHING_USFT) * USFT_TO_M;

    let lat = STATE_PLANE_LAT0_DEG + northing_m / METERS_PER_DEGREE;
    let lon = STATE_PLANE_LON0_DEG
        + easting_m / (METERS_PER_DEGREE * lat.to_radians().cos());

    if STATE_PLANE_ENVELOPE.contains(lat, lon) {
        Some((lat, lon))
    } else {
        None
    }
}

/// Same back-solve for the metric variant of the regional grid.
fn from_regional_metric(x: f64, y: f64) -> Option<(f64, f64)> {
    let easting_m = x - REGIONAL_METRIC_FALSE_EASTING_M;
    let northing_m = y - REGIONAL_METRIC_FALSE_NORTHING_M;

    let lat = STATE_PLANE_LAT0_DEG + northing_m / METERS_PER_DEGREE;
    let lon = STATE_PLANE_LON0_DEG
        + easting_m / (METERS_PER_DEGREE * lat.to_radians().cos());

    if STATE_PLANE_ENVELOPE.contains(lat, lon) {
        Some((lat, lon))
    } else {
        None
    }
}

/// Generic linear fallback for projected-looking magnitudes that fit no
/// known grid: divide by the smallest power of ten that brings the pair
/// into degree range.
fn generic_linear(x: f64, y: f64) -> (f64, f64) {
    let mut scale = 1.0;
    while (x / scale).abs() > 180.0 || (y / scale).abs() > 90.0 {
        scale *= 10.0;
    }
    (y / scale, x / scale)
}

// ============================================================================
// Classification ranges
// ============================================================================

fn in_regional_metric_range(x: f64, y: f64) -> bool {
    (180.0..=1_000_000.0).contains(&x) && (180.0..=1_000_000.0).contains(&y)
}

fn plausibly_projected(x: f64, y: f64) -> bool {
    x.abs() >= 1_000.0 || y.abs() >= 1_000.0
}

// ============================================================================
// Entry point
// ============================================================================

/// Classify and convert one raw coordinate pair.
///
/// Returns `None` when the conversion lands outside geographic bounds or
/// outside the dataset's expected region; such features are dropped, never
/// forwarded with wrong coordinates.
pub fn normalize(
    x: f64,
    y: f64,
    hint: Option<SourceCrs>,
    bounds: Option<&BoundingBox>,
) -> Option<CanonicalCoords> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    let (lat, lon) = match hint {
        Some(SourceCrs::StatePlane) => from_state_plane_usft(x, y)?,
        Some(SourceCrs::Geographic) => (y, x),
        Some(SourceCrs::WebMercator) => from_web_mercator(x, y),
        None => {
            if x.abs() <= 180.0 && y.abs() <= 90.0 {
                (y, x)
            } else if x.abs() > 1_000_000.0 || y.abs() > 1_000_000.0 {
                from_web_mercator(x, y)
            } else if in_regional_metric_range(x, y) {
                from_regional_metric(x, y)?
            } else if plausibly_projected(x, y) {
                generic_linear(x, y)
            } else {
                from_web_mercator(x, y)
            }
        }
    };

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    if let Some(b) = bounds {
        if !b.contains(lat, lon) {
            return None;
        }
    }

    let (projected_x, projected_y) = to_web_mercator(lat, lon);
    Some(CanonicalCoords { lat, lon, projected_x, projected_y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ABU_DHABI_BOUNDS, LA_MESA_BOUNDS};

    #[test]
    fn test_geographic_passthrough() {
        let c = normalize(54.37, 24.45, None, Some(&ABU_DHABI_BOUNDS)).unwrap();
        assert_eq!(c.lon, 54.37);
        assert_eq!(c.lat, 24.45);
        assert!(c.projected_x > 1_000_000.0);
    }

    #[test]
    fn test_mercator_magnitude_classification() {
        // Raw pair from a Web-Mercator service, no hint.
        let c = normalize(-9_816_341.55, 5_128_058.97, None, None).unwrap();
        assert!((-90.0..=90.0).contains(&c.lat));
        assert!((-180.0..=180.0).contains(&c.lon));
        // Great Lakes region, roughly.
        assert!((c.lon - -88.18).abs() < 0.1, "lon was {}", c.lon);
        assert!((c.lat - 41.84).abs() < 0.1, "lat was {}", c.lat);
    }

    #[test]
    fn test_mercator_roundtrip() {
        let (x, y) = to_web_mercator(24.45, 54.37);
        let (lat, lon) = from_web_mercator(x, y);
        assert!((lat - 24.45).abs() < 1e-3);
        assert!((lon - 54.37).abs() < 1e-3);
    }

    #[test]
    fn test_state_plane_hint() {
        let c = normalize(6_316_000.0, 1_853_000.0, Some(SourceCrs::StatePlane), Some(&LA_MESA_BOUNDS))
            .unwrap();
        assert!(LA_MESA_BOUNDS.contains(c.lat, c.lon));
        assert!((c.lat - 32.75).abs() < 0.1, "lat was {}", c.lat);
        assert!((c.lon - -117.05).abs() < 0.1, "lon was {}", c.lon);
    }

    #[test]
    fn test_state_plane_rejects_far_coordinates() {
        // Way outside the zone: the linear back-solve is meaningless there.
        assert!(normalize(20_000_000.0, 9_000_000.0, Some(SourceCrs::StatePlane), None).is_none());
    }

    #[test]
    fn test_out_of_region_dropped() {
        // Valid geographic pair, but not in the configured dataset region.
        assert!(normalize(2.35, 48.85, None, Some(&ABU_DHABI_BOUNDS)).is_none());
    }

    #[test]
    fn test_non_finite_dropped() {
        assert!(normalize(f64::NAN, 24.0, None, None).is_none());
        assert!(normalize(54.0, f64::INFINITY, None, None).is_none());
    }

    #[test]
    fn test_canonical_projection_recomputed() {
        // Even already-projected input gets its canonical pair recomputed
        // from the recovered lat/lon.
        let c = normalize(6_052_024.0, 2_808_687.0, None, None).unwrap();
        let (fx, fy) = to_web_mercator(c.lat, c.lon);
        assert!((c.projected_x - fx).abs() < 1e-6);
        assert!((c.projected_y - fy).abs() < 1e-6);
    }
}
