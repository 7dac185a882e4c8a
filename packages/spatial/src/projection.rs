//! Spherical Web Mercator (EPSG:3857) projection.
//!
//! Geographic coordinates are WGS84 degrees with x = longitude and
//! y = latitude. Projected coordinates are meters.

use geo::{Coord, MapCoords};

/// Sphere radius used by Web Mercator, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude at which Web Mercator becomes square; inputs are clamped to it.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Projects a WGS84 coordinate (degrees) to Web Mercator meters.
#[must_use]
pub fn project(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coord {
        x: EARTH_RADIUS_M * coord.x.to_radians(),
        y: EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Converts a Web Mercator coordinate (meters) back to WGS84 degrees.
#[must_use]
pub fn unproject(coord: Coord<f64>) -> Coord<f64> {
    let lat = 2.0f64.mul_add(
        (coord.y / EARTH_RADIUS_M).exp().atan(),
        -std::f64::consts::FRAC_PI_2,
    );
    Coord {
        x: (coord.x / EARTH_RADIUS_M).to_degrees(),
        y: lat.to_degrees(),
    }
}

/// Projects every coordinate of a WGS84 geometry to Web Mercator.
pub fn to_projected<G>(geometry: &G) -> G::Output
where
    G: MapCoords<f64, f64>,
{
    geometry.map_coords(project)
}

/// Reprojects every coordinate of a Web Mercator geometry to WGS84.
pub fn to_geographic<G>(geometry: &G) -> G::Output
where
    G: MapCoords<f64, f64>,
{
    geometry.map_coords(unproject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_origin() {
        let p = project(Coord { x: 0.0, y: 0.0 });
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn antimeridian_maps_to_half_circumference() {
        let p = project(Coord { x: 180.0, y: 0.0 });
        assert!((p.x - 20_037_508.342_789_244).abs() < 1e-6);
    }

    #[test]
    fn round_trip_within_tolerance() {
        for (lon, lat) in [(68.5, 23.5), (80.3, 12.8), (-151.2, -33.9), (0.0, 85.0)] {
            let back = unproject(project(Coord { x: lon, y: lat }));
            assert!((back.x - lon).abs() < 1e-6, "lon {lon} -> {}", back.x);
            assert!((back.y - lat).abs() < 1e-6, "lat {lat} -> {}", back.y);
        }
    }

    #[test]
    fn latitude_is_clamped() {
        let p = project(Coord { x: 0.0, y: 90.0 });
        assert!(p.y.is_finite());
    }

    #[test]
    fn geometry_round_trip() {
        let line = geo::LineString::from(vec![(72.8, 20.0), (73.0, 20.5)]);
        let back = to_geographic(&to_projected(&line));
        for (a, b) in line.coords().zip(back.coords()) {
            assert!((a.x - b.x).abs() < 1e-6);
            assert!((a.y - b.y).abs() < 1e-6);
        }
    }
}
