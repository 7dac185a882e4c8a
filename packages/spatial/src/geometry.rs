//! Planar geometry helpers operating on projected coordinates.

use geo::{Area, ConvexHull, Coord, Geometry, LineString, MultiPoint, Point, Polygon};

/// Squared Euclidean distance between two projected coordinates.
#[must_use]
pub fn squared_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx.mul_add(dx, dy * dy)
}

/// Euclidean distance between two projected coordinates.
#[must_use]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Population standard deviation of all pairwise distances.
///
/// Returns `None` for fewer than two points. Uses Welford's running update
/// so the `n (n - 1) / 2` distances are never materialized.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pairwise_distance_std(coords: &[Coord<f64>]) -> Option<f64> {
    if coords.len() < 2 {
        return None;
    }

    let mut count = 0u64;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (i, a) in coords.iter().enumerate() {
        for b in &coords[i + 1..] {
            let d = distance(*a, *b);
            count += 1;
            let delta = d - mean;
            mean += delta / count as f64;
            m2 += delta * (d - mean);
        }
    }

    Some((m2 / count as f64).sqrt())
}

/// Boundary enclosing a set of projected coordinates.
///
/// One distinct location yields a [`Point`], two yield a [`LineString`]
/// segment, and three or more yield the convex hull [`Polygon`]. Collinear
/// locations have a zero-area hull and yield the segment between the two
/// farthest-apart locations instead. Returns `None` for an empty input.
#[must_use]
pub fn convex_boundary(coords: &[Coord<f64>]) -> Option<Geometry<f64>> {
    let first = *coords.first()?;
    let mut distinct: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        if !distinct.contains(c) {
            distinct.push(*c);
        }
    }

    Some(match distinct.len() {
        1 => Geometry::Point(Point::from(first)),
        2 => Geometry::LineString(LineString::from(distinct)),
        _ => {
            let (a, b) = farthest_pair(&distinct);
            let points: MultiPoint<f64> = distinct.into_iter().map(Point::from).collect();
            let hull = points.convex_hull();
            if hull.unsigned_area() <= f64::EPSILON * squared_distance(a, b) {
                Geometry::LineString(LineString::from(vec![a, b]))
            } else {
                Geometry::Polygon(hull)
            }
        }
    })
}

/// The two coordinates farthest apart, in input order. Needs at least two.
fn farthest_pair(coords: &[Coord<f64>]) -> (Coord<f64>, Coord<f64>) {
    let mut best = (coords[0], coords[coords.len() - 1]);
    let mut best_d = squared_distance(best.0, best.1);
    for (i, a) in coords.iter().enumerate() {
        for b in &coords[i + 1..] {
            let d = squared_distance(*a, *b);
            if d > best_d {
                best = (*a, *b);
                best_d = d;
            }
        }
    }
    best
}

/// Regular polygon approximating a circle of `radius` around `center`.
///
/// The exterior ring has `segments` vertices plus the closing vertex.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn circle(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let segments = segments.max(3);
    let ring: Vec<Coord<f64>> = (0..=segments)
        .map(|i| {
            let theta = std::f64::consts::TAU * (i % segments) as f64 / segments as f64;
            Coord {
                x: radius.mul_add(theta.cos(), center.x),
                y: radius.mul_add(theta.sin(), center.y),
            }
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}
