#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Spatial primitives for the hazard analysis pipeline.
//!
//! All distance-sensitive computations (density bandwidth, clustering
//! radius, neighbor graphs, buffering) happen in the Web Mercator
//! projection provided by [`projection`]. [`PointIndex`] wraps an R-tree
//! over projected points for fixed-radius and k-nearest neighborhood
//! queries, and [`geometry`] derives the hull and circle shapes that are
//! reprojected to WGS84 for export.

pub mod geometry;
pub mod projection;

use geo::Coord;
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// A projected point stored in the R-tree with its position in the input.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Neighborhood index over a fixed set of projected points.
///
/// Indices returned by queries refer to positions in the slice the index
/// was built from.
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
    coords: Vec<Coord<f64>>,
}

impl PointIndex {
    /// Bulk-loads an R-tree over `coords`.
    #[must_use]
    pub fn new(coords: &[Coord<f64>]) -> Self {
        let entries = coords
            .iter()
            .enumerate()
            .map(|(i, c)| IndexedPoint::new([c.x, c.y], i))
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} projected points", tree.size());

        Self {
            tree,
            coords: coords.to_vec(),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Projected coordinate of point `index`.
    #[must_use]
    pub fn coord(&self, index: usize) -> Coord<f64> {
        self.coords[index]
    }

    /// Indices of every point within `radius` of point `index`, including
    /// the point itself, in ascending order.
    #[must_use]
    pub fn within_radius(&self, index: usize, radius: f64) -> Vec<usize> {
        let c = self.coords[index];
        let mut found: Vec<usize> = self
            .tree
            .locate_within_distance([c.x, c.y], radius * radius)
            .map(|entry| entry.data)
            .collect();
        found.sort_unstable();
        found
    }

    /// The `k` nearest other points of point `index`, closest first.
    ///
    /// Ties are broken by ascending index so the neighbor graph is
    /// deterministic even with duplicate coordinates.
    #[must_use]
    pub fn nearest(&self, index: usize, k: usize) -> Vec<usize> {
        let origin = self.coords[index];
        let mut candidates: Vec<(f64, usize)> = self
            .coords
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(j, c)| (geometry::squared_distance(origin, *c), j))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        candidates.into_iter().take(k).map(|(_, j)| j).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Vec<Coord<f64>> {
        vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 20.0, y: 0.0 },
            Coord { x: 100.0, y: 0.0 },
        ]
    }

    #[test]
    fn within_radius_includes_self_and_is_inclusive() {
        let index = PointIndex::new(&line());
        assert_eq!(index.within_radius(1, 10.0), vec![0, 1, 2]);
        assert_eq!(index.within_radius(3, 10.0), vec![3]);
    }

    #[test]
    fn nearest_excludes_self_and_orders_by_distance() {
        let index = PointIndex::new(&line());
        assert_eq!(index.nearest(0, 2), vec![1, 2]);
        assert_eq!(index.nearest(3, 1), vec![2]);
    }

    #[test]
    fn nearest_breaks_ties_by_index() {
        let index = PointIndex::new(&line());
        // Points 0 and 2 are both 10 away from point 1.
        assert_eq!(index.nearest(1, 1), vec![0]);
    }

    #[test]
    fn nearest_caps_at_available_points() {
        let index = PointIndex::new(&line());
        assert_eq!(index.nearest(0, 10).len(), 3);
        assert_eq!(index.len(), 4);
        assert!(!index.is_empty());
    }
}
