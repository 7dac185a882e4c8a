#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coastal hazard analysis.
//!
//! Synthetic hazard points are generated around fixed coastal anchors
//! ([`generator`]), then analyzed in Web Mercator space:
//!
//! 1. [`density`]: weighted Gaussian KDE, normalized to `[0, 1]`
//! 2. [`clusters`]: DBSCAN labels and convex-hull cluster summaries
//! 3. [`hotspots`]: local Getis-Ord Gi* with permutation p-values
//!
//! [`safe_spots`] runs independently of the point set and searches for
//! high ground around a single reference location.

pub mod anchors;
pub mod clusters;
pub mod density;
pub mod generator;
pub mod hotspots;
pub mod pipeline;
pub mod safe_spots;

pub use pipeline::{Analysis, analyze, generate_and_analyze};
pub use safe_spots::find_safe_spots;
