//! Geometry and grouping utilities
//!
//! Shape distances used for move targets and proximity checks, plus the
//! cheap group metrics the lookout and behavior certainties depend on.

mod group;
mod shape;

pub use group::{centroid, closest_pairing, dispersion, power_balance};
pub use shape::{distance, Shape};
