//! Hit testing: point → shape lookup.
//!
//! Walks the shapes back-to-front (last inserted = topmost) to find which
//! shape is at a given canvas position.

use crate::id::ShapeNumber;
use crate::model::Graph;

/// Find the topmost shape at canvas position (px, py).
/// Returns `None` if no shape is hit (background).
pub fn hit_test(graph: &Graph, px: f64, py: f64) -> Option<ShapeNumber> {
    graph
        .shapes()
        .iter()
        .rev()
        .find(|s| s.contains(px, py))
        .map(|s| s.number)
}
