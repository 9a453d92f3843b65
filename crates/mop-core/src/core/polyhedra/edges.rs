use itertools::Itertools;
use nalgebra::Point3;
use std::collections::BTreeMap;

/// Number of decimals distances are rounded to before pairs are grouped.
pub const DISTANCE_DECIMALS: i32 = 6;

fn distance_key(distance: f64) -> i64 {
    (distance * 10f64.powi(DISTANCE_DECIMALS)).round() as i64
}

/// Groups every unordered vertex pair `(i, j)`, `i < j`, by its rounded separation.
///
/// Keys are the rounded distances scaled by `10^DISTANCE_DECIMALS`; within a group pairs
/// keep their enumeration order.
pub fn group_pairs_by_distance(vertices: &[Point3<f64>]) -> BTreeMap<i64, Vec<(usize, usize)>> {
    let mut groups: BTreeMap<i64, Vec<(usize, usize)>> = BTreeMap::new();
    for ((i, a), (j, b)) in vertices.iter().enumerate().tuple_combinations() {
        groups
            .entry(distance_key((a - b).norm()))
            .or_default()
            .push((i, j));
    }
    groups
}

/// Returns the pairs at the minimum separation: the edges of a regular polyhedron.
///
/// Coincident vertices (zero separation) are skipped so duplicated input points do not
/// hide the real edges. Fewer than two distinct vertices yields an empty list.
pub fn nearest_neighbor_edges(vertices: &[Point3<f64>]) -> Vec<(usize, usize)> {
    group_pairs_by_distance(vertices)
        .into_iter()
        .find(|(key, _)| *key > 0)
        .map(|(_, pairs)| pairs)
        .unwrap_or_default()
}
