//! Metrics over groups of units

use ordered_float::OrderedFloat;

use crate::core::types::{Point, UnitId};

/// Pair every member of `attackers` with its nearest member of `targets`
///
/// O(|A|·|B|). Ties go to the first target in `targets` order. Returns an
/// empty list when `targets` is empty.
pub fn closest_pairing(
    attackers: &[(UnitId, Point)],
    targets: &[(UnitId, Point)],
) -> Vec<(UnitId, UnitId)> {
    attackers
        .iter()
        .filter_map(|(attacker, from)| {
            targets
                .iter()
                .min_by_key(|(_, to)| OrderedFloat(from.distance(to)))
                .map(|(target, _)| (*attacker, *target))
        })
        .collect()
}

/// `(sum(health A) / sum(health B)) * (|A| / |B|)`
///
/// # Panics
/// If either group is empty or `B` has no health left; callers must guard.
pub fn power_balance(ours: &[f64], theirs: &[f64]) -> f64 {
    assert!(
        !ours.is_empty() && !theirs.is_empty(),
        "power_balance called with an empty group ({} vs {})",
        ours.len(),
        theirs.len()
    );
    let ours_health: f64 = ours.iter().sum();
    let theirs_health: f64 = theirs.iter().sum();
    assert!(
        theirs_health > 0.0,
        "power_balance called against a group without health"
    );

    (ours_health / theirs_health) * (ours.len() as f64 / theirs.len() as f64)
}

/// Diagonal of the axis-aligned bounding box around all positions
///
/// Cheap O(n) stand-in for pairwise spread. Zero for fewer than two points.
pub fn dispersion(positions: &[Point]) -> f64 {
    let Some(first) = positions.first() else {
        return 0.0;
    };

    let (mut min, mut max) = (*first, *first);
    for p in &positions[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    min.distance(&max)
}

/// Average position, `None` for an empty group
pub fn centroid(positions: &[Point]) -> Option<Point> {
    if positions.is_empty() {
        return None;
    }
    let sum = positions
        .iter()
        .fold(Point::default(), |acc, p| acc + *p);
    Some(sum * (1.0 / positions.len() as f64))
}
