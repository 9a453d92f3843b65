use itertools::Itertools;
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use thiserror::Error;

/// Below this magnitude the cross product of two unit vectors is treated as zero.
pub const DEGENERACY_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Cannot derive a direction from a zero-length vector")]
    ZeroLengthVector,
}

/// Rotation taking one direction onto another.
///
/// The axis is `normalize(source × target)`, so rotating `source` by `+angle` about
/// `axis` (right-handed) yields the direction of `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAngle {
    pub axis: Unit<Vector3<f64>>,
    pub angle: f64,
    /// `true` when source and target were parallel or anti-parallel and the axis was
    /// chosen by the fallback rule.
    pub degenerate: bool,
}

impl AxisAngle {
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.axis, self.angle)
    }
}

/// Returns the rotation aligning `source` with `target`.
///
/// When the two directions are parallel or anti-parallel the axis is the unit vector
/// returned by [`orthogonal_axis`] for `source` and the angle is `0` or `π`.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroLengthVector`] if either input has zero length.
pub fn angle_axis_between(
    source: &Vector3<f64>,
    target: &Vector3<f64>,
) -> Result<AxisAngle, GeometryError> {
    let s = Unit::try_new(*source, f64::EPSILON).ok_or(GeometryError::ZeroLengthVector)?;
    let t = Unit::try_new(*target, f64::EPSILON).ok_or(GeometryError::ZeroLengthVector)?;

    let dot = s.dot(&*t).clamp(-1.0, 1.0);
    let cross = s.cross(&*t);
    match Unit::try_new(cross, DEGENERACY_EPSILON) {
        Some(axis) => Ok(AxisAngle {
            axis,
            angle: dot.acos(),
            degenerate: false,
        }),
        None => Ok(AxisAngle {
            axis: orthogonal_axis(&s),
            angle: if dot > 0.0 { 0.0 } else { std::f64::consts::PI },
            degenerate: true,
        }),
    }
}

/// Like [`angle_axis_between`], but a degenerate result rotates about `hinge` instead.
///
/// Used when `source` and `target` are both perpendicular to a known axis, so that an
/// anti-parallel pair is turned about that axis rather than an arbitrary one.
pub fn hinge_angle_axis(
    source: &Vector3<f64>,
    target: &Vector3<f64>,
    hinge: &Unit<Vector3<f64>>,
) -> Result<AxisAngle, GeometryError> {
    let mut result = angle_axis_between(source, target)?;
    if result.degenerate {
        result.axis = *hinge;
    }
    Ok(result)
}

/// A deterministic unit vector orthogonal to `v`, built from the coordinate axis least
/// aligned with it.
pub fn orthogonal_axis(v: &Unit<Vector3<f64>>) -> Unit<Vector3<f64>> {
    let abs = v.abs();
    let helper = if abs.x <= abs.y && abs.x <= abs.z {
        Vector3::x()
    } else if abs.y <= abs.z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    Unit::new_normalize(v.cross(&helper))
}

/// Component of `v` perpendicular to `axis`.
pub fn reject_from(v: &Vector3<f64>, axis: &Unit<Vector3<f64>>) -> Vector3<f64> {
    v - axis.into_inner() * axis.dot(v)
}

/// All pairwise distances, in `(i, j)` with `i < j` order.
pub fn pairwise_distances(points: &[Point3<f64>]) -> Vec<f64> {
    points
        .iter()
        .tuple_combinations()
        .map(|(a, b)| (a - b).norm())
        .collect()
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

pub fn max_deviation(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    Some(
        coords1
            .iter()
            .zip(coords2.iter())
            .map(|(p1, p2)| (p1 - p2).norm())
            .fold(0.0, f64::max),
    )
}
