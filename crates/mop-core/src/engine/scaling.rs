use super::config::ScalingConvention;
use crate::core::polyhedra::catalog::centroid;
use itertools::Itertools;
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScalingError {
    #[error("At least two points are needed to measure a {0} reference length")]
    TooFewPoints(&'static str),
    #[error("The {0} reference length is zero or not finite")]
    DegenerateLength(&'static str),
}

/// Characteristic length of a point set under `convention`.
///
/// `EdgeLength` is the shortest pairwise separation; `Circumradius` is the mean distance
/// to the centroid.
pub fn reference_length(points: &[Point3<f64>], convention: ScalingConvention) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let length = match convention {
        ScalingConvention::EdgeLength => points
            .iter()
            .tuple_combinations()
            .map(|(a, b)| (a - b).norm())
            .fold(f64::INFINITY, f64::min),
        ScalingConvention::Circumradius => {
            let center = centroid(points);
            points.iter().map(|p| (p - center).norm()).sum::<f64>() / points.len() as f64
        }
    };
    Some(length)
}

/// Factor applied to catalog coordinates so that the nominal targets match the ligand's
/// anchor geometry.
///
/// # Errors
///
/// Returns [`ScalingError`] when either set has fewer than two points or a zero length.
pub fn coordinate_multiplier(
    anchors: &[Point3<f64>],
    nominal_targets: &[Point3<f64>],
    convention: ScalingConvention,
) -> Result<f64, ScalingError> {
    let ligand = reference_length(anchors, convention).ok_or(ScalingError::TooFewPoints("ligand"))?;
    let target = reference_length(nominal_targets, convention)
        .ok_or(ScalingError::TooFewPoints("polyhedron"))?;

    if !(ligand.is_finite() && ligand > f64::EPSILON) {
        return Err(ScalingError::DegenerateLength("ligand"));
    }
    if !(target.is_finite() && target > f64::EPSILON) {
        return Err(ScalingError::DegenerateLength("polyhedron"));
    }
    Ok(ligand / target)
}

/// Side of a cubic periodic box large enough to hold the scaled solid with ligand copies
/// hanging off its vertices, plus `padding`.
pub fn auto_box_side(circumradius: f64, multiplier: f64, ligand_extent: f64, padding: f64) -> f64 {
    2.0 * (multiplier * circumradius + ligand_extent) + padding
}
