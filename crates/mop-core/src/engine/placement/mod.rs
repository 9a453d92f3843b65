//! Placement strategies that bind one ligand copy to one feature of a polyhedron.
//!
//! Every strategy implements [`PlacementStrategy`]: it is built once per run from the
//! template (fixing the coordinate multiplier and checking the anchor count), then asked to
//! place each staged copy onto target `0..target_count()`. Strategies never touch the
//! simulation box; they only move the positions of the [`Molecule`] they are handed, and
//! only through a [`RigidAligner`].

pub mod edge;
pub mod face;

use super::aligner::{Isometry, RigidAligner};
use super::matching::MatchingError;
use super::scaling::ScalingError;
use crate::core::models::ligand::Molecule;
use crate::core::polyhedra::catalog::centroid;
use crate::core::utils::geometry::{GeometryError, calculate_rmsd, max_deviation};
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use std::fmt;
use thiserror::Error;

pub use edge::EdgePlacer;
pub use face::{FaceAssembler, FaceTargets};

/// Residual anchor deviation (Å) below which no least-squares refinement is applied.
pub const REFINEMENT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlacementError {
    #[error("Expected {expected} anchor atoms, found {found}")]
    AnchorCount { expected: usize, found: usize },

    #[error("The polyhedron has no {kind} with index {index}")]
    MissingTarget { kind: &'static str, index: usize },

    #[error("Anchor atom {0} is not present in the ligand copy")]
    MissingAnchorPosition(usize),

    #[error("Degenerate geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Anchor matching failed: {0}")]
    Matching(#[from] MatchingError),

    #[error("Scaling failed: {0}")]
    Scaling(#[from] ScalingError),

    #[error("Least-squares superposition did not converge")]
    Superposition,
}

/// The polyhedron feature a copy is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementTarget {
    /// `vertices` is `None` when `index` is past the end of the edge list.
    Edge {
        index: usize,
        vertices: Option<(usize, usize)>,
    },
    Face { index: usize },
    Whole,
}

impl fmt::Display for PlacementTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edge {
                index,
                vertices: Some((a, b)),
            } => write!(f, "edge {} ({}-{})", index, a, b),
            Self::Edge {
                index,
                vertices: None,
            } => write!(f, "edge {} (out of range)", index),
            Self::Face { index } => write!(f, "face {}", index),
            Self::Whole => f.write_str("whole polyhedron"),
        }
    }
}

/// One placed ligand copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub target: PlacementTarget,
    pub coordinate_multiplier: f64,
    /// `(anchor atom index, target index)` pairs; target indices are face-local for face
    /// placements and `0`/`1` for the edge endpoints.
    pub correspondence: Vec<(usize, usize)>,
    /// Largest distance between an anchor and its target after placement.
    pub max_anchor_deviation: f64,
    pub anchor_rmsd: f64,
}

impl Placement {
    fn measured(
        target: PlacementTarget,
        coordinate_multiplier: f64,
        correspondence: Vec<(usize, usize)>,
        anchors: &[Point3<f64>],
        targets: &[Point3<f64>],
    ) -> Self {
        Self {
            target,
            coordinate_multiplier,
            correspondence,
            max_anchor_deviation: max_deviation(anchors, targets).unwrap_or(0.0),
            anchor_rmsd: calculate_rmsd(anchors, targets).unwrap_or(0.0),
        }
    }
}

pub trait PlacementStrategy {
    /// Factor applied to catalog coordinates for this run.
    fn coordinate_multiplier(&self) -> f64;

    /// Number of copies this strategy places.
    fn target_count(&self) -> usize;

    fn target(&self, index: usize) -> PlacementTarget;

    /// Moves `molecule`, a fresh copy of the template, onto target `index`.
    fn place(
        &self,
        molecule: &mut Molecule,
        index: usize,
        aligner: &RigidAligner<'_>,
    ) -> Result<Placement, PlacementError>;
}

/// Leaves a single copy at its template coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePlacer;

impl PlacementStrategy for SinglePlacer {
    fn coordinate_multiplier(&self) -> f64 {
        1.0
    }

    fn target_count(&self) -> usize {
        1
    }

    fn target(&self, _index: usize) -> PlacementTarget {
        PlacementTarget::Whole
    }

    fn place(
        &self,
        _molecule: &mut Molecule,
        _index: usize,
        _aligner: &RigidAligner<'_>,
    ) -> Result<Placement, PlacementError> {
        Ok(Placement::measured(PlacementTarget::Whole, 1.0, Vec::new(), &[], &[]))
    }
}

pub(crate) fn gather_positions(
    positions: &[Point3<f64>],
    indices: &[usize],
) -> Result<Vec<Point3<f64>>, PlacementError> {
    indices
        .iter()
        .map(|&i| {
            positions
                .get(i)
                .copied()
                .ok_or(PlacementError::MissingAnchorPosition(i))
        })
        .collect()
}

/// Least-squares rotation and translation mapping `from_points` onto `to_points` (Kabsch).
pub(crate) fn calculate_transformation(
    from_points: &[Point3<f64>],
    to_points: &[Point3<f64>],
) -> Result<(Rotation3<f64>, Vector3<f64>), PlacementError> {
    let from_centroid = centroid(from_points);
    let to_centroid = centroid(to_points);

    let h = from_points
        .iter()
        .zip(to_points.iter())
        .fold(Matrix3::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(PlacementError::Superposition)?;
    let v_t = svd.v_t.ok_or(PlacementError::Superposition)?;

    let d = (u * v_t).determinant();
    let mut correction = Matrix3::identity();
    if d < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    let translation = to_centroid.coords - rotation * from_centroid.coords;
    Ok((rotation, translation))
}

/// Superimposes the atoms at `indices` onto `targets` in least-squares sense, moving the
/// whole copy through the aligner's primitives.
pub(crate) fn refine_superposition(
    positions: &mut [Point3<f64>],
    indices: &[usize],
    targets: &[Point3<f64>],
    aligner: &RigidAligner<'_>,
) -> Result<(), PlacementError> {
    let current = gather_positions(positions, indices)?;
    let (rotation, _) = calculate_transformation(&current, targets)?;
    let from_centroid = centroid(&current);

    if let Some((axis, angle)) = rotation.axis_angle() {
        aligner.rotate(positions, &Isometry::new(from_centroid, axis, angle), None);
    }
    aligner.translate(positions, &(centroid(targets) - from_centroid));
    Ok(())
}
