use super::{Placement, PlacementError, PlacementStrategy, PlacementTarget, gather_positions};
use crate::core::models::ligand::{Ligand, LinkerPair, Molecule};
use crate::core::polyhedra::catalog::Polyhedron;
use crate::core::utils::geometry::{GeometryError, hinge_angle_axis, reject_from};
use crate::engine::aligner::{Isometry, RigidAligner};
use crate::engine::config::ScalingConvention;
use crate::engine::scaling::coordinate_multiplier;
use nalgebra::{Point3, Unit};
use tracing::{debug, warn};

/// Places a two-anchor ligand on every edge of a polyhedron.
///
/// Anchor 0 lands on the first endpoint of the scaled edge and anchor 1 on the second.
/// If the template has a linker pair, the copy is then turned about the edge so that the
/// linker oxygen-to-carbon direction points along the edge bisector, away from the centre
/// of the solid.
#[derive(Debug, Clone)]
pub struct EdgePlacer<'p> {
    polyhedron: &'p Polyhedron,
    anchors: [usize; 2],
    linker: Option<LinkerPair>,
    multiplier: f64,
}

impl<'p> EdgePlacer<'p> {
    /// # Errors
    ///
    /// Fails with [`PlacementError::AnchorCount`] unless the template has exactly two
    /// anchors, and with [`PlacementError::Scaling`] when the anchors coincide.
    pub fn new(
        polyhedron: &'p Polyhedron,
        ligand: &Ligand,
        convention: ScalingConvention,
    ) -> Result<Self, PlacementError> {
        let &[first, second] = ligand.anchors() else {
            return Err(PlacementError::AnchorCount {
                expected: 2,
                found: ligand.anchors().len(),
            });
        };
        let &(i, j) = polyhedron
            .edges()
            .first()
            .ok_or(PlacementError::MissingTarget {
                kind: "edge",
                index: 0,
            })?;
        let nominal = [polyhedron.vertices()[i], polyhedron.vertices()[j]];
        let multiplier = coordinate_multiplier(&ligand.anchor_positions(), &nominal, convention)?;

        Ok(Self {
            polyhedron,
            anchors: [first, second],
            linker: ligand.linker(),
            multiplier,
        })
    }

    /// Endpoints of edge `index` after scaling.
    pub fn scaled_edge(&self, index: usize) -> Option<(Point3<f64>, Point3<f64>)> {
        let &(i, j) = self.polyhedron.edges().get(index)?;
        let vertices = self.polyhedron.vertices();
        Some((vertices[i] * self.multiplier, vertices[j] * self.multiplier))
    }

    fn orient_linker(
        &self,
        positions: &mut [Point3<f64>],
        start: Point3<f64>,
        end: Point3<f64>,
        index: usize,
        aligner: &RigidAligner<'_>,
    ) -> Result<(), PlacementError> {
        let Some(linker) = self.linker else {
            debug!(edge = index, "No linker atoms; skipping rotation about the edge.");
            return Ok(());
        };
        let hinge =
            Unit::try_new(end - start, f64::EPSILON).ok_or(GeometryError::ZeroLengthVector)?;

        let linker_positions = gather_positions(positions, &[linker.oxygen, linker.carbon])?;
        let source = reject_from(&(linker_positions[1] - linker_positions[0]), &hinge);
        let bisector = reject_from(&nalgebra::center(&start, &end).coords, &hinge);

        match hinge_angle_axis(&source, &bisector, &hinge) {
            Ok(axis_angle) => {
                aligner.rotate(
                    positions,
                    &Isometry::from_axis_angle(start, axis_angle),
                    Some(self.anchors[0]),
                );
            }
            Err(_) => warn!(
                edge = index,
                "Linker vector is parallel to the edge; skipping rotation about the edge."
            ),
        }
        Ok(())
    }
}

impl PlacementStrategy for EdgePlacer<'_> {
    fn coordinate_multiplier(&self) -> f64 {
        self.multiplier
    }

    fn target_count(&self) -> usize {
        self.polyhedron.edges().len()
    }

    fn target(&self, index: usize) -> PlacementTarget {
        PlacementTarget::Edge {
            index,
            vertices: self.polyhedron.edges().get(index).copied(),
        }
    }

    fn place(
        &self,
        molecule: &mut Molecule,
        index: usize,
        aligner: &RigidAligner<'_>,
    ) -> Result<Placement, PlacementError> {
        let (start, end) = self.scaled_edge(index).ok_or(PlacementError::MissingTarget {
            kind: "edge",
            index,
        })?;
        let [first, second] = self.anchors;
        let positions = molecule.positions_mut();

        let anchor0 = gather_positions(positions, &[first])?[0];
        aligner.translate(positions, &(start - anchor0));

        let anchors = gather_positions(positions, &[first, second])?;
        aligner.align(
            positions,
            start,
            &(anchors[1] - anchors[0]),
            &(end - start),
            Some(first),
        )?;

        self.orient_linker(positions, start, end, index, aligner)?;

        let placed = gather_positions(positions, &[first, second])?;
        let placement = Placement::measured(
            self.target(index),
            self.multiplier,
            vec![(first, 0), (second, 1)],
            &placed,
            &[start, end],
        );
        debug!(
            edge = index,
            deviation = placement.max_anchor_deviation,
            "Placed ligand copy on edge."
        );
        Ok(placement)
    }
}
