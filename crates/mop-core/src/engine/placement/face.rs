use super::{
    Placement, PlacementError, PlacementStrategy, PlacementTarget, REFINEMENT_TOLERANCE,
    gather_positions, refine_superposition,
};
use crate::core::models::ligand::{Ligand, Molecule};
use crate::core::polyhedra::catalog::{Polyhedron, centroid, newell_normal};
use crate::core::utils::geometry::{GeometryError, hinge_angle_axis, max_deviation, reject_from};
use crate::engine::aligner::{Isometry, RigidAligner};
use crate::engine::config::{FaceOrientation, ScalingConvention};
use crate::engine::matching::nearest_assignment;
use crate::engine::scaling::coordinate_multiplier;
use nalgebra::{Matrix3, Point3, Unit, Vector3};
use tracing::{debug, warn};

/// Offset from the anchor plane below which the rest of the ligand counts as coplanar.
const PLANAR_BODY_TOLERANCE: f64 = 1e-3;

/// Unit normal of the best-fit plane through `anchors`, independent of their listed order.
///
/// The anchors are walked in cyclic order around their centroid so that any
/// permutation of the same atoms gives the same plane. The sign points towards the
/// centroid of `body`; when `body` is empty or lies in the plane, the listed order's
/// handedness decides. Returns `None` for collinear anchors.
fn anchor_plane_normal(
    anchors: &[Point3<f64>],
    body: &[Point3<f64>],
) -> Option<Unit<Vector3<f64>>> {
    let center = centroid(anchors);
    let scatter = anchors.iter().fold(Matrix3::zeros(), |acc, p| {
        let d = p - center;
        acc + d * d.transpose()
    });
    let eigen = scatter.symmetric_eigen();
    let plane = Unit::try_new(
        eigen.eigenvectors.column(eigen.eigenvalues.imin()).into_owned(),
        f64::EPSILON,
    )?;

    let reference = anchors
        .iter()
        .map(|p| reject_from(&(p - center), &plane))
        .find(|d| d.norm() > 1e-8)?
        .normalize();
    let across = plane.cross(&reference);
    let mut ring: Vec<(f64, Point3<f64>)> = anchors
        .iter()
        .map(|p| {
            let d = p - center;
            (d.dot(&across).atan2(d.dot(&reference)), *p)
        })
        .collect();
    ring.sort_by(|a, b| a.0.total_cmp(&b.0));
    let ordered: Vec<_> = ring.into_iter().map(|(_, p)| p).collect();
    let normal = Unit::try_new(newell_normal(&ordered), 1e-8)?;

    let side = if body.is_empty() {
        0.0
    } else {
        normal.dot(&(centroid(body) - center))
    };
    let flip = if side.abs() > PLANAR_BODY_TOLERANCE {
        side < 0.0
    } else {
        newell_normal(anchors).dot(&normal) < 0.0
    };
    Some(if flip { -normal } else { normal })
}

/// Which points of a face the anchors are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceTargets {
    /// The face's vertices (face mode).
    Vertices,
    /// The midpoints of the face's bounding edges (bent mode).
    EdgeMidpoints,
}

/// Places a k-anchor ligand (k = 3, 4 or 5) on every face of a polyhedron.
///
/// Each copy is first turned so that its anchor plane faces the requested side of the
/// face and anchor 0 sits on target 0. The remaining anchors are then matched to the
/// remaining targets by nearest assignment, the first matched pair is aligned exactly,
/// the plane is corrected about that pair, and for four or more anchors a least-squares
/// superposition takes up whatever residual is left.
#[derive(Debug, Clone)]
pub struct FaceAssembler<'p> {
    polyhedron: &'p Polyhedron,
    targets: FaceTargets,
    orientation: FaceOrientation,
    anchors: Vec<usize>,
    multiplier: f64,
}

impl<'p> FaceAssembler<'p> {
    pub fn new(
        polyhedron: &'p Polyhedron,
        targets: FaceTargets,
        ligand: &Ligand,
        convention: ScalingConvention,
        orientation: FaceOrientation,
    ) -> Result<Self, PlacementError> {
        let expected = polyhedron.face_vertex_count();
        if ligand.anchors().len() != expected {
            return Err(PlacementError::AnchorCount {
                expected,
                found: ligand.anchors().len(),
            });
        }

        let mut assembler = Self {
            polyhedron,
            targets,
            orientation,
            anchors: ligand.anchors().to_vec(),
            multiplier: 1.0,
        };
        let nominal = assembler.nominal_targets(0)?;
        assembler.multiplier =
            coordinate_multiplier(&ligand.anchor_positions(), &nominal, convention)?;
        Ok(assembler)
    }

    fn nominal_targets(&self, face: usize) -> Result<Vec<Point3<f64>>, PlacementError> {
        let points = match self.targets {
            FaceTargets::Vertices => self.polyhedron.face_vertices(face),
            FaceTargets::EdgeMidpoints => self.polyhedron.face_edge_midpoints(face),
        };
        points.ok_or(PlacementError::MissingTarget { kind: "face", index: face })
    }

    /// Target points of face `face` after scaling, in face order.
    pub fn scaled_targets(&self, face: usize) -> Result<Vec<Point3<f64>>, PlacementError> {
        Ok(self
            .nominal_targets(face)?
            .into_iter()
            .map(|p| p * self.multiplier)
            .collect())
    }

    fn desired_normal(&self, face: usize) -> Result<Unit<Vector3<f64>>, PlacementError> {
        let outward = self
            .polyhedron
            .face_normal(face)
            .ok_or(PlacementError::MissingTarget { kind: "face", index: face })?;
        Ok(match self.orientation {
            FaceOrientation::Outward => outward,
            FaceOrientation::Inward => -outward,
        })
    }

    /// Turns the anchor plane towards `normal` and brings anchor 0 onto `targets[0]` with
    /// the anchor centroid on the side of the target centroid.
    ///
    /// The side of the plane the non-anchor atoms sit on is what ends up facing
    /// `normal`.
    fn pre_orient(
        &self,
        positions: &mut [Point3<f64>],
        targets: &[Point3<f64>],
        normal: &Unit<Vector3<f64>>,
        face: usize,
        aligner: &RigidAligner<'_>,
    ) -> Result<(), PlacementError> {
        let anchors = gather_positions(positions, &self.anchors)?;
        let body: Vec<_> = positions
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.anchors.contains(index))
            .map(|(_, p)| *p)
            .collect();
        let aligned = anchor_plane_normal(&anchors, &body).and_then(|anchor_normal| {
            aligner
                .align(positions, centroid(&anchors), &anchor_normal, normal, None)
                .ok()
        });
        if aligned.is_none() {
            warn!(face, "Anchors are collinear; skipping plane pre-orientation.");
        }

        let anchor0 = gather_positions(positions, &self.anchors[..1])?[0];
        aligner.translate(positions, &(targets[0] - anchor0));

        let anchors = gather_positions(positions, &self.anchors)?;
        let source = centroid(&anchors) - anchors[0];
        let target = centroid(targets) - targets[0];
        match hinge_angle_axis(&source, &target, normal) {
            Ok(axis_angle) => aligner.rotate(
                positions,
                &Isometry::from_axis_angle(targets[0], axis_angle),
                Some(self.anchors[0]),
            ),
            Err(_) => warn!(face, "Anchor centroid coincides with anchor 0; skipping in-plane turn."),
        }
        Ok(())
    }
}

impl PlacementStrategy for FaceAssembler<'_> {
    fn coordinate_multiplier(&self) -> f64 {
        self.multiplier
    }

    fn target_count(&self) -> usize {
        self.polyhedron.faces().len()
    }

    fn target(&self, index: usize) -> PlacementTarget {
        PlacementTarget::Face { index }
    }

    fn place(
        &self,
        molecule: &mut Molecule,
        face: usize,
        aligner: &RigidAligner<'_>,
    ) -> Result<Placement, PlacementError> {
        let targets = self.scaled_targets(face)?;
        let normal = self.desired_normal(face)?;
        let positions = molecule.positions_mut();

        self.pre_orient(positions, &targets, &normal, face, aligner)?;

        // Anchor 0 is bound to target 0; the rest are matched.
        let current = gather_positions(positions, &self.anchors)?;
        let assignment = nearest_assignment(&current[1..], &targets[1..])?;
        let mut matched = vec![0usize; self.anchors.len()];
        matched[0] = self.anchors[0];
        for (offset, &target) in assignment.targets.iter().enumerate() {
            matched[target + 1] = self.anchors[offset + 1];
        }

        let pair = gather_positions(positions, &matched[..2])?;
        aligner.align(
            positions,
            targets[0],
            &(pair[1] - pair[0]),
            &(targets[1] - targets[0]),
            Some(matched[0]),
        )?;

        let hinge = Unit::try_new(targets[1] - targets[0], f64::EPSILON)
            .ok_or(GeometryError::ZeroLengthVector)?;
        let mid = nalgebra::center(&targets[0], &targets[1]);
        let third = gather_positions(positions, &matched[2..3])?[0];
        let ligand_normal = (targets[1] - mid).cross(&(third - mid));
        let target_normal = (targets[1] - mid).cross(&(targets[2] - mid));
        match hinge_angle_axis(&ligand_normal, &target_normal, &hinge) {
            Ok(axis_angle) => aligner.rotate(
                positions,
                &Isometry::from_axis_angle(mid, axis_angle),
                Some(matched[0]),
            ),
            Err(_) => warn!(face, "Third anchor lies on the aligned pair; skipping plane correction."),
        }

        if matched.len() >= 4 {
            let placed = gather_positions(positions, &matched)?;
            let residual = max_deviation(&placed, &targets).unwrap_or(0.0);
            if residual > REFINEMENT_TOLERANCE {
                debug!(face, residual, "Refining anchor superposition.");
                refine_superposition(positions, &matched, &targets, aligner)?;
            }
        }

        let placed = gather_positions(positions, &matched)?;
        let correspondence = matched
            .iter()
            .enumerate()
            .map(|(target, &anchor)| (anchor, target))
            .collect();
        let placement = Placement::measured(
            PlacementTarget::Face { index: face },
            self.multiplier,
            correspondence,
            &placed,
            &targets,
        );
        debug!(
            face,
            deviation = placement.max_anchor_deviation,
            "Placed ligand copy on face."
        );
        Ok(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::boundary::OpenBoundary;
    use crate::core::polyhedra::catalog::{PolyhedronKind, polyhedron};
    use crate::core::utils::geometry::pairwise_distances;
    use nalgebra::Rotation3;

    /// A ligand whose anchors are a rotated, shifted copy of `anchor_points`, with one
    /// extra atom above the anchor plane.
    fn cap_ligand(anchor_points: &[Point3<f64>]) -> Ligand {
        let order: Vec<_> = (0..anchor_points.len()).collect();
        cap_ligand_in_order(anchor_points, &order)
    }

    /// Like [`cap_ligand`], but anchor atom `i` sits at `anchor_points[order[i]]`, so the
    /// anchor list need not walk around the ring.
    fn cap_ligand_in_order(anchor_points: &[Point3<f64>], order: &[usize]) -> Ligand {
        let rotation = Rotation3::from_axis_angle(
            &Unit::new_normalize(Vector3::new(0.3, -1.0, 0.4)),
            1.1,
        );
        let shift = Vector3::new(4.0, -2.0, 7.0);
        let center = centroid(anchor_points);
        let normal = newell_normal(anchor_points).normalize();

        let mut atoms: Vec<Atom> = order
            .iter()
            .enumerate()
            .map(|(i, &j)| Atom::new(&format!("M{}", i + 1), "ZN", rotation * anchor_points[j] + shift))
            .collect();
        atoms.push(Atom::new("C1", "C_R", rotation * (center + normal * 1.5) + shift));
        atoms.push(Atom::new("H1", "H_", rotation * (center + normal * 2.5) + shift));

        let mut ligand = Ligand::new("CAP", atoms, Vec::new());
        ligand.set_anchors((0..anchor_points.len()).collect()).unwrap();
        ligand
    }

    /// Places `ligand` on every face and checks the cap lands `sign * 1.5` from the
    /// face plane with the same correspondence on every face.
    fn assert_caps_on_side(solid: &Polyhedron, ligand: &Ligand, multiplier: f64) {
        let cap = ligand.anchors().len();
        for (orientation, sign) in [(FaceOrientation::Outward, 1.0), (FaceOrientation::Inward, -1.0)] {
            let placed = place_all(solid, ligand, FaceTargets::Vertices, orientation);
            let first = placed[0].0.correspondence.clone();
            for (placement, copy) in &placed {
                let PlacementTarget::Face { index } = placement.target else {
                    panic!("unexpected target");
                };
                assert!(placement.max_anchor_deviation < 1e-9, "{placement:?}");
                assert_eq!(placement.correspondence, first, "{orientation:?} face {index}");
                let normal = solid.face_normal(index).unwrap();
                let face_center = solid.face_centroid(index).unwrap() * multiplier;
                let height = normal.dot(&(copy.positions()[cap] - face_center));
                assert!((height - sign * 1.5).abs() < 1e-9, "{orientation:?} face {index}: {height}");
                assert_rigid(ligand, copy);
            }
        }
    }

    fn place_all(
        solid: &Polyhedron,
        ligand: &Ligand,
        targets: FaceTargets,
        orientation: FaceOrientation,
    ) -> Vec<(Placement, Molecule)> {
        let assembler =
            FaceAssembler::new(solid, targets, ligand, ScalingConvention::EdgeLength, orientation)
                .unwrap();
        let boundary = OpenBoundary;
        let aligner = RigidAligner::new(&boundary);
        (0..assembler.target_count())
            .map(|face| {
                let mut copy = ligand.make_instance();
                let placement = assembler.place(&mut copy, face, &aligner).unwrap();
                (placement, copy)
            })
            .collect()
    }

    fn assert_rigid(ligand: &Ligand, copy: &Molecule) {
        let reference = pairwise_distances(ligand.make_instance().positions());
        for (a, b) in reference.iter().zip(pairwise_distances(copy.positions())) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn tetrahedron_faces_receive_congruent_ligand_with_consistent_correspondence() {
        let solid = polyhedron(PolyhedronKind::Tetrahedron);
        let face = solid.face_vertices(0).unwrap();
        let anchor_points: Vec<_> = face.iter().map(|p| p * 2.5).collect();
        let ligand = cap_ligand(&anchor_points);

        let placed = place_all(solid, &ligand, FaceTargets::Vertices, FaceOrientation::Outward);
        assert_eq!(placed.len(), 4);
        let first = &placed[0].0.correspondence;
        for (placement, copy) in &placed {
            assert!((placement.coordinate_multiplier - 2.5).abs() < 1e-9);
            assert!(placement.max_anchor_deviation < 1e-9, "{placement:?}");
            assert_eq!(&placement.correspondence, first);
            assert_rigid(&ligand, copy);
        }
    }

    #[test]
    fn outward_and_inward_orientation_put_the_cap_on_opposite_sides() {
        let solid = polyhedron(PolyhedronKind::Octahedron);
        let anchor_points: Vec<_> = solid.face_vertices(0).unwrap().iter().map(|p| p * 3.0).collect();
        let ligand = cap_ligand(&anchor_points);

        for (orientation, sign) in [(FaceOrientation::Outward, 1.0), (FaceOrientation::Inward, -1.0)] {
            for (placement, copy) in place_all(solid, &ligand, FaceTargets::Vertices, orientation) {
                let PlacementTarget::Face { index } = placement.target else {
                    panic!("unexpected target");
                };
                assert!(placement.max_anchor_deviation < 1e-9);
                let normal = solid.face_normal(index).unwrap();
                let face_center = solid.face_centroid(index).unwrap() * 3.0;
                let height = normal.dot(&(copy.positions()[3] - face_center));
                assert!((height - sign * 1.5).abs() < 1e-9, "{orientation:?} face {index}: {height}");
            }
        }
    }

    #[test]
    fn cube_faces_take_four_anchor_ligand() {
        let solid = polyhedron(PolyhedronKind::Cube);
        let anchor_points: Vec<_> = solid.face_vertices(0).unwrap().iter().map(|p| p * 1.75).collect();
        let ligand = cap_ligand(&anchor_points);

        let placed = place_all(solid, &ligand, FaceTargets::Vertices, FaceOrientation::Outward);
        assert_eq!(placed.len(), 6);
        for (placement, copy) in &placed {
            assert!(placement.max_anchor_deviation < 1e-9);
            assert_eq!(placement.correspondence.len(), 4);
            assert_rigid(&ligand, copy);
        }
    }

    #[test]
    fn dodecahedron_faces_take_five_anchor_ligand() {
        let solid = polyhedron(PolyhedronKind::Dodecahedron);
        let anchor_points: Vec<_> = solid.face_vertices(0).unwrap().iter().map(|p| p * 2.0).collect();
        let ligand = cap_ligand(&anchor_points);

        let placed = place_all(solid, &ligand, FaceTargets::Vertices, FaceOrientation::Outward);
        assert_eq!(placed.len(), 12);
        for (placement, copy) in &placed {
            assert!(placement.max_anchor_deviation < 1e-9, "{placement:?}");
            assert_rigid(&ligand, copy);
        }
    }

    #[test]
    fn bent_mode_targets_edge_midpoints() {
        let solid = polyhedron(PolyhedronKind::Octahedron);
        let midpoints: Vec<_> = solid
            .face_edge_midpoints(0)
            .unwrap()
            .iter()
            .map(|p| p * 4.0)
            .collect();
        let ligand = cap_ligand(&midpoints);

        let assembler = FaceAssembler::new(
            solid,
            FaceTargets::EdgeMidpoints,
            &ligand,
            ScalingConvention::Circumradius,
            FaceOrientation::Outward,
        )
        .unwrap();
        assert!((assembler.coordinate_multiplier() - 4.0).abs() < 1e-9);

        let boundary = OpenBoundary;
        let aligner = RigidAligner::new(&boundary);
        for face in 0..assembler.target_count() {
            let mut copy = ligand.make_instance();
            let placement = assembler.place(&mut copy, face, &aligner).unwrap();
            let targets = assembler.scaled_targets(face).unwrap();
            for &(anchor, target) in &placement.correspondence {
                assert!((copy.positions()[anchor] - targets[target]).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn anchor_count_must_match_face_size() {
        let solid = polyhedron(PolyhedronKind::Tetrahedron);
        let square: Vec<_> = polyhedron(PolyhedronKind::Cube).face_vertices(0).unwrap();
        let ligand = cap_ligand(&square);
        let err = FaceAssembler::new(
            solid,
            FaceTargets::Vertices,
            &ligand,
            ScalingConvention::EdgeLength,
            FaceOrientation::Outward,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlacementError::AnchorCount {
                expected: 3,
                found: 4
            }
        );
    }

    #[test]
    fn imperfect_square_is_refined_by_least_squares() {
        let solid = polyhedron(PolyhedronKind::Cube);
        let mut anchor_points: Vec<_> = solid.face_vertices(0).unwrap().iter().map(|p| p * 2.0).collect();
        anchor_points[3] += Vector3::new(0.0, 0.2, -0.15);
        let ligand = cap_ligand(&anchor_points);

        for (placement, copy) in place_all(solid, &ligand, FaceTargets::Vertices, FaceOrientation::Outward) {
            assert!(placement.max_anchor_deviation < 0.5);
            assert!(placement.anchor_rmsd <= placement.max_anchor_deviation);
            assert_rigid(&ligand, &copy);
        }
    }

    #[test]
    fn cube_caps_follow_orientation_when_anchors_are_listed_across_the_square() {
        let solid = polyhedron(PolyhedronKind::Cube);
        let anchor_points: Vec<_> = solid.face_vertices(0).unwrap().iter().map(|p| p * 1.75).collect();
        let ligand = cap_ligand_in_order(&anchor_points, &[0, 2, 1, 3]);
        assert_caps_on_side(solid, &ligand, 1.75);
    }

    #[test]
    fn tetrahedron_caps_follow_orientation_when_anchors_are_listed_clockwise() {
        let solid = polyhedron(PolyhedronKind::Tetrahedron);
        let anchor_points: Vec<_> = solid.face_vertices(0).unwrap().iter().map(|p| p * 2.5).collect();
        let ligand = cap_ligand_in_order(&anchor_points, &[0, 2, 1]);
        assert_caps_on_side(solid, &ligand, 2.5);
    }

    #[test]
    fn anchor_plane_normal_ignores_listed_order_and_points_at_the_body() {
        let square = [
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
        ];
        let crossed = [square[0], square[2], square[1], square[3]];
        for body in [Point3::<f64>::new(0.2, 0.1, 2.0), Point3::new(0.2, 0.1, -2.0)] {
            let expected = body.z.signum();
            for anchors in [&square, &crossed] {
                let normal = anchor_plane_normal(anchors, &[body]).unwrap();
                assert!((normal.z - expected).abs() < 1e-12, "{anchors:?} {body:?}");
            }
        }

        let flat = anchor_plane_normal(&square, &[Point3::new(3.0, 0.0, 0.0)]).unwrap();
        assert!((flat.z - 1.0).abs() < 1e-12);
        let reversed: Vec<_> = square.iter().rev().copied().collect();
        let flat = anchor_plane_normal(&reversed, &[]).unwrap();
        assert!((flat.z + 1.0).abs() < 1e-12);

        let line = [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        assert!(anchor_plane_normal(&line, &[]).is_none());
    }
}
