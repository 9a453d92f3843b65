use crate::core::models::boundary::Boundary;
use crate::core::utils::geometry::{AxisAngle, GeometryError, angle_axis_between};
use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// A rotation about an axis through `pivot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isometry {
    pub pivot: Point3<f64>,
    pub axis: Unit<Vector3<f64>>,
    pub angle: f64,
}

impl Isometry {
    pub fn new(pivot: Point3<f64>, axis: Unit<Vector3<f64>>, angle: f64) -> Self {
        Self { pivot, axis, angle }
    }

    pub fn from_axis_angle(pivot: Point3<f64>, axis_angle: AxisAngle) -> Self {
        Self::new(pivot, axis_angle.axis, axis_angle.angle)
    }

    /// The isometry turning direction `source` onto `target` about `pivot`.
    pub fn aligning(
        pivot: Point3<f64>,
        source: &Vector3<f64>,
        target: &Vector3<f64>,
    ) -> Result<Self, GeometryError> {
        angle_axis_between(source, target).map(|aa| Self::from_axis_angle(pivot, aa))
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.pivot, self.axis, -self.angle)
    }

    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.axis, self.angle)
    }
}

/// Applies rigid moves to atom positions and re-images every moved atom.
///
/// All placement modes move atoms exclusively through [`RigidAligner::rotate`] and
/// [`RigidAligner::translate`].
#[derive(Debug, Clone, Copy)]
pub struct RigidAligner<'b> {
    boundary: &'b dyn Boundary,
}

impl<'b> RigidAligner<'b> {
    pub fn new(boundary: &'b dyn Boundary) -> Self {
        Self { boundary }
    }

    fn re_image(&self, point: Point3<f64>) -> Point3<f64> {
        point + self.boundary.central_image(&point)
    }

    /// Rotates every position except `exclude` about the isometry's pivot and axis.
    ///
    /// Each atom is shifted by the pivot, rotated, shifted back, and mapped onto its
    /// central image, in that order.
    pub fn rotate(&self, positions: &mut [Point3<f64>], isometry: &Isometry, exclude: Option<usize>) {
        let rotation = isometry.rotation();
        for (index, position) in positions.iter_mut().enumerate() {
            if Some(index) == exclude {
                continue;
            }
            let relative = *position - isometry.pivot;
            let rotated = isometry.pivot + rotation * relative;
            *position = self.re_image(rotated);
        }
    }

    /// Shifts every position by `shift` and re-images it.
    pub fn translate(&self, positions: &mut [Point3<f64>], shift: &Vector3<f64>) {
        for position in positions.iter_mut() {
            *position = self.re_image(*position + shift);
        }
    }

    /// Rotates `positions` about `pivot` so that direction `source` turns onto `target`.
    ///
    /// # Return
    ///
    /// The isometry that was applied.
    pub fn align(
        &self,
        positions: &mut [Point3<f64>],
        pivot: Point3<f64>,
        source: &Vector3<f64>,
        target: &Vector3<f64>,
        exclude: Option<usize>,
    ) -> Result<Isometry, GeometryError> {
        let isometry = Isometry::aligning(pivot, source, target)?;
        self.rotate(positions, &isometry, exclude);
        Ok(isometry)
    }
}
