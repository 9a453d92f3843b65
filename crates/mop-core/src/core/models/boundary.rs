use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

/// Periodic wraparound used to keep mutated atom positions in the canonical cell.
pub trait Boundary: Debug + Send + Sync {
    /// Returns the shift that maps `point` onto its central image.
    ///
    /// Adding the returned vector to `point` yields the image inside the cell; a point
    /// already inside yields the zero vector.
    fn central_image(&self, point: &Point3<f64>) -> Vector3<f64>;

    /// Edge lengths of the cell, or `None` for a non-periodic boundary.
    fn dimensions(&self) -> Option<Vector3<f64>>;
}

/// Rectangular periodic cell centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBoundary {
    lengths: Vector3<f64>,
}

impl PeriodicBoundary {
    /// Creates a rectangular cell. Returns `None` unless every length is finite and positive.
    pub fn new(lengths: Vector3<f64>) -> Option<Self> {
        if lengths.iter().all(|l| l.is_finite() && *l > 0.0) {
            Some(Self { lengths })
        } else {
            None
        }
    }

    pub fn cubic(length: f64) -> Option<Self> {
        Self::new(Vector3::repeat(length))
    }

    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }
}

impl Boundary for PeriodicBoundary {
    fn central_image(&self, point: &Point3<f64>) -> Vector3<f64> {
        Vector3::from_fn(|i, _| -self.lengths[i] * (point[i] / self.lengths[i]).round())
    }

    fn dimensions(&self) -> Option<Vector3<f64>> {
        Some(self.lengths)
    }
}

/// Boundary without periodicity; positions are never shifted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenBoundary;

impl Boundary for OpenBoundary {
    fn central_image(&self, _point: &Point3<f64>) -> Vector3<f64> {
        Vector3::zeros()
    }

    fn dimensions(&self) -> Option<Vector3<f64>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_boundary_rejects_non_positive_lengths() {
        assert!(PeriodicBoundary::new(Vector3::new(10.0, 0.0, 10.0)).is_none());
        assert!(PeriodicBoundary::new(Vector3::new(10.0, -1.0, 10.0)).is_none());
        assert!(PeriodicBoundary::cubic(f64::NAN).is_none());
        assert!(PeriodicBoundary::cubic(12.0).is_some());
    }

    #[test]
    fn point_inside_cell_is_not_shifted() {
        let boundary = PeriodicBoundary::cubic(10.0).unwrap();
        let shift = boundary.central_image(&Point3::new(4.9, -4.9, 0.0));
        assert_eq!(shift, Vector3::zeros());
    }

    #[test]
    fn point_outside_cell_is_wrapped_to_central_image() {
        let boundary = PeriodicBoundary::new(Vector3::new(10.0, 20.0, 30.0)).unwrap();
        let point = Point3::new(6.0, -31.0, 44.0);
        let wrapped = point + boundary.central_image(&point);
        assert!((wrapped - Point3::new(-4.0, 9.0, 14.0)).norm() < 1e-12);
    }

    #[test]
    fn open_boundary_never_shifts() {
        let boundary = OpenBoundary;
        assert_eq!(
            boundary.central_image(&Point3::new(1e6, -1e6, 3.0)),
            Vector3::zeros()
        );
        assert!(boundary.dimensions().is_none());
    }
}
