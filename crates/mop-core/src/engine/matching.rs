use itertools::Itertools;
use nalgebra::Point3;
use thiserror::Error;

/// Largest point set matched by exhaustive search (8! = 40320 permutations).
pub const MAX_BRUTE_FORCE_POINTS: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchingError {
    #[error("Cannot match {points} points to {targets} targets")]
    CountMismatch { points: usize, targets: usize },
    #[error("Matching {0} points exceeds the exhaustive search limit")]
    TooManyPoints(usize),
}

/// Result of [`nearest_assignment`]: `targets[i]` is the target index assigned to point `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub targets: Vec<usize>,
    pub cost: f64,
}

/// Assigns each point to a distinct target, minimising the total squared distance.
///
/// All permutations are enumerated in lexicographic order and the first one with the
/// lowest cost wins, so ties resolve deterministically towards the identity.
///
/// # Errors
///
/// Returns [`MatchingError`] if the sets differ in size or exceed
/// [`MAX_BRUTE_FORCE_POINTS`].
pub fn nearest_assignment(
    points: &[Point3<f64>],
    targets: &[Point3<f64>],
) -> Result<Assignment, MatchingError> {
    if points.len() != targets.len() {
        return Err(MatchingError::CountMismatch {
            points: points.len(),
            targets: targets.len(),
        });
    }
    if points.len() > MAX_BRUTE_FORCE_POINTS {
        return Err(MatchingError::TooManyPoints(points.len()));
    }
    if points.is_empty() {
        return Ok(Assignment {
            targets: Vec::new(),
            cost: 0.0,
        });
    }

    let mut best: Option<Assignment> = None;
    for permutation in (0..targets.len()).permutations(targets.len()) {
        let cost: f64 = points
            .iter()
            .zip(&permutation)
            .map(|(p, &t)| (p - targets[t]).norm_squared())
            .sum();
        if best.as_ref().is_none_or(|b| cost < b.cost) {
            best = Some(Assignment {
                targets: permutation,
                cost,
            });
        }
    }
    best.ok_or(MatchingError::CountMismatch {
        points: points.len(),
        targets: targets.len(),
    })
}
