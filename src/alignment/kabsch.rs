/// Rigid alignment of corresponding point sets (Kabsch solution)
///
/// Finds the proper rotation R and translation t minimising
///   Σ ||R·a_i + t − b_i||²
/// for positional correspondence (a_i pairs with b_i, no matching step).
///
///   1. centre both sets on their centroids
///   2. H = Σ a_c · b_cᵀ                     (3×3 cross-covariance)
///   3. H = U·S·Vᵀ
///   4. R = V·Uᵀ, and if det(R) < 0 flip the third row of Vᵀ and recompute
///   5. t = c_b − R·c_a
///
/// Fewer than 3 points, or colinear sets, leave R underdetermined. Those
/// resolve to the rotation closest to identity that still maps the line
/// direction onto the target line (identity for coincident points).
use nalgebra::{Rotation3, SVD};

use crate::error::{CoachError, Result};
use crate::types::{CrossCovariance, Point3, RotationMat};

/// Singular values below this fraction of the largest count as zero
const RANK_TOLERANCE: f64 = 1e-12;

/// Proper rigid transform p -> R·p + t
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
    pub rotation: RotationMat,
    pub translation: Point3,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: RotationMat::identity(),
            translation: Point3::zeros(),
        }
    }

    pub fn apply(&self, point: &Point3) -> Point3 {
        self.rotation * point + self.translation
    }

    pub fn apply_all(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|p| self.apply(p)).collect()
    }

    /// Rotation angle in radians, from trace(R) = 1 + 2cos(θ)
    pub fn rotation_angle(&self) -> f64 {
        ((self.rotation.trace() - 1.0) / 2.0).clamp(-1.0, 1.0).acos()
    }
}

pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::zeros();
    }
    points.iter().sum::<Point3>() / points.len() as f64
}

/// H = Σ (a_i − c_a)(b_i − c_b)ᵀ
pub fn cross_covariance(a: &[Point3], b: &[Point3]) -> CrossCovariance {
    let centroid_a = centroid(a);
    let centroid_b = centroid(b);
    let mut h = CrossCovariance::zeros();
    for (pa, pb) in a.iter().zip(b.iter()) {
        h += (pa - centroid_a) * (pb - centroid_b).transpose();
    }
    h
}

/// Least-squares rigid transform carrying `a` onto `b`.
///
/// # Errors
///
/// - [`CoachError::InvalidInput`] if the sets differ in length
/// - [`CoachError::InsufficientData`] if they are empty
/// - [`CoachError::AlignmentFailure`] on non-finite input, overflow in the
///   cross-covariance or transform, or an SVD that does not converge
pub fn kabsch(a: &[Point3], b: &[Point3]) -> Result<RigidTransform> {
    if a.len() != b.len() {
        return Err(CoachError::InvalidInput(format!(
            "point sets differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Err(CoachError::insufficient_data(1, 0));
    }
    if a.iter().chain(b.iter()).any(|p| !p.iter().all(|v| v.is_finite())) {
        return Err(CoachError::alignment("non-finite coordinate in point set"));
    }

    let centroid_a = centroid(a);
    let centroid_b = centroid(b);
    let h = cross_covariance(a, b);
    if !is_finite_matrix(&h) {
        return Err(CoachError::alignment("cross-covariance overflowed"));
    }

    // max_niter = 0 lets nalgebra iterate until convergence or give up
    let svd = SVD::try_new(h, true, true, f64::EPSILON, 0)
        .ok_or_else(|| CoachError::alignment("SVD did not converge"))?;
    let sigma_max = svd.singular_values.max();
    let rank = svd
        .singular_values
        .iter()
        .filter(|&&s| s > sigma_max * RANK_TOLERANCE)
        .count();
    let dominant = svd.singular_values.imax();
    let u = svd
        .u
        .ok_or_else(|| CoachError::alignment("SVD returned no U"))?;
    let mut v_t = svd
        .v_t
        .ok_or_else(|| CoachError::alignment("SVD returned no V^T"))?;

    // Line direction in each set, taken before the reflection fix touches V^T
    let line = (rank == 1).then(|| {
        (
            u.column(dominant).into_owned(),
            v_t.row(dominant).transpose(),
        )
    });

    let mut rotation = v_t.transpose() * u.transpose();

    // Reflection case
    if rotation.determinant() < 0.0 {
        for i in 0..3 {
            v_t[(2, i)] *= -1.0;
        }
        rotation = v_t.transpose() * u.transpose();
    }

    // Coincident or colinear sets: pick the smallest rotation that still
    // carries the point direction onto the target direction
    if rank == 0 {
        rotation = RotationMat::identity();
    } else if let Some((from, to)) = line {
        if let Some(minimal) = Rotation3::rotation_between(&from, &to) {
            rotation = minimal.into_inner();
        }
    }

    let translation = centroid_b - rotation * centroid_a;
    if !is_finite_matrix(&rotation) || !translation.iter().all(|v| v.is_finite()) {
        return Err(CoachError::alignment("non-finite rigid transform"));
    }

    Ok(RigidTransform {
        rotation,
        translation,
    })
}

fn is_finite_matrix(m: &RotationMat) -> bool {
    m.iter().all(|v| v.is_finite())
}
