//! Linear algebra type aliases for trajectories and rigid transforms
//!
//! Everything in the pipeline is 3D, so fixed-size nalgebra types are used
//! throughout instead of dynamic matrices.

use nalgebra::{Matrix3, Vector3};

pub const SPATIAL_DIM: usize = 3;

// ===== Points and channels =====
pub type Point3 = Vector3<f64>; // (x, y, z) position, velocity or acceleration

// ===== Rigid transform parts =====
pub type RotationMat = Matrix3<f64>; // proper rotation, det = +1
pub type CrossCovariance = Matrix3<f64>; // H = centered(A)^T * centered(B)

/// Convert a point to a plain array for serialization or plotting
pub fn point_to_array(p: &Point3) -> [f64; SPATIAL_DIM] {
    [p.x, p.y, p.z]
}
