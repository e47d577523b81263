/// Trajectory reconstruction: raw IMU samples -> position
///
/// Bias calibration followed by double rectangular integration:
///   bias  = mean(accel[0..calibration_samples])      (sensor held still at start)
///   a_k   = (raw_k - bias) * g_to_mss                 [m/s²]
///   v_k   = dt * Σ_{i<=k} a_i                         [m/s]
///   p_k   = dt * Σ_{i<=k} v_i                         [m]
///
/// Left-endpoint Euler sums, no drift correction. Positions wander over a
/// throw; that is accepted here and handled by calibrating coaching thresholds.
/// Gyro channels are carried through untouched.
use log::debug;

use crate::config::CoachConfig;
use crate::error::{CoachError, Result};
use crate::types::{Point3, RawSample, RawSequence, Trajectory, TrajectoryPoint};

#[derive(Clone, Debug)]
pub struct TrajectoryReconstructor {
    dt: f64,
    g_to_mss: f64,
    calibration_samples: usize,
    min_samples: usize,
}

impl TrajectoryReconstructor {
    pub fn new(config: &CoachConfig) -> Self {
        Self {
            dt: config.dt,
            g_to_mss: config.g_to_mss,
            calibration_samples: config.calibration_samples,
            min_samples: config.min_samples,
        }
    }

    /// Mean accelerometer reading over the leading quiet period (g-units)
    pub fn estimate_bias(&self, samples: &[RawSample]) -> Point3 {
        let window = &samples[..self.calibration_samples.min(samples.len())];
        if window.is_empty() {
            return Point3::zeros();
        }
        window.iter().map(RawSample::accel).sum::<Point3>() / window.len() as f64
    }

    /// Build the trajectory for one recorded throw.
    ///
    /// # Errors
    ///
    /// [`CoachError::InsufficientData`] when the sequence is shorter than the
    /// configured minimum; nothing is integrated in that case.
    pub fn reconstruct(&self, sequence: &RawSequence) -> Result<Trajectory> {
        if sequence.len() < self.min_samples {
            return Err(CoachError::insufficient_data(
                self.min_samples,
                sequence.len(),
            ));
        }

        let bias = self.estimate_bias(sequence.samples());
        debug!(
            "bias over {} samples: ({:.4}, {:.4}, {:.4}) g",
            self.calibration_samples.min(sequence.len()),
            bias.x,
            bias.y,
            bias.z
        );

        let mut accel_sum = Point3::zeros();
        let mut velocity_sum = Point3::zeros();
        let points = sequence
            .iter()
            .map(|raw| {
                let accel = (raw.accel() - bias) * self.g_to_mss;
                accel_sum += accel;
                let velocity = accel_sum * self.dt;
                velocity_sum += velocity;
                let position = velocity_sum * self.dt;
                TrajectoryPoint {
                    raw: *raw,
                    accel,
                    velocity,
                    position,
                }
            })
            .collect();

        Trajectory::from_points(points)
    }
}

/// Convenience wrapper around [`TrajectoryReconstructor::reconstruct`]
pub fn reconstruct_trajectory(sequence: &RawSequence, config: &CoachConfig) -> Result<Trajectory> {
    TrajectoryReconstructor::new(config).reconstruct(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sequence(samples: Vec<RawSample>) -> RawSequence {
        RawSequence::new(samples).unwrap()
    }

    #[test]
    fn test_rejects_short_sequence() {
        let config = CoachConfig::default();
        let seq = sequence(vec![RawSample::accel_only(0.0, 0.0, 1.0); 9]);
        match reconstruct_trajectory(&seq, &config) {
            Err(CoachError::InsufficientData { min, actual }) => {
                assert_eq!(min, 10);
                assert_eq!(actual, 9);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_static_sensor_stays_at_origin() {
        // Perfectly still: every channel after bias removal is exactly zero
        let config = CoachConfig::default();
        let seq = sequence(vec![RawSample::new(0.25, -0.125, 1.0, 0.5, 0.1, -0.2); 50]);
        let traj = reconstruct_trajectory(&seq, &config).unwrap();

        assert_eq!(traj.len(), 50);
        for p in traj.points() {
            assert_eq!(p.accel, Point3::zeros());
            assert_eq!(p.velocity, Point3::zeros());
            assert_eq!(p.position, Point3::zeros());
        }
    }

    #[test]
    fn test_constant_acceleration_integration() {
        // 10 still samples then a constant +0.5 g on X
        let config = CoachConfig::default();
        let mut samples = vec![RawSample::accel_only(0.0, 0.0, 1.0); 10];
        samples.extend(vec![RawSample::accel_only(0.5, 0.0, 1.0); 40]);
        let traj = reconstruct_trajectory(&sequence(samples), &config).unwrap();

        let a = 0.5 * G;
        let dt = config.dt;
        for k in 1..=40 {
            let p = traj.points()[9 + k];
            assert_relative_eq!(p.accel.x, a, epsilon = 1e-12);
            // v_k = a * k * dt
            assert_relative_eq!(p.velocity.x, a * k as f64 * dt, epsilon = 1e-9);
            // p_k = Σ_{i=1..k} i * a * dt²
            let expected: f64 = (1..=k).map(|i| i as f64 * a * dt * dt).sum();
            assert_relative_eq!(p.position.x, expected, epsilon = 1e-9);
            assert_eq!(p.position.y, 0.0);
            assert_eq!(p.position.z, 0.0);
        }
    }

    #[test]
    fn test_bias_uses_only_calibration_window() {
        let config = CoachConfig::default();
        let mut samples = vec![RawSample::accel_only(0.1, 0.2, 0.9); 10];
        samples.push(RawSample::accel_only(5.0, 5.0, 5.0));
        let reconstructor = TrajectoryReconstructor::new(&config);
        let bias = reconstructor.estimate_bias(&samples);
        assert_relative_eq!(bias.x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(bias.y, 0.2, epsilon = 1e-12);
        assert_relative_eq!(bias.z, 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_first_point_already_integrated() {
        // Origin of integration is sample 0, which already contributes dt² * a_0
        let config = CoachConfig::default();
        let mut samples = vec![RawSample::accel_only(1.0, 0.0, 0.0)];
        samples.extend(vec![RawSample::accel_only(0.0, 0.0, 0.0); 9]);
        let traj = reconstruct_trajectory(&sequence(samples), &config).unwrap();
        let first = traj.points()[0];
        // bias = 0.1 g, a_0 = 0.9 g
        let a0 = 0.9 * G;
        assert_relative_eq!(first.position.x, a0 * config.dt * config.dt, epsilon = 1e-12);
    }

    #[test]
    fn test_gyro_carried_through() {
        let config = CoachConfig::default();
        let seq = sequence(vec![RawSample::new(0.0, 0.0, 1.0, 1.5, -2.5, 3.5); 12]);
        let traj = reconstruct_trajectory(&seq, &config).unwrap();
        assert!(traj.points().iter().all(|p| p.raw.gx == 1.5 && p.raw.gz == 3.5));
    }

    const G: f64 = crate::config::G_TO_MSS;
}
