/// Example: Synthetic Throw Demo
///
/// Builds a reference throw and a few variations from synthetic IMU samples,
/// runs them through a coaching session and prints score and advisories.
///
/// Writes the reference to synthetic_reference.csv for plotting.

use bowling_coach_rs::config::CoachConfig;
use bowling_coach_rs::session::Session;
use bowling_coach_rs::storage::save_trajectory;
use bowling_coach_rs::types::{RawSample, RawSequence};

/// Stationary calibration window followed by a pendulum-like swing.
/// `lateral` adds a sideways push, `lift` an extra vertical component.
fn throw(lateral: f64, lift: f64) -> RawSequence {
    let mut samples = vec![RawSample::accel_only(0.0, 0.0, 1.0); 10];
    for i in 0..90 {
        let t = i as f64 / 90.0;
        let swing = (std::f64::consts::PI * t).sin();
        samples.push(RawSample::new(
            lateral * t,
            0.8 * swing,
            1.0 + lift * t - 0.3 * (2.0 * std::f64::consts::PI * t).sin(),
            0.0,
            120.0 * swing,
            0.0,
        ));
    }
    // Non-empty by construction
    RawSequence::new(samples).expect("synthetic throw")
}

fn main() {
    println!("=== Synthetic Throw Demo ===\n");

    let config = CoachConfig::centimeter_scale();
    let mut session = Session::new(config, None);

    let reference = session.analyze(&throw(0.0, 0.0)).expect("reference throw");
    let end = reference.trajectory.final_position();
    println!(
        "Reference: {} samples, path {:.3} m, end ({:.3}, {:.3}, {:.3})",
        reference.trajectory.len(),
        reference.trajectory.path_length(),
        end.x,
        end.y,
        end.z
    );
    if let Err(e) = save_trajectory("synthetic_reference.csv", &reference.trajectory) {
        eprintln!("could not write synthetic_reference.csv: {}", e);
    }
    session.accept(reference.trajectory);

    let scenarios = [
        ("repeat of the reference", 0.0, 0.0),
        ("pushed right", 0.4, 0.0),
        ("pushed left", -0.4, 0.0),
        ("lifted", 0.0, 0.5),
        ("dropped", 0.0, -0.5),
    ];

    for (name, lateral, lift) in scenarios {
        println!("--- {} ---", name);
        let analysis = session.analyze(&throw(lateral, lift)).expect("variation throw");
        if let Some(comparison) = &analysis.comparison {
            println!("Score (MSE): {:.6}", comparison.alignment.score());
            println!("{}\n", comparison.report);
        }
    }
}
