use std::fs;
use std::io::Cursor;

use approx::assert_abs_diff_eq;
use bowling_coach_rs::alignment::AlignmentScorer;
use bowling_coach_rs::coaching::{Advisory, CoachingAnalyzer, FollowThrough};
use bowling_coach_rs::config::CoachConfig;
use bowling_coach_rs::recording::{read_recordings, RecordingEvent, START_MARKER, STOP_MARKER};
use bowling_coach_rs::session::Session;
use bowling_coach_rs::storage::ReferenceStore;
use bowling_coach_rs::types::{Point3, RawSequence};

fn straight_lane() -> Vec<Point3> {
    (0..100)
        .map(|i| Point3::new(0.0, 10.0 * i as f64 / 99.0, 0.0))
        .collect()
}

fn shifted(points: &[Point3], offset: Point3) -> Vec<Point3> {
    points.iter().map(|p| p + offset).collect()
}

#[test]
fn straight_line_offset_is_removed_by_alignment() {
    let config = CoachConfig::default();
    let reference = straight_lane();
    let current = shifted(&reference, Point3::new(15.0, 0.0, 0.0));

    let result = AlignmentScorer::new(&config).score_positions(&current, &reference);
    assert!(!result.outcome.is_failure());
    assert!(result.score() < 1e-12);
    let transform = result.transform.unwrap();
    assert_abs_diff_eq!(transform.translation, Point3::new(-15.0, 0.0, 0.0), epsilon = 1e-9);
    assert_abs_diff_eq!(transform.rotation_angle(), 0.0, epsilon = 1e-6);
    for (a, b) in result.aligned_current.iter().zip(&reference) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-9);
    }

    let report = CoachingAnalyzer::new(&config)
        .analyze(&result.aligned_current, &result.truncated_reference)
        .unwrap();
    assert!(!report
        .all_advisories()
        .any(|a| matches!(a, Advisory::DriftedRight | Advisory::DriftedLeft)));
    assert_eq!(report.follow_through, FollowThrough::GoodExtension);
}

#[test]
fn unaligned_offset_drifts_right_everywhere() {
    let config = CoachConfig::default();
    let reference = straight_lane();
    let current = shifted(&reference, Point3::new(15.0, 0.0, 0.0));

    let report = CoachingAnalyzer::new(&config).analyze(&current, &reference).unwrap();
    assert_eq!(report.segments.len(), 3);
    for segment in &report.segments {
        assert_eq!(segment.advisories, vec![Advisory::DriftedRight]);
        assert_abs_diff_eq!(segment.mean_dx.unwrap(), 15.0, epsilon = 1e-9);
    }
}

#[test]
fn curved_lane_recovers_translation() {
    let config = CoachConfig::default();
    let reference: Vec<Point3> = (0..100)
        .map(|i| {
            let s = i as f64 / 99.0;
            Point3::new(0.0, 10.0 * s, 0.3 * (std::f64::consts::PI * s).sin())
        })
        .collect();
    let current = shifted(&reference, Point3::new(15.0, 0.0, 0.0));

    let result = AlignmentScorer::new(&config).score_positions(&current, &reference);
    let transform = result.transform.unwrap();
    assert_abs_diff_eq!(transform.translation, Point3::new(-15.0, 0.0, 0.0), epsilon = 1e-9);
    assert_abs_diff_eq!(transform.rotation_angle(), 0.0, epsilon = 1e-6);
    assert!(result.score() < 1e-12);
}

fn recording_text(push: f64) -> String {
    let mut text = String::from("rig ready\n");
    text.push_str(START_MARKER);
    text.push('\n');
    for _ in 0..10 {
        text.push_str("0.0,0.0,1.0,0.0,0.0,0.0\n");
    }
    for i in 0..50 {
        let phase = i as f64 / 50.0;
        text.push_str(&format!(
            "{},{},{},0.5,-0.2,0.1\n",
            push * (phase * 5.0).sin(),
            0.4,
            1.0 + 0.1 * phase
        ));
    }
    text.push_str("garbage,line\n");
    text.push_str(STOP_MARKER);
    text.push('\n');
    text
}

fn sequences(text: &str, config: &CoachConfig) -> Vec<RawSequence> {
    read_recordings(Cursor::new(text.as_bytes()), config)
        .unwrap()
        .into_iter()
        .filter_map(|event| match event {
            RecordingEvent::Complete { sequence, .. } => Some(sequence),
            _ => None,
        })
        .collect()
}

#[test]
fn recorded_stream_through_session() {
    let config = CoachConfig::default();
    let text = format!("{}{}", recording_text(0.2), recording_text(0.2));
    let throws = sequences(&text, &config);
    assert_eq!(throws.len(), 2);
    assert_eq!(throws[0].len(), 60);

    let mut session = Session::new(config, None);
    let first = session.analyze(&throws[0]).unwrap();
    assert!(first.comparison.is_none());
    session.accept(first.trajectory);

    let second = session.analyze(&throws[1]).unwrap();
    let comparison = second.comparison.unwrap();
    assert_eq!(comparison.alignment.len(), 60);
    assert!(comparison.alignment.score() < 1e-12);
    assert!(comparison.report.is_clean());
}

#[test]
fn promoted_reference_survives_restart() {
    let config = CoachConfig::default();
    let dir = std::env::temp_dir().join(format!("bowling_coach_pipeline_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    let store = ReferenceStore::new(&dir);

    let best = sequences(&recording_text(0.2), &config).remove(0);
    let other = sequences(&recording_text(0.6), &config).remove(0);

    let mut live = Session::new(config.clone(), None);
    let best_traj = live.analyze(&best).unwrap().trajectory;
    store.promote(&best_traj).unwrap();
    live.accept(best_traj);
    let live_score = live.analyze(&other).unwrap().comparison.unwrap().alignment.score();

    let restarted = Session::new(config, store.load_reference().unwrap());
    assert!(restarted.has_reference());
    let restarted_score = restarted
        .analyze(&other)
        .unwrap()
        .comparison
        .unwrap()
        .alignment
        .score();
    assert_eq!(live_score, restarted_score);
    assert!(live_score > 0.0);

    let _ = fs::remove_dir_all(&dir);
}
