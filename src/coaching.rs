/// Coaching analysis: turns aligned-vs-reference deviations into advice
///
/// The throw is cut into three equal phases by sample index (the last phase
/// takes the remainder). For each phase the mean signed deviation
/// (current − reference) is checked on two axes:
///   X (lateral):  positive = hand drifted right, negative = drifted left
///   Z (vertical): positive = hand too high,      negative = too low
/// Y is the direction of travel and is not coached.
///
/// Separately the final point's Z deviation decides the follow-through call.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CoachConfig;
use crate::error::{CoachError, Result};
use crate::types::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Early,
    Mid,
    Late,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Early, Phase::Mid, Phase::Late];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Early => "early (push-away / downswing)",
            Phase::Mid => "mid (bottom of the swing)",
            Phase::Late => "late (release / extension)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    DriftedRight,
    DriftedLeft,
    TooHigh,
    TooLow,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::DriftedRight => "hand drifted right (bring it back in)",
            Advisory::DriftedLeft => "hand drifted left (push it back out)",
            Advisory::TooHigh => "hand too high (lower your center of gravity)",
            Advisory::TooLow => "hand too low (lift the arm)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowThrough {
    EndedTooLow,
    EndedTooHigh,
    GoodExtension,
}

impl FollowThrough {
    pub fn message(&self) -> &'static str {
        match self {
            FollowThrough::EndedTooLow => {
                "hand dropped too early: finish the full follow-through, pointing at the target"
            }
            FollowThrough::EndedTooHigh => {
                "hand finished a little high, which can cost ball control"
            }
            FollowThrough::GoodExtension => "good extension, keep that finish",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAdvisory {
    pub phase: Phase,
    pub start: usize,
    pub end: usize,
    /// Mean X deviation over the segment; `None` when the segment is empty
    pub mean_dx: Option<f64>,
    pub mean_dz: Option<f64>,
    pub advisories: Vec<Advisory>,
}

impl SegmentAdvisory {
    pub fn is_on_target(&self) -> bool {
        self.advisories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub segments: Vec<SegmentAdvisory>,
    pub follow_through: FollowThrough,
    /// Final-point Z deviation (current − reference)
    pub end_dz: f64,
}

impl AdvisoryReport {
    pub fn segment(&self, phase: Phase) -> Option<&SegmentAdvisory> {
        self.segments.iter().find(|s| s.phase == phase)
    }

    pub fn all_advisories(&self) -> impl Iterator<Item = &Advisory> {
        self.segments.iter().flat_map(|s| s.advisories.iter())
    }

    pub fn advisory_count(&self) -> usize {
        self.all_advisories().count()
    }

    pub fn is_clean(&self) -> bool {
        self.advisory_count() == 0 && self.follow_through == FollowThrough::GoodExtension
    }
}

impl fmt::Display for AdvisoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========= Coaching Report =========")?;
        for segment in &self.segments {
            if segment.is_on_target() {
                writeln!(f, "✅ [{}]: on target", segment.phase.label())?;
            } else {
                let messages: Vec<&str> =
                    segment.advisories.iter().map(Advisory::message).collect();
                writeln!(f, "⚠️ [{}]: {}", segment.phase.label(), messages.join(", "))?;
            }
        }
        writeln!(f, "{}", "-".repeat(30))?;
        writeln!(f, "[follow-through]: {}", self.follow_through.message())?;
        write!(f, "===================================")
    }
}

/// `[0, n/3)`, `[n/3, 2n/3)`, `[2n/3, n)` with integer division
pub fn segment_bounds(n: usize) -> [(usize, usize); 3] {
    let seg = n / 3;
    [(0, seg), (seg, seg * 2), (seg * 2, n)]
}

fn classify_axis(
    deviation: f64,
    threshold: f64,
    positive: Advisory,
    negative: Advisory,
) -> Option<Advisory> {
    if deviation > threshold {
        Some(positive)
    } else if deviation < -threshold {
        Some(negative)
    } else {
        None
    }
}

#[derive(Clone, Debug)]
pub struct CoachingAnalyzer {
    threshold_x: f64,
    threshold_z: f64,
    follow_through_tolerance: f64,
}

impl CoachingAnalyzer {
    pub fn new(config: &CoachConfig) -> Self {
        Self {
            threshold_x: config.threshold_x,
            threshold_z: config.threshold_z,
            follow_through_tolerance: config.follow_through_tolerance,
        }
    }

    /// Compare an aligned throw against the (truncated) reference.
    ///
    /// # Errors
    ///
    /// - [`CoachError::InvalidInput`] if the inputs differ in length
    /// - [`CoachError::InsufficientData`] if they are empty
    pub fn analyze(&self, aligned: &[Point3], reference: &[Point3]) -> Result<AdvisoryReport> {
        if aligned.len() != reference.len() {
            return Err(CoachError::InvalidInput(format!(
                "aligned ({}) and reference ({}) lengths differ",
                aligned.len(),
                reference.len()
            )));
        }
        let n = aligned.len();
        if n == 0 {
            return Err(CoachError::insufficient_data(1, 0));
        }

        let segments = Phase::ALL
            .iter()
            .zip(segment_bounds(n))
            .map(|(&phase, (start, end))| {
                self.analyze_segment(phase, &aligned[start..end], &reference[start..end], start)
            })
            .collect();

        let end_dz = aligned[n - 1].z - reference[n - 1].z;
        let follow_through = if end_dz < -self.follow_through_tolerance {
            FollowThrough::EndedTooLow
        } else if end_dz > self.follow_through_tolerance {
            FollowThrough::EndedTooHigh
        } else {
            FollowThrough::GoodExtension
        };

        Ok(AdvisoryReport {
            segments,
            follow_through,
            end_dz,
        })
    }

    fn analyze_segment(
        &self,
        phase: Phase,
        aligned: &[Point3],
        reference: &[Point3],
        start: usize,
    ) -> SegmentAdvisory {
        let end = start + aligned.len();
        if aligned.is_empty() {
            return SegmentAdvisory {
                phase,
                start,
                end,
                mean_dx: None,
                mean_dz: None,
                advisories: Vec::new(),
            };
        }

        let count = aligned.len() as f64;
        let (sum_dx, sum_dz) = aligned
            .iter()
            .zip(reference.iter())
            .fold((0.0, 0.0), |(sx, sz), (a, r)| (sx + (a.x - r.x), sz + (a.z - r.z)));
        let mean_dx = sum_dx / count;
        let mean_dz = sum_dz / count;

        let advisories = [
            classify_axis(mean_dx, self.threshold_x, Advisory::DriftedRight, Advisory::DriftedLeft),
            classify_axis(mean_dz, self.threshold_z, Advisory::TooHigh, Advisory::TooLow),
        ]
        .into_iter()
        .flatten()
        .collect();

        SegmentAdvisory {
            phase,
            start,
            end,
            mean_dx: Some(mean_dx),
            mean_dz: Some(mean_dz),
            advisories,
        }
    }
}
