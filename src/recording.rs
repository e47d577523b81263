/// Line protocol framing for recorded throws
///
/// The sensor rig prints one CSV line per sample between two marker lines:
///
/// ```text
/// START_RECORDING
/// 0.01,-0.02,0.98,0.5,-1.2,0.0
/// ...
/// STOP_RECORDING
/// ```
///
/// `RecordingParser` is fed lines one at a time (from a file, stdin or a
/// serial terminal pipe) and emits a [`RecordingEvent`] at every stop marker.
/// Malformed lines are dropped here so the core only ever sees clean samples.
use std::io::BufRead;

use log::{debug, warn};

use crate::config::CoachConfig;
use crate::error::{CoachError, Result};
use crate::types::{RawSample, RawSequence};

pub const START_MARKER: &str = "START_RECORDING";
pub const STOP_MARKER: &str = "STOP_RECORDING";
pub const FIELDS_PER_LINE: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordingEvent {
    /// A usable recording; `malformed` lines were dropped along the way
    Complete {
        sequence: RawSequence,
        malformed: usize,
    },
    /// Fewer buffered lines than the minimum sample count
    TooShort { lines: usize },
    /// Enough lines, but none parsed as a sample
    Empty { malformed: usize },
}

/// Parse `ax,ay,az,gx,gy,gz`.
///
/// # Errors
///
/// [`CoachError::MalformedSample`] unless there are exactly six fields that
/// all parse as numbers.
pub fn parse_sample_line(line: &str) -> Result<RawSample> {
    let parts: Vec<&str> = line.trim().split(',').collect();
    if parts.len() != FIELDS_PER_LINE {
        return Err(CoachError::MalformedSample(format!(
            "expected {} fields, got {}: {:?}",
            FIELDS_PER_LINE,
            parts.len(),
            line
        )));
    }

    let mut fields = [0.0; FIELDS_PER_LINE];
    for (slot, part) in fields.iter_mut().zip(parts.iter()) {
        *slot = part
            .trim()
            .parse::<f64>()
            .map_err(|e| CoachError::MalformedSample(format!("{:?}: {}", part, e)))?;
    }
    Ok(RawSample::from_fields(fields))
}

#[derive(Debug, Clone)]
pub struct RecordingParser {
    buffer: Vec<String>,
    recording: bool,
    min_lines: usize,
}

impl RecordingParser {
    pub fn new(min_lines: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(512),
            recording: false,
            min_lines,
        }
    }

    pub fn from_config(config: &CoachConfig) -> Self {
        Self::new(config.min_samples)
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Lines buffered in the current recording
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one line; returns an event when a recording ends
    pub fn feed_line(&mut self, line: &str) -> Option<RecordingEvent> {
        let line = line.trim();

        if line == START_MARKER {
            if self.recording {
                debug!("restart marker while recording, dropping {} lines", self.buffer.len());
            }
            self.buffer.clear();
            self.recording = true;
            return None;
        }

        if line == STOP_MARKER {
            if !self.recording {
                debug!("stop marker outside a recording, ignored");
                return None;
            }
            self.recording = false;
            let lines = std::mem::take(&mut self.buffer);
            return Some(self.finish(lines));
        }

        if self.recording && !line.is_empty() && line.contains(',') {
            self.buffer.push(line.to_string());
        }
        None
    }

    fn finish(&self, lines: Vec<String>) -> RecordingEvent {
        if lines.len() < self.min_lines {
            return RecordingEvent::TooShort { lines: lines.len() };
        }

        let total = lines.len();
        let samples: Vec<RawSample> = lines
            .iter()
            .filter_map(|line| parse_sample_line(line).ok())
            .collect();
        let malformed = total - samples.len();
        if malformed > 0 {
            warn!("dropped {} malformed lines of {}", malformed, total);
        }

        match RawSequence::new(samples) {
            Ok(sequence) => RecordingEvent::Complete {
                sequence,
                malformed,
            },
            Err(_) => RecordingEvent::Empty { malformed },
        }
    }
}

/// Drain a stream and collect every recording event in it.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the read.
pub fn read_recordings<R: BufRead>(
    mut reader: R,
    config: &CoachConfig,
) -> Result<Vec<RecordingEvent>> {
    let mut parser = RecordingParser::from_config(config);
    let mut events = Vec::new();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        if let Some(event) = parser.feed_line(&line) {
            events.push(event);
        }
    }
    if parser.is_recording() {
        warn!(
            "stream ended mid-recording, {} buffered lines discarded",
            parser.buffered()
        );
    }
    Ok(events)
}
