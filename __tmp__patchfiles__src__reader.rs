//! Frame iteration and aggregation.

use std::io::Read;

use crate::frame::Frame;
use crate::result::Result;

/// Opens a stream of concatenated frames, optionally folding consecutive
/// frames with identical schemas into aggregated groups.
pub struct Reader {
    frames: Vec<Frame>,
}

impl Reader {
    pub fn open<R: Read>(mut source: R, aggregated: bool, max_aggregated: i64) -> Result<Self> {
        let mut parsed = Vec::new();
        while let Some(frame) = Frame::read(&mut source)? {
            parsed.push(frame);
        }

        let frame_count = parsed.len();
        let frames = if aggregated { aggregate(parsed, max_aggregated) } else { parsed };
        tracing::debug!(physical_frames = frame_count, groups = frames.len(), aggregated, "opened reader");
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

/// Any non-positive `max_aggregated` means unlimited: callers that only
/// know about `-1` for "unlimited" still get the behaviour they expect.
fn aggregate(frames: Vec<Frame>, max_aggregated: i64) -> Vec<Frame> {
    let unlimited = max_aggregated <= 0;
    let mut grouped: Vec<Frame> = Vec::new();

    for frame in frames {
        let can_extend = grouped
            .last()
            .is_some_and(|last| last.column_dict() == frame.column_dict() && (unlimited || (last.group_size() as i64) < max_aggregated));
        if can_extend {
            grouped.last_mut().unwrap().append(frame).expect("column_dict equality already checked");
        } else {
            grouped.push(frame);
        }
    }

    grouped
}
