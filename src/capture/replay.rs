//! Capture backend that replays pre-loaded frames.

use std::path::Path;

use crate::capture::ScreenCapture;
use crate::frame::io::load_frame;
use crate::frame::Frame;
use crate::util::{TriggerError, TriggerResult};

/// Cycles through a fixed list of frames, one per capture.
#[derive(Clone, Debug, Default)]
pub struct ReplayCapture {
    frames: Vec<Frame>,
    next: usize,
}

impl ReplayCapture {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames, next: 0 }
    }

    /// Loads every path as a frame, in order.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> TriggerResult<Self> {
        let frames = paths
            .iter()
            .map(load_frame)
            .collect::<TriggerResult<Vec<_>>>()?;
        Ok(Self::new(frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl ScreenCapture for ReplayCapture {
    fn capture(&mut self) -> TriggerResult<Frame> {
        if self.frames.is_empty() {
            return Err(TriggerError::CaptureUnavailable {
                reason: "no frames to replay".to_string(),
            });
        }
        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next = (self.next + 1) % self.frames.len();
        Ok(frame)
    }
}
