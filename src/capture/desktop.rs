//! Primary-monitor capture via `xcap` (feature `desktop`).

use std::fmt::Display;

use xcap::Monitor;

use crate::capture::ScreenCapture;
use crate::frame::Frame;
use crate::trace::trace_span;
use crate::util::{TriggerError, TriggerResult};

/// Captures the monitor containing the origin, or the first monitor.
///
/// Monitors are enumerated on every capture so display changes between
/// cycles are picked up.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopCapture;

impl DesktopCapture {
    pub fn new() -> Self {
        Self
    }
}

fn unavailable(err: impl Display) -> TriggerError {
    TriggerError::CaptureUnavailable {
        reason: err.to_string(),
    }
}

impl ScreenCapture for DesktopCapture {
    fn capture(&mut self) -> TriggerResult<Frame> {
        let _span = trace_span!("desktop_capture").entered();
        let monitor = match Monitor::from_point(0, 0) {
            Ok(monitor) => monitor,
            Err(_) => Monitor::all()
                .map_err(unavailable)?
                .into_iter()
                .next()
                .ok_or_else(|| unavailable("no monitors found"))?,
        };
        let img = monitor.capture_image().map_err(unavailable)?;
        let width = img.width() as usize;
        let height = img.height() as usize;
        Frame::from_rgba(img.as_raw(), width, height)
    }
}
