//! Screen capture backends.
//!
//! Every backend returns frames in the same packed RGB layout that template
//! decoding produces, so match offsets are screen coordinates.

use crate::frame::Frame;
use crate::util::TriggerResult;

pub mod replay;

#[cfg(feature = "desktop")]
pub mod desktop;

/// Source of full-screen frames.
pub trait ScreenCapture: Send {
    /// Takes a snapshot of the display.
    ///
    /// Fails with `CaptureUnavailable` when the display cannot be read.
    fn capture(&mut self) -> TriggerResult<Frame>;
}
