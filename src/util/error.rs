//! Error types for screentrigger.

use thiserror::Error;

/// Result alias for screentrigger operations.
pub type TriggerResult<T> = std::result::Result<T, TriggerError>;

/// Errors surfaced by capture, matching, dispatch and the automation loop.
///
/// Per-cycle failures (`CaptureUnavailable`, `InputInjectionFailed`,
/// `TemplateLargerThanFrame` seen during a scan) are logged by the loop and
/// never stop it. Configuration failures are returned to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TriggerError {
    /// The display subsystem could not produce a frame.
    #[error("screen capture unavailable: {reason}")]
    CaptureUnavailable { reason: String },
    /// The template exceeds the frame on at least one axis.
    #[error(
        "template {template_width}x{template_height} is larger than frame {frame_width}x{frame_height}"
    )]
    TemplateLargerThanFrame {
        template_width: usize,
        template_height: usize,
        frame_width: usize,
        frame_height: usize,
    },
    /// A template file could not be decoded.
    #[error("invalid template image {path}: {reason}")]
    InvalidTemplateImage { path: String, reason: String },
    /// The environment rejected synthetic input.
    #[error("input injection failed: {reason}")]
    InputInjectionFailed { reason: String },
    /// Start was requested with an empty task set.
    #[error("no tasks configured")]
    NoTasksConfigured,
    /// Start was requested before any baseline screenshot.
    #[error("no baseline capture, take a screenshot first")]
    NoBaselineCapture,
    /// A task with the same name is already configured.
    #[error("task already configured: {name}")]
    DuplicateTask { name: String },
    /// No task with the given name exists.
    #[error("unknown task: {name}")]
    UnknownTask { name: String },
    /// Width or height is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Pixel buffer is shorter than the dimensions require.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A crop rectangle falls outside the frame.
    #[error("region out of bounds: ({x}, {y}) {width}x{height} in {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Encoding an annotated frame failed.
    #[error("image encoding failed: {reason}")]
    ImageEncode { reason: String },
    /// The worker thread could not be spawned or did not hand back its dispatcher.
    #[error("automation worker unavailable: {reason}")]
    WorkerUnavailable { reason: String },
}
