//! Pointer input synthesis.
//!
//! `ActionKind` is closed: every backend matches it exhaustively, so a new
//! action is a new variant rather than a new string branch.

use std::time::Duration;

use crate::frame::Point;
use crate::task::ActionKind;
use crate::util::TriggerResult;

pub mod recording;

#[cfg(feature = "desktop")]
pub mod desktop;

/// Interval between pointer moves during a drag.
pub const DRAG_STEP: Duration = Duration::from_millis(10);

/// Synthesizes input at absolute screen coordinates.
pub trait ActionDispatcher: Send {
    /// Performs `action` at `point`.
    ///
    /// Fails with `InputInjectionFailed` when the environment rejects
    /// synthetic input. Implementations must not leave a button pressed.
    fn dispatch(&mut self, action: &ActionKind, point: Point) -> TriggerResult<()>;
}

/// Evenly spaced pointer positions for a drag from `start` by `(dx, dy)`.
///
/// Returns the positions after `start` (the last one is the drag end) and
/// the pause before each move.
pub fn drag_waypoints(
    start: Point,
    dx: i32,
    dy: i32,
    duration: Duration,
) -> (Vec<Point>, Duration) {
    let steps = (duration.as_millis() / DRAG_STEP.as_millis()).max(1) as i64;
    let waypoints = (1..=steps)
        .map(|i| {
            let x = dx as i64 * i / steps;
            let y = dy as i64 * i / steps;
            start.offset(x as i32, y as i32)
        })
        .collect();
    (waypoints, duration / steps as u32)
}
