//! Pointer input through `enigo` (feature `desktop`).

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};

use crate::dispatch::{drag_waypoints, ActionDispatcher};
use crate::frame::Point;
use crate::task::ActionKind;
use crate::trace::trace_span;
use crate::util::{TriggerError, TriggerResult};

/// Injects left-button clicks and drags into the desktop session.
///
/// The input connection is opened per dispatch so the dispatcher itself
/// stays `Send` and can move to the worker thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopDispatcher;

impl DesktopDispatcher {
    pub fn new() -> Self {
        Self
    }
}

fn injection_failed(err: impl Display) -> TriggerError {
    TriggerError::InputInjectionFailed {
        reason: err.to_string(),
    }
}

fn drag(
    enigo: &mut Enigo,
    start: Point,
    dx: i32,
    dy: i32,
    duration: Duration,
) -> TriggerResult<()> {
    enigo
        .button(Button::Left, Direction::Press)
        .map_err(injection_failed)?;
    let (waypoints, pause) = drag_waypoints(start, dx, dy, duration);
    for point in waypoints {
        thread::sleep(pause);
        if let Err(err) = enigo.move_mouse(point.x, point.y, Coordinate::Abs) {
            let _ = enigo.button(Button::Left, Direction::Release);
            return Err(injection_failed(err));
        }
    }
    enigo
        .button(Button::Left, Direction::Release)
        .map_err(injection_failed)
}

impl ActionDispatcher for DesktopDispatcher {
    fn dispatch(&mut self, action: &ActionKind, point: Point) -> TriggerResult<()> {
        let _span = trace_span!("desktop_dispatch", x = point.x, y = point.y).entered();
        let mut enigo = Enigo::new(&Settings::default()).map_err(injection_failed)?;
        enigo
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(injection_failed)?;
        match *action {
            ActionKind::Click => enigo
                .button(Button::Left, Direction::Click)
                .map_err(injection_failed),
            ActionKind::Drag { dx, dy, duration } => drag(&mut enigo, point, dx, dy, duration),
        }
    }
}
