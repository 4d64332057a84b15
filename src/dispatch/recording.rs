//! Dispatcher that records actions instead of injecting input.

use std::sync::{Arc, Mutex, PoisonError};

use crate::dispatch::ActionDispatcher;
use crate::frame::Point;
use crate::task::ActionKind;
use crate::util::TriggerResult;

/// One recorded dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub action: ActionKind,
    pub point: Point,
}

/// Shared, cloneable view of the recorded dispatches.
#[derive(Clone, Debug, Default)]
pub struct DispatchLog {
    entries: Arc<Mutex<Vec<Dispatch>>>,
}

impl DispatchLog {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of every dispatch so far, oldest first.
    pub fn entries(&self) -> Vec<Dispatch> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, dispatch: Dispatch) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dispatch);
    }
}

/// Records every dispatch into a `DispatchLog`. Used for dry runs.
#[derive(Clone, Debug, Default)]
pub struct RecordingDispatcher {
    log: DispatchLog,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that stays valid after the dispatcher moves to the worker.
    pub fn log(&self) -> DispatchLog {
        self.log.clone()
    }
}

impl ActionDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, action: &ActionKind, point: Point) -> TriggerResult<()> {
        self.log.push(Dispatch {
            action: *action,
            point,
        });
        Ok(())
    }
}
