//! State shared between the control surface and the worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::frame::{Frame, Size};
use crate::task::{TaskSet, TriggerTask};

/// Whether the automation loop is scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

/// Run flag, task set and baseline capture.
///
/// The run flag is the only state the worker polls. The task set is read by
/// the worker once per cycle to take a snapshot, and the read lock is
/// released before any matching happens.
#[derive(Debug, Default)]
pub struct AutomationState {
    running: AtomicBool,
    tasks: RwLock<TaskSet>,
    baseline: Mutex<Option<Frame>>,
    sleep_lock: Mutex<()>,
    wake: Condvar,
}

impl AutomationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_state(&self) -> RunState {
        if self.is_running() {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Sets the run flag and returns the previous value.
    pub(crate) fn set_running(&self, running: bool) -> bool {
        self.running.swap(running, Ordering::AcqRel)
    }

    /// Wakes a worker sleeping in `sleep_while_running`.
    pub(crate) fn wake(&self) {
        let _guard = self.sleep_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.wake.notify_all();
    }

    /// Sleeps up to `interval`, returning early once the run flag clears.
    pub(crate) fn sleep_while_running(&self, interval: Duration) {
        let guard = self.sleep_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .wake
            .wait_timeout_while(guard, interval, |_| self.is_running())
            .unwrap_or_else(PoisonError::into_inner);
    }

    pub(crate) fn tasks(&self) -> RwLockReadGuard<'_, TaskSet> {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn tasks_mut(&self) -> RwLockWriteGuard<'_, TaskSet> {
        self.tasks.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies the current task list for one cycle.
    pub fn task_snapshot(&self) -> Vec<Arc<TriggerTask>> {
        self.tasks().snapshot()
    }

    pub fn task_count(&self) -> usize {
        self.tasks().len()
    }

    pub fn baseline(&self) -> Option<Frame> {
        self.baseline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn baseline_size(&self) -> Option<Size> {
        self.baseline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Frame::size)
    }

    pub(crate) fn set_baseline(&self, frame: Frame) {
        *self.baseline.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
    }
}

/// Clears the run flag and wakes sleepers when dropped.
pub(crate) struct StopOnDrop(pub(crate) Arc<AutomationState>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.set_running(false);
        self.0.wake();
    }
}
