//! The automation loop and its control surface.
//!
//! `AutomationLoop` is the controller the operator drives: it owns the
//! shared `AutomationState`, validates configuration synchronously, and runs
//! the scan on one dedicated worker thread. The worker only observes the run
//! flag and a per-cycle snapshot of the task set; results flow back as
//! `AutomationEvent` values.
//!
//! ```text
//! Stopped --start (tasks + baseline)--> Running --stop--> Stopped
//! ```

use std::path::Path;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::capture::ScreenCapture;
use crate::dispatch::ActionDispatcher;
use crate::event::{emit_log, AutomationEvent, EventSink, LogLevel};
use crate::frame::io::load_frame;
use crate::frame::Frame;
use crate::search::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::task::{ActionKind, TriggerTask};
use crate::util::{TriggerError, TriggerResult};

mod state;
mod worker;

pub use state::{AutomationState, RunState};
pub use worker::CycleReport;

use state::StopOnDrop;
use worker::Worker;

/// Pause between cycles.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(500);

/// Name of the worker thread.
pub const WORKER_THREAD_NAME: &str = "screentrigger-worker";

/// Loop tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutomationConfig {
    /// Pause between cycles.
    pub interval: Duration,
    /// Minimum confidence that fires an action.
    pub threshold: f32,
    /// Use the row-parallel kernel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CYCLE_INTERVAL,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            parallel: false,
        }
    }
}

impl AutomationConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Controller for the capture, match and dispatch loop.
pub struct AutomationLoop {
    state: Arc<AutomationState>,
    config: AutomationConfig,
    sink: Arc<dyn EventSink>,
    capture: Arc<Mutex<Box<dyn ScreenCapture>>>,
    /// `None` while the worker owns the dispatcher.
    dispatcher: Option<Box<dyn ActionDispatcher>>,
    worker: Option<JoinHandle<Box<dyn ActionDispatcher>>>,
}

impl AutomationLoop {
    /// Creates a stopped loop that reports to `sink`.
    pub fn new(
        capture: Box<dyn ScreenCapture>,
        dispatcher: Box<dyn ActionDispatcher>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            state: Arc::new(AutomationState::new()),
            config: AutomationConfig::default(),
            sink,
            capture: Arc::new(Mutex::new(capture)),
            dispatcher: Some(dispatcher),
            worker: None,
        }
    }

    /// Creates a stopped loop and the receiving end of its event queue.
    pub fn with_channel(
        capture: Box<dyn ScreenCapture>,
        dispatcher: Box<dyn ActionDispatcher>,
    ) -> (Self, mpsc::Receiver<AutomationEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(capture, dispatcher, Arc::new(tx)), rx)
    }

    /// Replaces the loop configuration. Takes effect on the next start.
    pub fn with_config(mut self, config: AutomationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> AutomationConfig {
        self.config
    }

    pub fn run_state(&self) -> RunState {
        self.state.run_state()
    }

    /// Returns the shared state for read-only observers.
    pub fn shared_state(&self) -> Arc<AutomationState> {
        Arc::clone(&self.state)
    }

    /// Returns the configured tasks in evaluation order.
    pub fn tasks(&self) -> Vec<Arc<TriggerTask>> {
        self.state.task_snapshot()
    }

    /// Loads a template file and appends a task named after the file.
    ///
    /// Returns the task name. On any error the task set is unchanged.
    pub fn add_task<P: AsRef<Path>>(&self, path: P, action: ActionKind) -> TriggerResult<String> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TriggerError::InvalidTemplateImage {
                path: path.display().to_string(),
                reason: "path has no file name".to_string(),
            })?;
        let template = load_frame(path)?;
        self.add_task_frame(name.clone(), template, action)?;
        Ok(name)
    }

    /// Appends a task from an in-memory template.
    ///
    /// When a baseline exists the template must fit inside it.
    pub fn add_task_frame(
        &self,
        name: impl Into<String>,
        template: Frame,
        action: ActionKind,
    ) -> TriggerResult<()> {
        if let Some(baseline) = self.state.baseline_size() {
            if !template.size().fits_within(baseline) {
                return Err(TriggerError::TemplateLargerThanFrame {
                    template_width: template.width(),
                    template_height: template.height(),
                    frame_width: baseline.width,
                    frame_height: baseline.height,
                });
            }
        }
        let task = TriggerTask::new(name, template, action)?;
        let message = format!("Added task: {} -> {}", task.name(), task.action());
        self.state.tasks_mut().add(task)?;
        self.log(LogLevel::Info, message);
        Ok(())
    }

    /// Removes the task named `name`.
    pub fn remove_task(&self, name: &str) -> TriggerResult<()> {
        self.state.tasks_mut().remove(name)?;
        self.log(LogLevel::Info, format!("Removed task: {name}"));
        Ok(())
    }

    /// Captures the screen and stores it as the baseline.
    ///
    /// Works in any state. While running it waits for the worker's capture
    /// in flight, if any.
    pub fn capture_baseline(&self) -> TriggerResult<()> {
        let frame = self
            .capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .capture()?;
        let (width, height) = (frame.width(), frame.height());
        self.state.set_baseline(frame);
        self.log(
            LogLevel::Info,
            format!("Screenshot taken ({width}x{height})"),
        );
        Ok(())
    }

    /// Returns the last baseline capture.
    pub fn baseline(&self) -> Option<Frame> {
        self.state.baseline()
    }

    /// Starts the worker. A no-op when a live worker is already running.
    pub fn start(&mut self) -> TriggerResult<()> {
        let worker_alive = self.worker.as_ref().is_some_and(|h| !h.is_finished());
        if worker_alive && self.state.is_running() {
            return Ok(());
        }
        // A worker that exited on its own still has to be joined.
        self.join_worker();
        self.state.set_running(false);

        if self.state.task_count() == 0 {
            return Err(TriggerError::NoTasksConfigured);
        }
        if self.state.baseline_size().is_none() {
            return Err(TriggerError::NoBaselineCapture);
        }
        let dispatcher = self
            .dispatcher
            .take()
            .ok_or_else(|| TriggerError::WorkerUnavailable {
                reason: "dispatcher was lost by a previous worker".to_string(),
            })?;

        self.state.set_running(true);
        let worker = Worker {
            state: Arc::clone(&self.state),
            capture: Arc::clone(&self.capture),
            dispatcher,
            sink: Arc::clone(&self.sink),
            config: self.config,
        };
        // `spawn` drops the closure on failure, so the dispatcher goes with it.
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run());
        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                self.log(LogLevel::Info, "Automation started".to_string());
                Ok(())
            }
            Err(err) => {
                self.state.set_running(false);
                Err(TriggerError::WorkerUnavailable {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Stops the worker and waits for its in-flight cycle to finish.
    ///
    /// No dispatch happens after this returns.
    pub fn stop(&mut self) {
        let was_running = self.state.set_running(false);
        self.state.wake();
        self.join_worker();
        if was_running {
            self.log(LogLevel::Info, "Automation stopped".to_string());
        }
    }

    /// Runs one cycle on the calling thread while stopped.
    ///
    /// The run flag is raised for the duration of the cycle so the per-task
    /// checks pass. Returns `None` when the loop is already running.
    pub fn run_once(&mut self) -> Option<CycleReport> {
        if self.state.is_running() {
            return None;
        }
        let dispatcher = self.dispatcher.take()?;
        let mut worker = Worker {
            state: Arc::clone(&self.state),
            capture: Arc::clone(&self.capture),
            dispatcher,
            sink: Arc::clone(&self.sink),
            config: self.config,
        };
        self.state.set_running(true);
        let report = {
            let _stop = StopOnDrop(Arc::clone(&self.state));
            worker.run_cycle()
        };
        self.dispatcher = Some(worker.dispatcher);
        Some(report)
    }

    fn join_worker(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        match handle.join() {
            Ok(dispatcher) => self.dispatcher = Some(dispatcher),
            Err(_) => self.log(
                LogLevel::Error,
                "Automation worker panicked, input backend lost".to_string(),
            ),
        }
    }

    fn log(&self, level: LogLevel, message: String) {
        emit_log(self.sink.as_ref(), level, message);
    }
}

impl Drop for AutomationLoop {
    fn drop(&mut self) {
        self.state.set_running(false);
        self.state.wake();
        self.join_worker();
    }
}
