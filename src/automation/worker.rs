//! The perceive, match, act cycle run on the worker thread.

use std::sync::{Arc, Mutex, PoisonError};

use crate::automation::state::StopOnDrop;
use crate::automation::{AutomationConfig, AutomationState};
use crate::capture::ScreenCapture;
use crate::dispatch::ActionDispatcher;
use crate::event::{emit_log, AutomationEvent, EventSink, LogLevel};
use crate::frame::annotate::BOX_COLOR;
use crate::frame::io::encode_png;
use crate::frame::Frame;
use crate::search::{MatchResult, Matcher};
use crate::task::TriggerTask;
use crate::trace::{trace_event, trace_span};

/// Counters for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// False when the capture failed and no task was evaluated.
    pub captured: bool,
    /// Tasks matched against the frame.
    pub evaluated: usize,
    /// Tasks whose confidence reached the threshold.
    pub detections: usize,
    /// Actions that the dispatcher accepted.
    pub dispatched: usize,
}

pub(crate) struct Worker {
    pub(crate) state: Arc<AutomationState>,
    pub(crate) capture: Arc<Mutex<Box<dyn ScreenCapture>>>,
    pub(crate) dispatcher: Box<dyn ActionDispatcher>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) config: AutomationConfig,
}

impl Worker {
    /// Runs cycles until the run flag clears, then hands the dispatcher back.
    ///
    /// The flag is cleared on every exit, including a panicking backend.
    pub(crate) fn run(mut self) -> Box<dyn ActionDispatcher> {
        let _span = trace_span!("automation_worker").entered();
        let _stop = StopOnDrop(Arc::clone(&self.state));
        while self.state.is_running() {
            let report = self.run_cycle();
            trace_event!(
                "cycle",
                captured = report.captured,
                evaluated = report.evaluated,
                detections = report.detections,
                dispatched = report.dispatched
            );
            self.state.sleep_while_running(self.config.interval);
        }
        self.dispatcher
    }

    pub(crate) fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let frame = self
            .capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .capture();
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                self.log(LogLevel::Warn, format!("Capture failed, skipping cycle: {err}"));
                return report;
            }
        };
        report.captured = true;

        let matcher = Matcher::new().with_parallel(self.config.parallel);
        for task in self.state.task_snapshot() {
            if !self.state.is_running() {
                break;
            }
            report.evaluated += 1;
            let result = match matcher.match_plan(&frame, task.plan()) {
                Ok(result) => result,
                Err(err) => {
                    self.log(LogLevel::Warn, format!("Skipping {}: {err}", task.name()));
                    continue;
                }
            };
            trace_event!(
                "task_scored",
                task = task.name(),
                confidence = result.confidence
            );
            if !result.is_confident(self.config.threshold) {
                continue;
            }

            report.detections += 1;
            if self.act(&task, &result) {
                report.dispatched += 1;
            }
            self.emit_detection(&frame, &task, &result);
        }
        report
    }

    fn act(&mut self, task: &TriggerTask, result: &MatchResult) -> bool {
        let point = result.center();
        self.log(
            LogLevel::Info,
            format!("Found {} at ({}, {})", task.name(), point.x, point.y),
        );
        match self.dispatcher.dispatch(task.action(), point) {
            Ok(()) => {
                self.log(
                    LogLevel::Info,
                    format!("{} ({}, {})", task.action().verb(), point.x, point.y),
                );
                true
            }
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    format!("Action for {} skipped: {err}", task.name()),
                );
                false
            }
        }
    }

    fn emit_detection(&self, frame: &Frame, task: &TriggerTask, result: &MatchResult) {
        let annotated = frame.with_box(result.top_left, result.template_size, BOX_COLOR);
        let annotated_png = match encode_png(&annotated) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.log(LogLevel::Warn, format!("Preview for {} dropped: {err}", task.name()));
                return;
            }
        };
        self.sink.emit(AutomationEvent::Detection {
            task_name: task.name().to_string(),
            point: result.center(),
            confidence: result.confidence,
            annotated_png,
            timestamp: chrono::Local::now(),
        });
    }

    fn log(&self, level: LogLevel, message: String) {
        emit_log(self.sink.as_ref(), level, message);
    }
}
