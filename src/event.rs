//! Events emitted to the control surface.
//!
//! The worker never touches UI state. It sends immutable `AutomationEvent`
//! values to an `EventSink`, normally the sending half of a channel drained
//! by the control surface.

use std::fmt;
use std::sync::mpsc;

use chrono::{DateTime, Local};

use crate::frame::Point;
use crate::trace::trace_log;

/// Severity of a log event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Observation emitted by the automation loop or its controller.
#[derive(Clone, Debug)]
pub enum AutomationEvent {
    /// Operator-facing log line.
    Log {
        level: LogLevel,
        message: String,
        timestamp: DateTime<Local>,
    },
    /// A trigger matched and its action was attempted.
    Detection {
        task_name: String,
        point: Point,
        confidence: f32,
        /// PNG of the captured frame with the match outlined.
        annotated_png: Vec<u8>,
        timestamp: DateTime<Local>,
    },
}

impl AutomationEvent {
    /// Creates a log event stamped with the local time.
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        AutomationEvent::Log {
            level,
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        match self {
            AutomationEvent::Log { timestamp, .. } | AutomationEvent::Detection { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

impl fmt::Display for AutomationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp().format("%H:%M:%S");
        match self {
            AutomationEvent::Log { message, .. } => write!(f, "[{ts}] {message}"),
            AutomationEvent::Detection {
                task_name,
                point,
                confidence,
                ..
            } => write!(
                f,
                "[{ts}] Detection {task_name} at ({}, {}) confidence {confidence:.3}",
                point.x, point.y
            ),
        }
    }
}

/// Receiver of automation events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AutomationEvent);
}

impl EventSink for mpsc::Sender<AutomationEvent> {
    fn emit(&self, event: AutomationEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.send(event);
    }
}

/// Sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AutomationEvent) {}
}

/// Emits a log event and mirrors it into `tracing`.
pub(crate) fn emit_log(sink: &dyn EventSink, level: LogLevel, message: String) {
    trace_log!(level, message);
    sink.emit(AutomationEvent::log(level, message));
}
