//! Screentrigger is an unattended visual automation loop.
//!
//! Each cycle captures the screen, scores every configured trigger template
//! against it with multi-channel ZNCC, and synthesizes a click or drag at the
//! center of every match whose confidence reaches the threshold. The loop
//! runs on a dedicated worker thread and is controlled through
//! [`AutomationLoop`]; observations come back as [`AutomationEvent`] values.
//!
//! Screen capture and input injection backends live behind the `desktop`
//! feature. Without it the crate is headless and runs against
//! [`ReplayCapture`] and [`RecordingDispatcher`].

pub mod automation;
pub mod capture;
pub mod dispatch;
pub mod event;
pub mod frame;
pub mod kernel;
pub mod search;
pub mod task;
pub mod template;
mod trace;
pub mod util;

pub use automation::{AutomationConfig, AutomationLoop, AutomationState, CycleReport, RunState};
pub use capture::replay::ReplayCapture;
pub use capture::ScreenCapture;
pub use dispatch::recording::{Dispatch, DispatchLog, RecordingDispatcher};
pub use dispatch::ActionDispatcher;
pub use event::{AutomationEvent, EventSink, LogLevel, NullSink};
pub use frame::{Frame, Point, Size};
pub use kernel::{Kernel, Peak};
pub use search::{match_template, MatchResult, Matcher, DEFAULT_CONFIDENCE_THRESHOLD};
pub use task::{ActionKind, TaskSet, TriggerTask};
pub use template::TemplatePlan;
pub use util::{TriggerError, TriggerResult};

#[cfg(feature = "desktop")]
pub use capture::desktop::DesktopCapture;
#[cfg(feature = "desktop")]
pub use dispatch::desktop::DesktopDispatcher;
