//! `tracing` hooks that vanish without the `tracing` feature.

/// Info span around a scan or a worker run.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Debug event with fields, for per-cycle and per-task numbers.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::debug!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Operator log line, at the level of its `LogLevel`.
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($level:expr, $msg:expr) => {
        match $level {
            $crate::event::LogLevel::Info => tracing::info!("{}", $msg),
            $crate::event::LogLevel::Warn => tracing::warn!("{}", $msg),
            $crate::event::LogLevel::Error => tracing::error!("{}", $msg),
        }
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($level:expr, $msg:expr) => {
        let _ = (&$level, &$msg);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_log;
pub(crate) use trace_span;

/// Stand-in for `tracing::Span` so call sites can write
/// `trace_span!(..).entered()` unconditionally.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
