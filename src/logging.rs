//! Injected logging sink.
//!
//! The consumer never logs through a process-wide logger. It reports every
//! notable event (receive, handler and delete failures, shutdown transitions)
//! to the [`Logger`] it was built with, which defaults to [`NoopLogger`].

use std::fmt;

pub use tracing::Level;

/// A sink for the consumer's log events.
///
/// Implementations must not fail; a sink has no way to report errors back
/// into the consumer's control flow.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, args: fmt::Arguments<'_>);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: Level, _args: fmt::Arguments<'_>) {}
}

/// Forwards events to the `tracing` macros at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        match level {
            Level::ERROR => tracing::error!("{}", args),
            Level::WARN => tracing::warn!("{}", args),
            Level::INFO => tracing::info!("{}", args),
            Level::DEBUG => tracing::debug!("{}", args),
            _ => tracing::trace!("{}", args),
        }
    }
}

/// Any `Fn(Level, fmt::Arguments)` is a sink, e.g.
/// `|level: Level, args: fmt::Arguments<'_>| eprintln!("[{level}] {args}")`.
impl<F> Logger for F
where
    F: Fn(Level, fmt::Arguments<'_>) + Send + Sync,
{
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        (self)(level, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn emit(logger: &dyn Logger) {
        logger.log(Level::WARN, format_args!("receive failed {} time(s)", 2));
    }

    #[test]
    fn closure_is_a_sink() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let lines = lines.clone();
            move |level: Level, args: fmt::Arguments<'_>| {
                lines.lock().unwrap().push(format!("[{level}] {args}"));
            }
        };

        emit(&sink);

        assert_eq!(*lines.lock().unwrap(), vec!["[WARN] receive failed 2 time(s)"]);
    }

    #[test]
    fn noop_logger_discards() {
        emit(&NoopLogger);
    }
}
