use std::time::Duration;

use crate::shutdown::ShutdownListener;

/// Largest batch a single receive call may ask for.
pub const MAX_BATCH_SIZE: i32 = 10;

/// Longest long-poll wait the service accepts, in seconds.
pub const MAX_WAIT_SECONDS: i32 = 20;

/// Configuration for one [`Consumer::run`](crate::consumer::Consumer::run) call.
///
/// # Fields
/// - `shutdown`: external channel whose closing stops the run, like cancelling its context.
/// - `batch_size`: the maximum number of messages to receive in a single request.
/// - `wait_seconds`: the wait time for long polling, in seconds.
/// - `grace_period`: how long in-flight work may continue after stopping begins.
/// - `receive_error_backoff`: pause after a failed receive call.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub shutdown: Option<ShutdownListener>,

    /// Clamped to `1..=10` when the loop starts.
    pub batch_size: i32,

    /// Clamped to `0..=20` when the loop starts.
    pub wait_seconds: i32,

    pub grace_period: Duration,

    pub receive_error_backoff: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            shutdown: None,
            batch_size: MAX_BATCH_SIZE,
            wait_seconds: MAX_WAIT_SECONDS,
            grace_period: Duration::from_secs(30),
            receive_error_backoff: Duration::from_secs(1),
        }
    }
}

impl RunConfig {
    pub fn with_shutdown(mut self, shutdown: ShutdownListener) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn with_batch_size(mut self, batch_size: i32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_wait_seconds(mut self, wait_seconds: i32) -> Self {
        self.wait_seconds = wait_seconds;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_receive_error_backoff(mut self, backoff: Duration) -> Self {
        self.receive_error_backoff = backoff;
        self
    }

    pub(crate) fn effective_batch_size(&self) -> i32 {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    pub(crate) fn effective_wait_seconds(&self) -> i32 {
        self.wait_seconds.clamp(0, MAX_WAIT_SECONDS)
    }
}
