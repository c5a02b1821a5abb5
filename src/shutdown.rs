//! Shutdown coordination for fetch loops.
//!
//! A [`ShutdownCoordinator`] folds the run context (a [`CancellationToken`])
//! and an optional external [`ShutdownListener`] into one monotonic signal:
//!
//! ```text
//! Running --(context cancelled | channel closed)--> Stopping --(last loop exits)--> Stopped
//! ```
//!
//! Entering `Stopping` starts the grace timer. When it expires the handler
//! context is cancelled, which aborts long-polls and pending handler futures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::logging::{Level, Logger, NoopLogger};

/// Creates an external shutdown channel.
///
/// Closing the [`ShutdownTrigger`] (explicitly or by dropping it) is seen by
/// every clone of the [`ShutdownListener`].
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownListener { rx })
}

/// Sending half of the external shutdown channel.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Closes the channel. Repeated calls are no-ops.
    pub fn close(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half of the external shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Whether the channel has been closed or its trigger dropped.
    pub fn is_closed(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the channel is closed.
    pub async fn closed(&self) {
        let mut rx = self.rx.clone();
        // An Err means the trigger was dropped, which also counts as closing.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// Observable phase of a [`ShutdownCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Stopping,
    Stopped,
}

/// The combined shutdown signal shared by the fetch loops of a run.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    /// The caller's run context.
    parent: CancellationToken,
    external: Option<ShutdownListener>,
    /// Child of `parent`, handed to handlers and cancelled at grace expiry.
    context: CancellationToken,
    stopping: CancellationToken,
    stopped: CancellationToken,
    /// Cancelled when the last loop exits before stopping began.
    released: CancellationToken,
    active_loops: AtomicUsize,
    stop_logged: AtomicBool,
    grace_period: Duration,
    logger: Arc<dyn Logger>,
}

impl ShutdownCoordinator {
    /// Builds a coordinator for `ctx` and, optionally, an external channel.
    ///
    /// Spawns the watcher task that runs the grace timer, so it must be
    /// called from within a tokio runtime.
    pub fn new(
        ctx: &CancellationToken,
        external: Option<ShutdownListener>,
        grace_period: Duration,
    ) -> Self {
        Self::with_logger(ctx, external, grace_period, Arc::new(NoopLogger))
    }

    pub fn with_logger(
        ctx: &CancellationToken,
        external: Option<ShutdownListener>,
        grace_period: Duration,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let inner = Arc::new(Inner {
            parent: ctx.clone(),
            external,
            context: ctx.child_token(),
            stopping: CancellationToken::new(),
            stopped: CancellationToken::new(),
            released: CancellationToken::new(),
            active_loops: AtomicUsize::new(0),
            stop_logged: AtomicBool::new(false),
            grace_period,
            logger,
        });

        tokio::spawn(watch_shutdown(inner.clone()));

        ShutdownCoordinator { inner }
    }

    pub fn state(&self) -> ShutdownState {
        if self.inner.stopped.is_cancelled() {
            ShutdownState::Stopped
        } else if self.is_stopping() {
            ShutdownState::Stopping
        } else {
            ShutdownState::Running
        }
    }

    /// Whether stopping has begun.
    ///
    /// Also checks the context and the external channel directly, so a loop
    /// sees the signal at its next iteration even if the watcher task has
    /// not been scheduled yet.
    pub fn is_stopping(&self) -> bool {
        if self.inner.stopping.is_cancelled() {
            return true;
        }

        let triggered = self.inner.parent.is_cancelled()
            || self
                .inner
                .external
                .as_ref()
                .is_some_and(ShutdownListener::is_closed);
        if triggered {
            self.inner.begin_stop("shutdown requested");
        }
        triggered
    }

    /// Moves to `Stopping`. Idempotent.
    pub fn begin_stop(&self) {
        self.inner.begin_stop("shutdown requested by caller");
    }

    /// Resolves once stopping has begun.
    pub async fn stopping(&self) {
        self.inner.stopping.cancelled().await
    }

    /// The context handed to handlers.
    ///
    /// Cancelled when the caller's context is cancelled or when the grace
    /// period after `Stopping` expires.
    pub fn context(&self) -> &CancellationToken {
        &self.inner.context
    }

    /// Resolves once every registered loop has exited after stopping began.
    pub async fn wait_stopped(&self) {
        self.inner.stopped.cancelled().await
    }

    pub fn grace_period(&self) -> Duration {
        self.inner.grace_period
    }

    /// Registers a fetch loop. The loop counts as exited when the guard is
    /// dropped, so register before spawning to keep `Stopped` from being
    /// reached ahead of a loop that has not started yet.
    pub(crate) fn register_loop(&self) -> LoopGuard {
        self.inner.active_loops.fetch_add(1, Ordering::SeqCst);
        LoopGuard {
            inner: self.inner.clone(),
        }
    }
}

impl Inner {
    fn begin_stop(&self, reason: &str) {
        self.stopping.cancel();

        if !self.stop_logged.swap(true, Ordering::SeqCst) {
            self.logger.log(
                Level::INFO,
                format_args!(
                    "{}; stopping fetch loops (grace period {:?})",
                    reason, self.grace_period
                ),
            );
        }

        if self.active_loops.load(Ordering::SeqCst) == 0 {
            self.mark_stopped();
        }
    }

    fn mark_stopped(&self) {
        if !self.stopped.is_cancelled() {
            self.stopped.cancel();
            self.logger
                .log(Level::INFO, format_args!("all fetch loops stopped"));
        }
    }
}

/// Keeps a fetch loop counted as running.
pub(crate) struct LoopGuard {
    inner: Arc<Inner>,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        let remaining = self.inner.active_loops.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            if self.inner.stopping.is_cancelled() {
                self.inner.mark_stopped();
            } else {
                self.inner.released.cancel();
            }
        }
    }
}

async fn watch_shutdown(inner: Arc<Inner>) {
    let external = inner.external.clone();
    let external_closed = async move {
        match external {
            Some(listener) => listener.closed().await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = inner.parent.cancelled() => inner.begin_stop("run context cancelled"),
        _ = external_closed => inner.begin_stop("shutdown channel closed"),
        _ = inner.stopping.cancelled() => {}
        // Every loop went away without a shutdown, e.g. a dropped run future.
        _ = inner.released.cancelled() => return,
    }

    tokio::select! {
        _ = inner.stopped.cancelled() => {}
        _ = tokio::time::sleep(inner.grace_period) => {
            if !inner.context.is_cancelled() {
                inner.logger.log(
                    Level::WARN,
                    format_args!(
                        "grace period of {:?} expired; cancelling in-flight work",
                        inner.grace_period
                    ),
                );
            }
            inner.context.cancel();
        }
    }
}
