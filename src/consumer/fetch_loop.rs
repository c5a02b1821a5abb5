use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::client::QueueClient;
use crate::consumer::config::RunConfig;
use crate::handler::Handler;
use crate::logging::{Level, Logger};
use crate::message::Message;
use crate::queue::QueueRef;
use crate::shutdown::{LoopGuard, ShutdownCoordinator};

/// Counters describing what one fetch loop did before it returned.
///
/// Every dispatched or skipped message lands in exactly one of
/// `acknowledged`, `handler_failures`, `delete_failures` or `abandoned`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Receive calls issued, successful or not.
    pub receive_calls: usize,
    pub receive_failures: usize,
    /// Messages dispatched or skipped, excluding deliveries without a receipt handle.
    pub received: usize,
    pub acknowledged: usize,
    pub handler_failures: usize,
    pub delete_failures: usize,
    /// Messages left on the queue because the context was cancelled.
    pub abandoned: usize,
}

impl RunSummary {
    pub(crate) fn merge(&mut self, other: &RunSummary) {
        self.receive_calls += other.receive_calls;
        self.receive_failures += other.receive_failures;
        self.received += other.received;
        self.acknowledged += other.acknowledged;
        self.handler_failures += other.handler_failures;
        self.delete_failures += other.delete_failures;
        self.abandoned += other.abandoned;
    }
}

enum Outcome {
    Acknowledged,
    HandlerFailed,
    DeleteFailed,
    Abandoned,
}

/// One polling unit: receive a batch, hand each message to the handler in
/// order, delete the ones it accepted, repeat until shutdown.
pub(crate) struct FetchLoop<'a, C: ?Sized> {
    client: &'a C,
    queue: &'a QueueRef,
    handler: &'a dyn Handler,
    logger: &'a dyn Logger,
    batch_size: i32,
    wait_seconds: i32,
    receive_error_backoff: Duration,
}

impl<'a, C> FetchLoop<'a, C>
where
    C: QueueClient + ?Sized,
{
    pub(crate) fn new(
        client: &'a C,
        queue: &'a QueueRef,
        handler: &'a dyn Handler,
        logger: &'a dyn Logger,
        config: &RunConfig,
    ) -> Self {
        FetchLoop {
            client,
            queue,
            handler,
            logger,
            batch_size: config.effective_batch_size(),
            wait_seconds: config.effective_wait_seconds(),
            receive_error_backoff: config.receive_error_backoff,
        }
    }

    #[tracing::instrument(skip_all, name = "fetch_loop", fields(queue = %self.queue))]
    pub(crate) async fn run(
        &self,
        shutdown: &ShutdownCoordinator,
        _registration: LoopGuard,
    ) -> RunSummary {
        let ctx = shutdown.context();
        let mut summary = RunSummary::default();

        loop {
            if shutdown.is_stopping() {
                break;
            }

            summary.receive_calls += 1;
            let received = tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                received = self.client.receive_batch(self.queue, self.batch_size, self.wait_seconds) => received,
            };

            let batch = match received {
                Ok(batch) => batch,
                Err(e) => {
                    summary.receive_failures += 1;
                    self.logger.log(
                        Level::ERROR,
                        format_args!("error receiving messages from {}: {}", self.queue, e),
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(self.receive_error_backoff) => {}
                        _ = shutdown.stopping() => {}
                    }
                    continue;
                }
            };

            if batch.dropped > 0 {
                self.logger.log(
                    Level::WARN,
                    format_args!(
                        "skipped {} message(s) without a receipt handle from {}",
                        batch.dropped, self.queue
                    ),
                );
            }

            self.dispatch_batch(ctx, batch.messages, &mut summary).await;
        }

        self.logger.log(
            Level::DEBUG,
            format_args!("fetch loop for {} exiting", self.queue),
        );
        summary
    }

    async fn dispatch_batch(
        &self,
        ctx: &CancellationToken,
        messages: Vec<Message>,
        summary: &mut RunSummary,
    ) {
        let total = messages.len();
        summary.received += total;

        for (index, message) in messages.into_iter().enumerate() {
            if ctx.is_cancelled() {
                let skipped = total - index;
                summary.abandoned += skipped;
                self.logger.log(
                    Level::WARN,
                    format_args!(
                        "context cancelled; leaving {} unhandled message(s) on {}",
                        skipped, self.queue
                    ),
                );
                return;
            }

            match self.dispatch(ctx, message).await {
                Outcome::Acknowledged => summary.acknowledged += 1,
                Outcome::HandlerFailed => summary.handler_failures += 1,
                Outcome::DeleteFailed => summary.delete_failures += 1,
                Outcome::Abandoned => summary.abandoned += 1,
            }
        }
    }

    async fn dispatch(&self, ctx: &CancellationToken, message: Message) -> Outcome {
        let receipt_handle = message.receipt_handle.clone();
        let label = message.to_string();

        let handled = AssertUnwindSafe(self.handler.handle(ctx.clone(), message)).catch_unwind();
        let result = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                self.logger.log(
                    Level::WARN,
                    format_args!("context cancelled while handling {}; leaving it on the queue", label),
                );
                return Outcome::Abandoned;
            }
            result = handled => result,
        };

        match result {
            Err(panic) => {
                self.logger.log(
                    Level::ERROR,
                    format_args!("handler panicked on {}: {}", label, panic_message(&*panic)),
                );
                Outcome::HandlerFailed
            }
            Ok(Err(e)) => {
                self.logger.log(
                    Level::ERROR,
                    format_args!("error handling {}: {}", label, e),
                );
                Outcome::HandlerFailed
            }
            Ok(Ok(())) => match self.client.delete_message(self.queue, &receipt_handle).await {
                Ok(()) => Outcome::Acknowledged,
                Err(e) => {
                    self.logger.log(
                        Level::ERROR,
                        format_args!("error deleting {}: {}", label, e),
                    );
                    Outcome::DeleteFailed
                }
            },
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
