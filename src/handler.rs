use crate::message::Message;
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// The error a handler returns to refuse a message.
///
/// It is only used to decide acknowledgment: the consumer logs it and leaves
/// the message on the queue. It is never retried or transformed.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for the user-supplied message handler.
///
/// `handle` is invoked once per received message. Returning `Ok(())` deletes
/// the message from the queue; returning an error leaves it there to be
/// redelivered once its visibility timeout elapses. Deliveries are
/// at-least-once, so handlers must be idempotent.
///
/// When more than one fetch loop runs, `handle` is called concurrently.
///
/// # Cancellation
///
/// `ctx` is cancelled when the shutdown grace period expires (or when the
/// caller cancels the run context). Handlers should check it at safe points
/// and return promptly. A handler future that is still pending when `ctx` is
/// cancelled is dropped at its current await point and its message is left
/// on the queue. A handler that blocks its thread without ever yielding
/// cannot be interrupted.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: CancellationToken, message: Message) -> Result<(), HandlerError>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(CancellationToken, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, ctx: CancellationToken, message: Message) -> Result<(), HandlerError> {
        (self)(ctx, message).await
    }
}

/// Handler that passes a clone of a shared resource to every invocation.
///
/// Built by [`with_shared`].
///
/// # Type Parameters
///
/// * `F` - The message handler function type
/// * `TShared` - The type of shared resources passed to the handler
pub struct SharedResourceHandler<F, TShared> {
    handler_fn: F,
    shared_resources: TShared,
}

/// Binds a handler function to a shared resource, such as a database pool or
/// an HTTP client, that every invocation receives a clone of.
///
/// # Example
///
/// ```rust
/// use rs_sqs_consumer::handler::{with_shared, HandlerError};
/// use rs_sqs_consumer::message::Message;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use tokio_util::sync::CancellationToken;
///
/// let processed = Arc::new(AtomicUsize::new(0));
/// let handler = with_shared(
///     processed,
///     |_ctx: CancellationToken, _message: Message, processed: Arc<AtomicUsize>| async move {
///         processed.fetch_add(1, Ordering::SeqCst);
///         Ok::<(), HandlerError>(())
///     },
/// );
/// # let _ = handler;
/// ```
pub fn with_shared<F, Fut, TShared>(
    shared_resources: TShared,
    handler_fn: F,
) -> SharedResourceHandler<F, TShared>
where
    F: Fn(CancellationToken, Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    SharedResourceHandler {
        handler_fn,
        shared_resources,
    }
}

#[async_trait]
impl<F, Fut, TShared> Handler for SharedResourceHandler<F, TShared>
where
    F: Fn(CancellationToken, Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    async fn handle(&self, ctx: CancellationToken, message: Message) -> Result<(), HandlerError> {
        (self.handler_fn)(ctx, message, self.shared_resources.clone()).await
    }
}
