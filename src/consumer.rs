use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::QueueClient;
use crate::errors::ConsumerError;
use crate::handler::Handler;
use crate::logging::{Logger, NoopLogger};
use crate::queue::{QueueRef, setup_queue};
use crate::shutdown::{LoopGuard, ShutdownCoordinator};

pub mod config;
mod fetch_loop;

pub use config::RunConfig;
pub use fetch_loop::RunSummary;

use fetch_loop::FetchLoop;

/// Binds a queue, a client and a handler.
///
/// A `Consumer` does not manage any tasks itself. Each call to
/// [`Consumer::run`] drives one fetch loop; call it several times
/// concurrently (or use [`FetchGroup`](crate::group::FetchGroup)) to process
/// messages in parallel. All loops share the client, queue and handler.
pub struct Consumer<C>
where
    C: QueueClient,
{
    /// The client used to receive and delete messages.
    client: Arc<C>,

    /// The queue every loop polls.
    queue: QueueRef,

    handler: Arc<dyn Handler>,

    logger: Arc<dyn Logger>,
}

impl<C> Consumer<C>
where
    C: QueueClient,
{
    /// Resolves (or creates) the queue named `queue_name` and binds it to
    /// `handler`.
    ///
    /// Fails only if the queue can be neither found nor created.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use rs_sqs_consumer::{client::create_sqs_client_from_env, Consumer, RunConfig};
    /// use rs_sqs_consumer::handler::HandlerError;
    /// use rs_sqs_consumer::message::Message;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = create_sqs_client_from_env().await;
    ///     let consumer = Consumer::new(
    ///         client,
    ///         "orders",
    ///         |_ctx: CancellationToken, message: Message| async move {
    ///             println!("Processing message: {}", message.body);
    ///             Ok::<(), HandlerError>(())
    ///         },
    ///     )
    ///     .await?;
    ///
    ///     consumer.run(CancellationToken::new(), RunConfig::default()).await;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(
        client: C,
        queue_name: &str,
        handler: impl Handler + 'static,
    ) -> Result<Self, ConsumerError> {
        let queue = setup_queue(&client, queue_name).await?;

        Ok(Self::with_queue(client, queue, handler))
    }

    /// Binds an already resolved queue.
    pub fn with_queue(
        client: C,
        queue: QueueRef,
        handler: impl Handler + 'static,
    ) -> Self {
        Consumer {
            client: Arc::new(client),
            queue,
            handler: Arc::new(handler),
            logger: Arc::new(NoopLogger),
        }
    }

    /// Installs the log sink. Taking `&mut self` means it can only happen
    /// before the consumer is shared with running loops.
    pub fn set_logger(&mut self, logger: impl Logger + 'static) {
        self.logger = Arc::new(logger);
    }

    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.set_logger(logger);
        self
    }

    pub fn queue(&self) -> &QueueRef {
        &self.queue
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub(crate) fn logger(&self) -> Arc<dyn Logger> {
        self.logger.clone()
    }

    /// Runs one fetch loop until `ctx` is cancelled or `config.shutdown`
    /// closes, then returns.
    ///
    /// Stopping is not a failure; the returned summary reports what the loop
    /// did. In-flight handlers get `config.grace_period` to finish before the
    /// context they were given is cancelled.
    pub async fn run(&self, ctx: CancellationToken, config: RunConfig) -> RunSummary {
        let shutdown = ShutdownCoordinator::with_logger(
            &ctx,
            config.shutdown.clone(),
            config.grace_period,
            self.logger(),
        );

        self.run_with(&shutdown, &config).await
    }

    /// Runs one fetch loop bound to an existing coordinator, so several loops
    /// can share a single shutdown signal and grace timer.
    ///
    /// `config.shutdown` and `config.grace_period` are ignored here; they
    /// belong to the coordinator.
    pub async fn run_with(&self, shutdown: &ShutdownCoordinator, config: &RunConfig) -> RunSummary {
        let registration = shutdown.register_loop();
        self.run_registered(registration, shutdown, config).await
    }

    /// Runs a loop that was registered with `shutdown` ahead of time.
    pub(crate) async fn run_registered(
        &self,
        registration: LoopGuard,
        shutdown: &ShutdownCoordinator,
        config: &RunConfig,
    ) -> RunSummary {
        FetchLoop::new(
            self.client.as_ref(),
            &self.queue,
            self.handler.as_ref(),
            self.logger.as_ref(),
            config,
        )
        .run(shutdown, registration)
        .await
    }
}
