use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::QueueClient;
use crate::consumer::{Consumer, RunConfig, RunSummary};
use crate::logging::{Level, Logger};
use crate::shutdown::ShutdownCoordinator;

/// A set of fetch loops spawned from one [`Consumer`] and bound to one
/// shared [`ShutdownCoordinator`].
///
/// The consumer only knows how to run a single loop; the group owns the
/// fan-out count and the join.
pub struct FetchGroup {
    coordinator: ShutdownCoordinator,
    handles: Vec<JoinHandle<RunSummary>>,
    logger: Arc<dyn Logger>,
}

/// What a group did once every loop has returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSummary {
    /// Loops that returned normally.
    pub completed: usize,
    /// Loops whose task panicked or was aborted.
    pub failed: usize,
    /// Combined counters of the completed loops.
    pub totals: RunSummary,
}

impl FetchGroup {
    /// Spawns `fetchers` loops on the current tokio runtime.
    ///
    /// The loops stop when `ctx` is cancelled, when `config.shutdown`
    /// closes, or when [`FetchGroup::shutdown`] is called.
    pub fn spawn<C>(
        consumer: Arc<Consumer<C>>,
        fetchers: usize,
        ctx: &CancellationToken,
        config: RunConfig,
    ) -> Self
    where
        C: QueueClient + 'static,
    {
        let logger = consumer.logger();
        let coordinator = ShutdownCoordinator::with_logger(
            ctx,
            config.shutdown.clone(),
            config.grace_period,
            logger.clone(),
        );

        logger.log(
            Level::INFO,
            format_args!("starting {} fetch loop(s) on {}", fetchers, consumer.queue()),
        );

        let handles = (0..fetchers)
            .map(|_| {
                let consumer = consumer.clone();
                let coordinator = coordinator.clone();
                let config = config.clone();
                let registration = coordinator.register_loop();
                tokio::spawn(async move {
                    consumer
                        .run_registered(registration, &coordinator, &config)
                        .await
                })
            })
            .collect();

        FetchGroup {
            coordinator,
            handles,
            logger,
        }
    }

    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Begins stopping every loop in the group.
    pub fn shutdown(&self) {
        self.coordinator.begin_stop();
    }

    /// Waits for every loop to return.
    pub async fn join(self) -> GroupSummary {
        let mut summary = GroupSummary::default();
        let mut pending: FuturesUnordered<_> = self.handles.into_iter().collect();

        while let Some(joined) = pending.next().await {
            match joined {
                Ok(run) => {
                    summary.completed += 1;
                    summary.totals.merge(&run);
                }
                Err(e) => {
                    summary.failed += 1;
                    self.logger
                        .log(Level::ERROR, format_args!("fetch loop task failed: {}", e));
                }
            }
        }

        summary
    }
}
