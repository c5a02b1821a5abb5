//! Consumes `example_queue` with three fetch loops until Ctrl-C.
//!
//! ```text
//! cargo run --example consumer
//! ```
//!
//! Messages whose body contains "fail" are rejected and come back after the
//! queue's visibility timeout.

use std::sync::Arc;
use std::time::Duration;

use rs_sqs_consumer::client::create_sqs_client_from_env;
use rs_sqs_consumer::handler::HandlerError;
use rs_sqs_consumer::logging::TracingLogger;
use rs_sqs_consumer::message::Message;
use rs_sqs_consumer::shutdown::shutdown_channel;
use rs_sqs_consumer::{Consumer, FetchGroup, RunConfig};
use tokio_util::sync::CancellationToken;

const QUEUE_NAME: &str = "example_queue";
const FETCHERS: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client = create_sqs_client_from_env().await;
    let consumer = Consumer::new(client, QUEUE_NAME, process_message)
        .await?
        .with_logger(TracingLogger);

    let (trigger, listener) = shutdown_channel();
    let ctx = CancellationToken::new();

    tracing::info!("starting queue consumers");
    let group = FetchGroup::spawn(
        Arc::new(consumer),
        FETCHERS,
        &ctx,
        RunConfig::default()
            .with_shutdown(listener)
            .with_grace_period(Duration::from_secs(30)),
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("starting graceful shutdown");
    trigger.close();

    let summary = group.join().await;
    tracing::info!(
        acknowledged = summary.totals.acknowledged,
        failed = summary.totals.handler_failures,
        abandoned = summary.totals.abandoned,
        "shutdown complete"
    );

    Ok(())
}

async fn process_message(ctx: CancellationToken, message: Message) -> Result<(), HandlerError> {
    tracing::info!(message_id = ?message.message_id, "processing message");

    if message.body.contains("fail") {
        return Err(format!("refusing to process {}", message).into());
    }

    if ctx.is_cancelled() {
        tracing::warn!("context cancelled, aborting {}", message);
        return Err("cancelled".into());
    }

    tracing::info!("MSG: '{}'", message.body);
    Ok(())
}
