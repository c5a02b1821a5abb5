//! # AWS SQS Consumer
//!
//! A concurrent consumer engine for AWS SQS: register one handler, run as
//! many fetch loops as you need, and shut them all down within a bounded
//! grace period without acknowledging unfinished work.
//!
//! ## Features
//!
//! - Long-poll receive with configurable batch size and wait time
//! - Automatic message deletion on successful processing, and only then
//! - Continue-on-error semantics: receive, handler and delete failures are logged, never fatal
//! - Fan-out through independent fetch loops sharing one client, queue and handler
//! - Shutdown on context cancellation or an external channel, with a grace
//!   period that escalates to hard cancellation
//! - Injected log sink, no-op by default, with a `tracing` adapter
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rs_sqs_consumer::{client::create_sqs_client_from_env, Consumer, FetchGroup, RunConfig};
//! use rs_sqs_consumer::handler::HandlerError;
//! use rs_sqs_consumer::logging::TracingLogger;
//! use rs_sqs_consumer::message::Message;
//! use rs_sqs_consumer::shutdown::shutdown_channel;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = create_sqs_client_from_env().await;
//!     let consumer = Consumer::new(
//!         client,
//!         "example_queue",
//!         |ctx: CancellationToken, message: Message| async move {
//!             if ctx.is_cancelled() {
//!                 return Err::<(), HandlerError>("cancelled".into());
//!             }
//!             println!("Processing message: {}", message.body);
//!             Ok(())
//!         },
//!     )
//!     .await?
//!     .with_logger(TracingLogger);
//!
//!     let (trigger, listener) = shutdown_channel();
//!     let ctx = CancellationToken::new();
//!     let group = FetchGroup::spawn(
//!         Arc::new(consumer),
//!         3,
//!         &ctx,
//!         RunConfig::default().with_shutdown(listener),
//!     );
//!
//!     tokio::signal::ctrl_c().await?;
//!     trigger.close();
//!     group.join().await;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod consumer;
pub mod errors;
pub mod group;
pub mod handler;
pub mod logging;
pub mod message;
pub mod queue;
pub mod shutdown;

pub use client::QueueClient;
pub use consumer::{Consumer, RunConfig, RunSummary};
pub use errors::{ConsumerError, QueueError};
pub use group::{FetchGroup, GroupSummary};
pub use handler::{Handler, HandlerError};
pub use message::Message;
pub use shutdown::{ShutdownCoordinator, ShutdownState, shutdown_channel};
