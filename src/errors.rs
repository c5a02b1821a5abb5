use thiserror::Error;

/// Error types for constructing an SQS consumer.
///
/// These are the only errors that cross the public boundary of the crate.
/// Everything that goes wrong while polling (receive, handler, delete) is
/// absorbed by the fetch loop and reported through the installed
/// [`Logger`](crate::logging::Logger).
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The queue could neither be looked up nor created.
    #[error("failed to set up queue '{name}': {source}")]
    QueueSetup {
        name: String,
        #[source]
        source: QueueError,
    },
}

/// Errors reported by a [`QueueClient`](crate::client::QueueClient).
///
/// SDK errors are rendered into strings so that alternative transports (and
/// test doubles) can produce the same variants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("failed to look up queue url: {0}")]
    Resolve(String),

    #[error("failed to create queue: {0}")]
    Create(String),

    #[error("failed to receive messages: {0}")]
    Receive(String),

    #[error("failed to delete message: {0}")]
    Delete(String),

    /// The service answered without a queue url.
    #[error("queue service returned no url for queue '{0}'")]
    MissingQueueUrl(String),
}
