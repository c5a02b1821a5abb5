use std::fmt;
use std::sync::Arc;

use crate::client::QueueClient;
use crate::errors::ConsumerError;

/// Immutable reference to a resolved queue (its URL).
///
/// Cheap to clone; shared read-only by every fetch loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueRef(Arc<str>);

impl QueueRef {
    pub fn new(url: impl AsRef<str>) -> Self {
        QueueRef(Arc::from(url.as_ref()))
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attributes applied when a queue has to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    /// How long the service keeps an unconsumed message, in seconds.
    pub message_retention_seconds: u32,

    /// Default long-poll wait for receives on this queue, in seconds.
    pub receive_wait_time_seconds: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        QueueSettings {
            // 14 days, the service maximum.
            message_retention_seconds: 1_209_600,
            receive_wait_time_seconds: 20,
        }
    }
}

/// Looks up the queue named `name`, creating it with [`QueueSettings::default`]
/// if it does not exist yet.
pub async fn setup_queue<C>(client: &C, name: &str) -> Result<QueueRef, ConsumerError>
where
    C: QueueClient + ?Sized,
{
    client
        .resolve_or_create_queue(name, &QueueSettings::default())
        .await
        .map_err(|source| ConsumerError::QueueSetup {
            name: name.to_string(),
            source,
        })
}
