use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_sqs::config::SharedCredentialsProvider;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{MessageSystemAttributeName, QueueAttributeName};

use crate::errors::QueueError;
use crate::message::{Message, ReceiptHandle};
use crate::queue::{QueueRef, QueueSettings};

/// The queue operations the consumer needs.
///
/// Implemented for [`aws_sdk_sqs::Client`]. Implementations must be safe to
/// call concurrently: every fetch loop of a consumer shares one client.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Returns the reference of the queue named `name`, creating the queue
    /// with `settings` if it does not exist. Idempotent.
    async fn resolve_or_create_queue(
        &self,
        name: &str,
        settings: &QueueSettings,
    ) -> Result<QueueRef, QueueError>;

    /// Long-polls for up to `max_messages` messages, waiting at most
    /// `wait_seconds`. An empty batch is not an error.
    ///
    /// Messages the service returns without a receipt handle are dropped
    /// here; `dropped` in the result counts them.
    async fn receive_batch(
        &self,
        queue: &QueueRef,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<ReceivedBatch, QueueError>;

    /// Deletes (acknowledges) one delivery.
    async fn delete_message(
        &self,
        queue: &QueueRef,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), QueueError>;
}

/// The result of one receive call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedBatch {
    pub messages: Vec<Message>,

    /// Deliveries that could not be acknowledged and were not dispatched.
    pub dropped: usize,
}

impl From<Vec<Message>> for ReceivedBatch {
    fn from(messages: Vec<Message>) -> Self {
        ReceivedBatch {
            messages,
            dropped: 0,
        }
    }
}

#[async_trait]
impl QueueClient for aws_sdk_sqs::Client {
    async fn resolve_or_create_queue(
        &self,
        name: &str,
        settings: &QueueSettings,
    ) -> Result<QueueRef, QueueError> {
        // if the queue already exists just take its url
        if let Ok(output) = self.get_queue_url().queue_name(name).send().await {
            if let Some(url) = output.queue_url() {
                return Ok(QueueRef::new(url));
            }
        }

        let output = self
            .create_queue()
            .queue_name(name)
            .attributes(
                QueueAttributeName::MessageRetentionPeriod,
                settings.message_retention_seconds.to_string(),
            )
            .attributes(
                QueueAttributeName::ReceiveMessageWaitTimeSeconds,
                settings.receive_wait_time_seconds.to_string(),
            )
            .send()
            .await
            .map_err(|e| QueueError::Create(DisplayErrorContext(e).to_string()))?;

        output
            .queue_url()
            .map(QueueRef::new)
            .ok_or_else(|| QueueError::MissingQueueUrl(name.to_string()))
    }

    async fn receive_batch(
        &self,
        queue: &QueueRef,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<ReceivedBatch, QueueError> {
        let output = self
            .receive_message()
            .queue_url(queue.url())
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_seconds)
            .message_system_attribute_names(MessageSystemAttributeName::All)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(e).to_string()))?;

        let mut batch = ReceivedBatch::default();
        for message in output.messages() {
            match Message::from_sqs(message) {
                Some(message) => batch.messages.push(message),
                None => batch.dropped += 1,
            }
        }

        Ok(batch)
    }

    async fn delete_message(
        &self,
        queue: &QueueRef,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        aws_sdk_sqs::Client::delete_message(self)
            .queue_url(queue.url())
            .receipt_handle(receipt_handle.as_str())
            .send()
            .await
            .map_err(|e| QueueError::Delete(DisplayErrorContext(e).to_string()))?;

        Ok(())
    }
}

/// Creates an AWS SQS client using credentials and configuration from the environment.
///
/// This function loads AWS configuration from environment variables such as:
/// - `AWS_ACCESS_KEY_ID`
/// - `AWS_SECRET_ACCESS_KEY`
/// - `AWS_REGION`
/// - `AWS_PROFILE`
///
/// # Example
///
/// ```rust,no_run
/// use rs_sqs_consumer::client::create_sqs_client_from_env;
///
/// #[tokio::main]
/// async fn main() {
///     let client = create_sqs_client_from_env().await;
///     // Use the client...
/// }
/// ```
pub async fn create_sqs_client_from_env() -> aws_sdk_sqs::Client {
    let config = aws_config::load_from_env().await;
    aws_sdk_sqs::Client::new(&config)
}

/// Creates an AWS SQS client with explicitly provided credentials and region.
///
/// Useful for applications that manage credentials dynamically or need to
/// use different credentials than those in the environment.
///
/// # Arguments
///
/// * `access_key_id` - The AWS access key ID
/// * `secret_access_key` - The AWS secret access key
/// * `region` - The AWS region (e.g., "us-east-1", "eu-west-1")
pub fn create_sqs_client_with_credentials(
    access_key_id: &str,
    secret_access_key: &str,
    region: &str,
) -> aws_sdk_sqs::Client {
    let credentials =
        aws_sdk_sqs::config::Credentials::new(access_key_id, secret_access_key, None, None, "aws");

    let config = aws_sdk_sqs::config::Builder::new()
        .region(Region::new(region.to_string()))
        .credentials_provider(SharedCredentialsProvider::new(credentials))
        .build();

    aws_sdk_sqs::Client::from_conf(config)
}
