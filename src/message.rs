use std::collections::HashMap;
use std::fmt;

use aws_sdk_sqs::types::MessageSystemAttributeName;

/// Opaque token that identifies one delivery of a message.
///
/// It is distinct from the message id: every receive of the same message
/// yields a new handle, and only the latest one can delete it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        ReceiptHandle(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message received from the queue.
///
/// Handlers get their own copy; the fetch loop keeps the receipt handle and
/// uses it to acknowledge the delivery when the handler succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The service-assigned message id, stable across redeliveries.
    pub message_id: Option<String>,

    /// The text payload.
    pub body: String,

    /// Handle required to delete this delivery.
    pub receipt_handle: ReceiptHandle,

    /// System attributes (`SentTimestamp`, `ApproximateReceiveCount`, ...).
    pub attributes: HashMap<String, String>,

    /// String-typed user attributes.
    pub message_attributes: HashMap<String, String>,

    /// How many times the service has handed out this message, if reported.
    pub receive_count: Option<u32>,
}

impl Message {
    /// Creates a message with just a body and a receipt handle.
    pub fn new(body: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Message {
            message_id: None,
            body: body.into(),
            receipt_handle: ReceiptHandle::new(receipt_handle),
            attributes: HashMap::new(),
            message_attributes: HashMap::new(),
            receive_count: None,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_receive_count(mut self, receive_count: u32) -> Self {
        self.receive_count = Some(receive_count);
        self
    }

    /// Converts an SDK message.
    ///
    /// Returns `None` when the message carries no receipt handle, since such a
    /// delivery could never be acknowledged.
    pub fn from_sqs(message: &aws_sdk_sqs::types::Message) -> Option<Self> {
        let receipt_handle = message.receipt_handle()?;

        let attributes: HashMap<String, String> = message
            .attributes()
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let receive_count = attributes
            .get(MessageSystemAttributeName::ApproximateReceiveCount.as_str())
            .and_then(|count| count.parse().ok());

        let message_attributes = message
            .message_attributes()
            .map(|attrs| {
                attrs
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .string_value()
                            .map(|value| (name.clone(), value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Message {
            message_id: message.message_id().map(ToOwned::to_owned),
            body: message.body().unwrap_or_default().to_string(),
            receipt_handle: ReceiptHandle::new(receipt_handle),
            attributes,
            message_attributes,
            receive_count,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message_id {
            Some(id) => write!(f, "message {}", id),
            None => write!(f, "message with receipt {}", self.receipt_handle),
        }
    }
}
