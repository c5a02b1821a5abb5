#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rs_sqs_consumer::client::{QueueClient, ReceivedBatch};
use rs_sqs_consumer::errors::QueueError;
use rs_sqs_consumer::logging::{Level, Logger};
use rs_sqs_consumer::message::{Message, ReceiptHandle};
use rs_sqs_consumer::queue::{QueueRef, QueueSettings};
use rs_sqs_consumer::shutdown::ShutdownTrigger;
use tokio_util::sync::CancellationToken;

pub const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/000000000000/test-queue";

pub fn message(id: &str, receipt_handle: &str) -> Message {
    Message::new(format!("body of {}", id), receipt_handle).with_message_id(id)
}

/// What the mock does once its scripted receives run out.
pub enum StopAction {
    Cancel(CancellationToken),
    Close(ShutdownTrigger),
}

#[derive(Default)]
struct State {
    script: VecDeque<Result<Vec<Message>, QueueError>>,
    receive_calls: usize,
    deleted: Vec<ReceiptHandle>,
    failing_deletes: HashSet<ReceiptHandle>,
    existing_queues: HashSet<String>,
    created_queues: Vec<String>,
    fail_create: bool,
    stop_when_drained: Option<StopAction>,
}

/// In-memory queue that replays scripted receives and records deletes.
///
/// Once the script is empty, receives behave like an idle long-poll: they
/// sleep for the requested wait and return nothing.
#[derive(Clone, Default)]
pub struct MockQueue {
    state: Arc<Mutex<State>>,
}

impl MockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&self, messages: Vec<Message>) -> &Self {
        self.state.lock().unwrap().script.push_back(Ok(messages));
        self
    }

    pub fn push_receive_error(&self, message: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .script
            .push_back(Err(QueueError::Receive(message.to_string())));
        self
    }

    pub fn fail_delete_for(&self, receipt_handle: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(ReceiptHandle::new(receipt_handle));
        self
    }

    pub fn with_existing_queue(&self, name: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .existing_queues
            .insert(name.to_string());
        self
    }

    pub fn fail_create(&self) -> &Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    pub fn stop_when_drained(&self, action: StopAction) -> &Self {
        self.state.lock().unwrap().stop_when_drained = Some(action);
        self
    }

    pub fn receive_calls(&self) -> usize {
        self.state.lock().unwrap().receive_calls
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .deleted
            .iter()
            .map(|handle| handle.as_str().to_string())
            .collect()
    }

    pub fn created_queues(&self) -> Vec<String> {
        self.state.lock().unwrap().created_queues.clone()
    }
}

#[async_trait]
impl QueueClient for MockQueue {
    async fn resolve_or_create_queue(
        &self,
        name: &str,
        settings: &QueueSettings,
    ) -> Result<QueueRef, QueueError> {
        let mut state = self.state.lock().unwrap();
        let url = format!("https://sqs.us-east-1.amazonaws.com/000000000000/{}", name);
        if state.existing_queues.contains(name) {
            return Ok(QueueRef::new(url));
        }
        if state.fail_create {
            return Err(QueueError::Create("access denied".to_string()));
        }
        assert_eq!(settings.message_retention_seconds, 1_209_600);
        state.existing_queues.insert(name.to_string());
        state.created_queues.push(name.to_string());
        Ok(QueueRef::new(url))
    }

    async fn receive_batch(
        &self,
        queue: &QueueRef,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<ReceivedBatch, QueueError> {
        assert_eq!(queue.url(), QUEUE_URL);
        assert!((1..=10).contains(&max_messages));

        let next = {
            let mut state = self.state.lock().unwrap();
            state.receive_calls += 1;
            let next = state.script.pop_front();
            if next.is_none() {
                match state.stop_when_drained.take() {
                    Some(StopAction::Cancel(ctx)) => ctx.cancel(),
                    Some(StopAction::Close(trigger)) => trigger.close(),
                    None => {}
                }
            }
            next
        };

        match next {
            Some(Ok(messages)) => Ok(messages.into()),
            Some(Err(e)) => Err(e),
            None => {
                tokio::time::sleep(Duration::from_secs(wait_seconds.max(1) as u64)).await;
                Ok(ReceivedBatch::default())
            }
        }
    }

    async fn delete_message(
        &self,
        _queue: &QueueRef,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(receipt_handle) {
            return Err(QueueError::Delete(format!(
                "receipt handle {} is invalid",
                receipt_handle
            )));
        }
        state.deleted.push(receipt_handle.clone());
        Ok(())
    }
}

/// Log sink that keeps every line.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl RecordingLogger {
    pub fn count(&self, level: Level, needle: &str) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, line)| *l == level && line.contains(needle))
            .count()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.lines.lock().unwrap().push((level, args.to_string()));
    }
}
