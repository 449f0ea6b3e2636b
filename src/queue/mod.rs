//! Queue boundary between the HTTP ingress and the request handlers.
//!
//! The durable broker is an external collaborator; what crosses the
//! boundary is the serializable [`InboundQuery`]. The in-process
//! [`ChannelQueue`] stands in for it with a bounded `tokio::sync::mpsc`
//! channel and pairs each message with a one-shot reply slot, mirroring
//! request/reply messaging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod worker;

pub use worker::spawn_workers;

use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::models::{GatewayResponse, InboundQuery};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

/// Receiver half of a request/reply exchange.
pub type PendingReply = oneshot::Receiver<GatewayResponse>;

/// A message plus the slot its reply goes to.
#[derive(Debug)]
pub struct QueuedRequest {
    pub message: InboundQuery,
    pub reply: Option<oneshot::Sender<GatewayResponse>>,
}

/// Producer side of the queue, as seen by the ingress.
pub trait RequestQueue: Send + Sync {
    /// Enqueue without waiting. Fails when the queue is full or closed.
    fn enqueue(&self, message: InboundQuery) -> Result<PendingReply>;

    /// Messages accepted but not yet taken by a worker.
    fn depth(&self) -> usize;

    fn capacity(&self) -> usize;
}

/// Bounded in-process queue.
#[derive(Clone)]
pub struct ChannelQueue {
    sender: mpsc::Sender<QueuedRequest>,
    capacity: usize,
}

/// Consumer side, shared by all workers; each message goes to exactly one.
#[derive(Clone)]
pub struct QueueConsumer {
    receiver: Arc<Mutex<mpsc::Receiver<QueuedRequest>>>,
}

impl ChannelQueue {
    pub fn bounded(capacity: usize) -> (Self, QueueConsumer) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self { sender, capacity },
            QueueConsumer {
                receiver: Arc::new(Mutex::new(receiver)),
            },
        )
    }
}

impl RequestQueue for ChannelQueue {
    fn enqueue(&self, message: InboundQuery) -> Result<PendingReply> {
        let exchange_id = message.exchange_id.clone();
        let (reply, pending) = oneshot::channel();

        self.sender
            .try_send(QueuedRequest {
                message,
                reply: Some(reply),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    GatewayError::QueueUnavailable("request queue is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    GatewayError::QueueUnavailable("request queue is closed".to_string())
                }
            })?;

        metrics::set_queue_depth(self.depth());
        debug!("Exchange {} enqueued (depth {})", exchange_id, self.depth());
        Ok(pending)
    }

    fn depth(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl QueueConsumer {
    /// Next message, or `None` once every producer is gone and the queue is empty.
    pub async fn recv(&self) -> Option<QueuedRequest> {
        let mut receiver = self.receiver.lock().await;
        let next = receiver.recv().await;
        metrics::set_queue_depth(receiver.len());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> InboundQuery {
        InboundQuery::new("GET", "/fhir/Patient")
    }

    #[tokio::test]
    async fn test_enqueue_and_receive_preserves_message() {
        let (queue, consumer) = ChannelQueue::bounded(4);
        let sent = message().with_param("family", "Smith").with_header("X-Trace", "1");
        let _pending = queue.enqueue(sent.clone()).unwrap();
        assert_eq!(queue.depth(), 1);

        let received = consumer.recv().await.unwrap();
        assert_eq!(received.message, sent);
        assert!(received.reply.is_some());
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let (queue, _consumer) = ChannelQueue::bounded(1);
        let _first = queue.enqueue(message()).unwrap();
        let err = queue.enqueue(message()).unwrap_err();
        assert!(matches!(err, GatewayError::QueueUnavailable(_)));
    }

    #[tokio::test]
    async fn test_closed_queue_rejects() {
        let (queue, consumer) = ChannelQueue::bounded(1);
        drop(consumer);
        assert!(queue.enqueue(message()).is_err());
    }

    #[tokio::test]
    async fn test_consumer_ends_when_producers_drop() {
        let (queue, consumer) = ChannelQueue::bounded(2);
        let _pending = queue.enqueue(message()).unwrap();
        drop(queue);

        assert!(consumer.recv().await.is_some());
        assert!(consumer.recv().await.is_none());
    }
}
