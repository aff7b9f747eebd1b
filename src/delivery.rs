//! Delivery queue seam: where normalized messages leave the core.

use tokio::sync::mpsc;
use tracing::warn;

use crate::pipeline::types::{LogContext, NormalizedMessage};

/// Fire-and-forget sink for converted messages.
pub trait DeliveryQueue: Send + Sync {
    fn enqueue(&self, message: NormalizedMessage, context: LogContext);
}

/// A message together with the context it was queued under.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub message: NormalizedMessage,
    pub context: LogContext,
}

/// Delivery queue backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelDeliveryQueue {
    tx: mpsc::UnboundedSender<QueuedMessage>,
}

impl ChannelDeliveryQueue {
    /// Create the queue and the receiver the delivery side drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueuedMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DeliveryQueue for ChannelDeliveryQueue {
    fn enqueue(&self, message: NormalizedMessage, context: LogContext) {
        if self.tx.send(QueuedMessage { message, context }).is_err() {
            warn!("Delivery queue receiver dropped; discarding message");
        }
    }
}
