//! Event delivery for sync lifecycle observers.
//!
//! The orchestrator publishes [`SyncEvent`](crate::events::SyncEvent)s through
//! an `EventBus`; any number of observers subscribe to follow progress and the
//! terminal outcome of a run.

use thiserror::Error;
use tokio::sync::broadcast;

const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Event-related errors.
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("receiver lagged behind by {0} events")]
    Lagged(u64),

    #[error("event bus closed")]
    Closed,
}

/// Broadcast bus for sync lifecycle events.
///
/// Uses tokio's broadcast channel for delivery. All subscribers receive all
/// events. Late subscribers do not receive past events; emitting with no
/// subscribers is not an error.
#[derive(Debug, Clone)]
pub struct EventBus<T: Clone> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    /// Create a new event bus with the given capacity.
    ///
    /// Capacity determines how many events can be buffered before slow
    /// receivers start missing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
        }
    }

    /// Create a new subscriber to receive events.
    pub fn subscribe(&self) -> EventReceiver<T> {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: T) {
        let _ = self.sender.send(event);
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Receiving side of an [`EventBus`] subscription.
#[derive(Debug)]
pub struct EventReceiver<T: Clone> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> EventReceiver<T> {
    /// Receive the next event, waiting if none is buffered.
    pub async fn recv(&mut self) -> Result<T, EventBusError> {
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(n)) => Err(EventBusError::Lagged(n)),
            Err(broadcast::error::RecvError::Closed) => Err(EventBusError::Closed),
        }
    }

    /// Receive an event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}
