//! The active set of stream subscribers.
//!
//! Each subscriber owns a bounded queue. The ingestion path pushes into every
//! queue without waiting; a subscriber whose queue is full or whose receiving
//! side has gone away is removed on the spot so it cannot hold up the others.

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::info;
use uuid::Uuid;

pub struct SubscriberRegistry {
    subscribers: DashMap<Uuid, mpsc::Sender<Bytes>>,
    queue_capacity: usize,
}

impl SubscriberRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Add a subscriber. Payloads fanned out from now on arrive on the returned receiver, in order.
    pub fn register(&self) -> (Uuid, mpsc::Receiver<Bytes>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.subscribers.insert(id, tx);
        info!(subscriber_id = %id, total = self.subscribers.len(), "Subscriber registered");
        (id, rx)
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unregister(&self, id: Uuid) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            info!(subscriber_id = %id, total = self.subscribers.len(), "Subscriber unregistered");
        }
        removed
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.subscribers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `payload` to every subscriber, dropping the ones that cannot take it.
    ///
    /// Returns how many subscribers received the payload.
    pub fn fan_out(&self, payload: &Bytes) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|id, tx| match tx.try_send(payload.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                info!(subscriber_id = %id, "Subscriber queue full, removing slow subscriber");
                false
            }
            Err(TrySendError::Closed(_)) => {
                info!(subscriber_id = %id, "Subscriber disconnected, removing");
                false
            }
        });
        delivered
    }
}
