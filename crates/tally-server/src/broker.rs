//! In-process fan-out of freshly ingested events to live dashboards.
//!
//! Each subscriber owns a small bounded queue. Publishing never waits: a full
//! queue means that subscriber misses the event. Delivery is at-most-once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use tally_core::event::Event;

pub struct Broker {
    capacity: usize,
    next_id: AtomicU64,
    /// Held only for a map mutation or one pass of `try_send`s; never across an await.
    subscribers: Mutex<HashMap<u64, mpsc::Sender<Arc<Event>>>>,
}

/// A registered subscriber's receiving end.
///
/// Dropping it unsubscribes, so every exit path of the consumer releases its
/// slot exactly once.
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<Arc<Event>>,
    broker: Arc<Broker>,
}

impl Broker {
    /// `capacity` is the per-subscriber queue size and must be non-zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(0),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<u64, mpsc::Sender<Arc<Event>>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry().insert(id, tx);
        debug!(subscriber = id, "Broker subscriber added");
        Subscription {
            id,
            receiver: rx,
            broker: Arc::clone(self),
        }
    }

    /// Removing the sender closes the channel once the receiver drains it.
    fn unsubscribe(&self, id: u64) {
        if self.registry().remove(&id).is_some() {
            debug!(subscriber = id, "Broker subscriber removed");
        }
    }

    /// Offer `event` to every subscriber without blocking.
    ///
    /// Returns how many subscribers accepted it.
    pub fn publish(&self, event: Event) -> usize {
        let event = Arc::new(event);
        let registry = self.registry();
        let mut delivered = 0;
        for (id, tx) in registry.iter() {
            match tx.try_send(Arc::clone(&event)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(subscriber = id, "Subscriber queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event. `None` once the broker side is gone.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.recv().await
    }

    /// Take an already-queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broker.unsubscribe(self.id);
    }
}
