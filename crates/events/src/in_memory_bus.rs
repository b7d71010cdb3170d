//! In-memory event bus for tests/dev and the in-process document store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::bus::{EventBus, Subscription, SubscriptionHandle};

#[derive(Debug)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    Poisoned,
}

type Subscribers<M> = Arc<Mutex<Vec<(u64, mpsc::UnboundedSender<M>)>>>;

/// In-memory pub/sub bus.
///
/// - No IO
/// - Best-effort fan-out; dead subscribers are pruned on publish
/// - Cancelling a subscription unregisters it immediately
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Subscribers<M>,
    next_id: AtomicU64,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered (not yet cancelled or pruned) subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| InMemoryBusError::Poisoned)?;

        // Drop any dead subscribers while publishing.
        subs.retain(|(_, tx)| tx.send(message.clone()).is_ok());

        Ok(subs.len())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages until the process restarts.
        match self.subscribers.lock() {
            Ok(mut subs) => subs.push((id, tx)),
            Err(_) => tracing::warn!(subscriber = id, "bus lock poisoned; subscription is inert"),
        }

        let registry = Arc::downgrade(&self.subscribers);
        let handle = SubscriptionHandle::new(move || {
            if let Some(registry) = registry.upgrade() {
                if let Ok(mut subs) = registry.lock() {
                    subs.retain(|(sub_id, _)| *sub_id != id);
                }
            }
        });

        Subscription::new(rx, handle)
    }
}
