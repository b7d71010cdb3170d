//! Publish/subscribe abstraction (mechanics only).
//!
//! The bus fans every published message out to every live subscriber
//! (broadcast semantics). It makes minimal assumptions:
//!
//! - **Transport-agnostic**: in-memory channels, database notifications, etc.
//! - **No ordering guarantee** relative to writes initiated elsewhere: a
//!   subscriber may observe a change before or after the writer's call returns.
//! - **No persistence**: the bus distributes, the document store is the source
//!   of truth. Consumers that need state re-read it on every message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

type CancelFn = Box<dyn FnOnce() + Send + 'static>;

struct HandleInner {
    cancelled: AtomicBool,
    on_cancel: Mutex<Option<CancelFn>>,
}

/// Cancellation handle for a live subscription.
///
/// The cancel action runs **exactly once**: the first call to [`cancel`]
/// (from any clone, or from dropping the owning [`Subscription`]) runs it, every
/// later call is a no-op.
///
/// [`cancel`]: SubscriptionHandle::cancel
#[derive(Clone)]
pub struct SubscriptionHandle {
    inner: Arc<HandleInner>,
}

impl SubscriptionHandle {
    pub fn new(on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                cancelled: AtomicBool::new(false),
                on_cancel: Mutex::new(Some(Box::new(on_cancel))),
            }),
        }
    }

    /// Run the cancel action if it has not run yet.
    ///
    /// Returns `true` only for the call that actually performed the teardown.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }

        let action = match self.inner.on_cancel.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(action) = action {
            action();
        }
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }
}

impl core::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A live subscription to a message stream.
///
/// Dropping the subscription cancels it.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: UnboundedReceiver<M>,
    handle: SubscriptionHandle,
}

impl<M> Subscription<M> {
    pub fn new(receiver: UnboundedReceiver<M>, handle: SubscriptionHandle) -> Self {
        Self { receiver, handle }
    }

    /// Wait for the next message. `None` once the publisher side is gone or
    /// the subscription was cancelled and drained.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Try to receive a message without waiting.
    pub fn try_recv(&mut self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Shared handle; clones can cancel the subscription from elsewhere.
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Explicitly tear the subscription down.
    pub fn cancel(self) -> bool {
        // Drop runs afterwards but finds the handle already cancelled.
        self.handle.cancel()
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

/// Domain-agnostic pub/sub bus.
///
/// `Send + Sync` so that store backends can publish from any task.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Publish to all current subscribers; returns how many received it.
    fn publish(&self, message: M) -> Result<usize, Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_handle() -> (SubscriptionHandle, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handle = SubscriptionHandle::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (handle, count)
    }

    #[test]
    fn cancel_runs_action_once_across_clones() {
        let (handle, count) = counting_handle();
        let other = handle.clone();

        assert!(handle.cancel());
        assert!(!other.cancel());
        assert!(!handle.cancel());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(other.is_cancelled());
    }

    #[test]
    fn dropping_subscription_cancels_once() {
        let (handle, count) = counting_handle();
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel::<u32>();
        let sub = Subscription::new(rx, handle.clone());

        drop(sub);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        handle.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_cancel_then_drop_cancels_once() {
        let (handle, count) = counting_handle();
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel::<u32>();
        let sub = Subscription::new(rx, handle);

        assert!(sub.cancel());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
