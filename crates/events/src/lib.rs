//! Change propagation: publish/subscribe with explicit cancellation handles.
//!
//! Live views (e.g. the order list) hold a [`Subscription`] for as long as they
//! are mounted. Tearing the view down invokes the subscription's
//! [`SubscriptionHandle`] exactly once, no matter how the teardown happens.

pub mod bus;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription, SubscriptionHandle};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
