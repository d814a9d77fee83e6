//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Creation/Factories
pub use crate::observable;
pub use crate::observable::{
  concat, defer, empty, from_iter, interval, interval_on, merge, never, of,
  range, throw, timer, Observable, OnSubscribe, Operator,
};
// Core traits
pub use crate::error::RxError;
pub use crate::observer::Observer;
pub use crate::subscriber::{CallbackSubscriber, Subscriber, SubscriberRef};
// Subscription
pub use crate::subscription::{
  CompositeSubscription, SharedSubscription, SubscriptionGuard,
  SubscriptionLike, WeakSubscription,
};
// Schedulers
pub use crate::scheduler::{
  NewThreadScheduler, Scheduler, SchedulersFactory, ThreadPoolScheduler,
  Worker,
};
