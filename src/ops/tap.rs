use std::sync::Arc;

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct TapOp<Item> {
  on_next: Arc<dyn Fn(&Item) + Send + Sync>,
  on_error: Arc<dyn Fn(&RxError) + Send + Sync>,
  on_complete: Arc<dyn Fn() + Send + Sync>,
}

impl<Item> TapOp<Item> {
  pub(crate) fn new(
    on_next: impl Fn(&Item) + Send + Sync + 'static,
    on_error: impl Fn(&RxError) + Send + Sync + 'static,
    on_complete: impl Fn() + Send + Sync + 'static,
  ) -> Self {
    TapOp {
      on_next: Arc::new(on_next),
      on_error: Arc::new(on_error),
      on_complete: Arc::new(on_complete),
    }
  }
}

impl<Item: 'static> Operator<Item, Item> for TapOp<Item> {
  fn call(&self, child: SubscriberRef<Item>) -> SubscriberRef<Item> {
    Arc::new(TapSubscriber {
      child,
      on_next: self.on_next.clone(),
      on_error: self.on_error.clone(),
      on_complete: self.on_complete.clone(),
    })
  }
}

/// Runs the side effect before forwarding, so effects observe the signal
/// order exactly as the downstream does.
struct TapSubscriber<Item> {
  child: SubscriberRef<Item>,
  on_next: Arc<dyn Fn(&Item) + Send + Sync>,
  on_error: Arc<dyn Fn(&RxError) + Send + Sync>,
  on_complete: Arc<dyn Fn() + Send + Sync>,
}

impl<Item: 'static> Observer<Item> for TapSubscriber<Item> {
  fn next(&self, value: Item) {
    (self.on_next)(&value);
    self.child.next(value);
  }

  fn error(&self, err: RxError) {
    (self.on_error)(&err);
    self.child.error(err);
  }

  fn complete(&self) {
    (self.on_complete)();
    self.child.complete();
  }
}

impl<Item> SubscriptionLike for TapSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item: 'static> Subscriber<Item> for TapSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}
