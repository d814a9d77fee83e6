use std::sync::{Arc, Mutex};

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct LastOp;

impl LastOp {
  pub(crate) fn new() -> Self {
    LastOp
  }
}

impl<Item: Send + 'static> Operator<Item, Item> for LastOp {
  fn call(&self, child: SubscriberRef<Item>) -> SubscriberRef<Item> {
    Arc::new(LastSubscriber {
      child,
      latest: Mutex::new(None),
    })
  }
}

struct LastSubscriber<Item> {
  child: SubscriberRef<Item>,
  latest: Mutex<Option<Item>>,
}

impl<Item: Send + 'static> Observer<Item> for LastSubscriber<Item> {
  fn next(&self, value: Item) {
    *self.latest.lock().unwrap() = Some(value);
  }

  fn error(&self, err: RxError) {
    self.child.error(err);
  }

  fn complete(&self) {
    // An empty source completes empty-handed.
    if let Some(value) = self.latest.lock().unwrap().take() {
      self.child.next(value);
    }
    self.child.complete();
  }
}

impl<Item: Send> SubscriptionLike for LastSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item: Send + 'static> Subscriber<Item> for LastSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}
