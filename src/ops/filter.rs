use std::sync::Arc;

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct FilterOp<Item> {
  predicate: Arc<dyn Fn(&Item) -> bool + Send + Sync>,
}

impl<Item> FilterOp<Item> {
  pub(crate) fn new(
    predicate: impl Fn(&Item) -> bool + Send + Sync + 'static,
  ) -> Self {
    FilterOp {
      predicate: Arc::new(predicate),
    }
  }
}

impl<Item: 'static> Operator<Item, Item> for FilterOp<Item> {
  fn call(&self, child: SubscriberRef<Item>) -> SubscriberRef<Item> {
    Arc::new(FilterSubscriber {
      child,
      predicate: self.predicate.clone(),
    })
  }
}

struct FilterSubscriber<Item> {
  child: SubscriberRef<Item>,
  predicate: Arc<dyn Fn(&Item) -> bool + Send + Sync>,
}

impl<Item: 'static> Observer<Item> for FilterSubscriber<Item> {
  fn next(&self, value: Item) {
    if (self.predicate)(&value) {
      self.child.next(value);
    }
  }

  fn error(&self, err: RxError) {
    self.child.error(err);
  }

  fn complete(&self) {
    self.child.complete();
  }
}

impl<Item> SubscriptionLike for FilterSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item: 'static> Subscriber<Item> for FilterSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}
