use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct TakeWhileOp<Item> {
  predicate: Arc<dyn Fn(&Item) -> bool + Send + Sync>,
}

impl<Item> TakeWhileOp<Item> {
  pub(crate) fn new(
    predicate: impl Fn(&Item) -> bool + Send + Sync + 'static,
  ) -> Self {
    TakeWhileOp {
      predicate: Arc::new(predicate),
    }
  }
}

impl<Item: 'static> Operator<Item, Item> for TakeWhileOp<Item> {
  fn call(&self, child: SubscriberRef<Item>) -> SubscriberRef<Item> {
    Arc::new(TakeWhileSubscriber {
      child,
      predicate: self.predicate.clone(),
      done: AtomicBool::new(false),
    })
  }
}

struct TakeWhileSubscriber<Item> {
  child: SubscriberRef<Item>,
  predicate: Arc<dyn Fn(&Item) -> bool + Send + Sync>,
  done: AtomicBool,
}

impl<Item: 'static> Observer<Item> for TakeWhileSubscriber<Item> {
  fn next(&self, value: Item) {
    if self.done.load(Ordering::Acquire) {
      return;
    }
    if (self.predicate)(&value) {
      self.child.next(value);
    } else if !self.done.swap(true, Ordering::AcqRel) {
      self.child.complete();
    }
  }

  fn error(&self, err: RxError) {
    if !self.done.swap(true, Ordering::AcqRel) {
      self.child.error(err);
    }
  }

  fn complete(&self) {
    if !self.done.swap(true, Ordering::AcqRel) {
      self.child.complete();
    }
  }
}

impl<Item> SubscriptionLike for TakeWhileSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item: 'static> Subscriber<Item> for TakeWhileSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}
