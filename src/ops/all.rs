use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct AllOp<Item> {
  predicate: Arc<dyn Fn(&Item) -> bool + Send + Sync>,
}

impl<Item> AllOp<Item> {
  pub(crate) fn new(
    predicate: impl Fn(&Item) -> bool + Send + Sync + 'static,
  ) -> Self {
    AllOp {
      predicate: Arc::new(predicate),
    }
  }
}

impl<Item: 'static> Operator<Item, bool> for AllOp<Item> {
  fn call(&self, child: SubscriberRef<bool>) -> SubscriberRef<Item> {
    Arc::new(AllSubscriber {
      child,
      predicate: self.predicate.clone(),
      done: AtomicBool::new(false),
    })
  }
}

/// Short-circuits on the first counterexample; an exhausted source is a
/// proof. The verdict always precedes the completion signal.
struct AllSubscriber<Item> {
  child: SubscriberRef<bool>,
  predicate: Arc<dyn Fn(&Item) -> bool + Send + Sync>,
  done: AtomicBool,
}

impl<Item> AllSubscriber<Item> {
  fn verdict(&self, value: bool) {
    if !self.done.swap(true, Ordering::AcqRel) {
      self.child.next(value);
      self.child.complete();
    }
  }
}

impl<Item: 'static> Observer<Item> for AllSubscriber<Item> {
  fn next(&self, value: Item) {
    if !self.done.load(Ordering::Acquire) && !(self.predicate)(&value) {
      self.verdict(false);
    }
  }

  fn error(&self, err: RxError) {
    if !self.done.swap(true, Ordering::AcqRel) {
      self.child.error(err);
    }
  }

  fn complete(&self) {
    self.verdict(true);
  }
}

impl<Item> SubscriptionLike for AllSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item: 'static> Subscriber<Item> for AllSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}
