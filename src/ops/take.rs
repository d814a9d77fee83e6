use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct TakeOp {
  count: usize,
}

impl TakeOp {
  pub(crate) fn new(count: usize) -> Self {
    TakeOp { count }
  }
}

impl<Item: 'static> Operator<Item, Item> for TakeOp {
  fn call(&self, child: SubscriberRef<Item>) -> SubscriberRef<Item> {
    Arc::new(TakeSubscriber {
      child,
      remaining: AtomicUsize::new(self.count),
      done: AtomicBool::new(false),
    })
  }
}

struct TakeSubscriber<Item> {
  child: SubscriberRef<Item>,
  remaining: AtomicUsize,
  done: AtomicBool,
}

impl<Item> TakeSubscriber<Item> {
  fn finish(&self) {
    if !self.done.swap(true, Ordering::AcqRel) {
      self.child.complete();
    }
  }
}

impl<Item: 'static> Observer<Item> for TakeSubscriber<Item> {
  fn next(&self, value: Item) {
    let claimed = self
      .remaining
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    match claimed {
      Ok(1) => {
        // Last requested value: deliver, then complete.
        self.child.next(value);
        self.finish();
      }
      Ok(_) => self.child.next(value),
      Err(_) => self.finish(),
    }
  }

  fn error(&self, err: RxError) {
    if !self.done.swap(true, Ordering::AcqRel) {
      self.child.error(err);
    }
  }

  fn complete(&self) {
    self.finish();
  }
}

impl<Item> SubscriptionLike for TakeSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item: 'static> Subscriber<Item> for TakeSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}
