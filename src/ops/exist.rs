use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct ExistOp<Item> {
  predicate: Arc<dyn Fn(&Item) -> bool + Send + Sync>,
}

impl<Item> ExistOp<Item> {
  pub(crate) fn new(
    predicate: impl Fn(&Item) -> bool + Send + Sync + 'static,
  ) -> Self {
    ExistOp {
      predicate: Arc::new(predicate),
    }
  }
}

impl<Item: 'static> Operator<Item, bool> for ExistOp<Item> {
  fn call(&self, child: SubscriberRef<bool>) -> SubscriberRef<Item> {
    Arc::new(ExistSubscriber {
      child,
      predicate: self.predicate.clone(),
      done: AtomicBool::new(false),
    })
  }
}

/// Short-circuits on the first witness; an exhausted source is a refusal.
struct ExistSubscriber<Item> {
  child: SubscriberRef<bool>,
  predicate: Arc<dyn Fn(&Item) -> bool + Send + Sync>,
  done: AtomicBool,
}

impl<Item> ExistSubscriber<Item> {
  fn verdict(&self, value: bool) {
    if !self.done.swap(true, Ordering::AcqRel) {
      self.child.next(value);
      self.child.complete();
    }
  }
}

impl<Item: 'static> Observer<Item> for ExistSubscriber<Item> {
  fn next(&self, value: Item) {
    if !self.done.load(Ordering::Acquire) && (self.predicate)(&value) {
      self.verdict(true);
    }
  }

  fn error(&self, err: RxError) {
    if !self.done.swap(true, Ordering::AcqRel) {
      self.child.error(err);
    }
  }

  fn complete(&self) {
    self.verdict(false);
  }
}

impl<Item> SubscriptionLike for ExistSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item: 'static> Subscriber<Item> for ExistSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}

#[cfg(test)]
mod test {
  use crate::observable::{empty, from_iter};
  use std::sync::{Arc, Mutex};

  fn outcome(o: crate::observable::Observable<bool>) -> Vec<bool> {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    o.subscribe(move |v| out_c.lock().unwrap().push(v));
    let result = out.lock().unwrap().clone();
    result
  }

  #[test]
  fn finds_a_witness() {
    let o = from_iter(vec![1, 3, 4]).exist(|v| v % 2 == 0);
    assert_eq!(outcome(o), vec![true]);
  }

  #[test]
  fn refuses_without_a_witness() {
    let o = from_iter(vec![1, 3, 5]).exist(|v| v % 2 == 0);
    assert_eq!(outcome(o), vec![false]);
  }

  #[test]
  fn empty_source_refuses() {
    let o = empty::<i32>().exist(|_| true);
    assert_eq!(outcome(o), vec![false]);
  }
}
