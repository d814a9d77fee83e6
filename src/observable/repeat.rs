//! Re-subscribing source wrapper.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crate::error::RxError;
use crate::observable::OnSubscribe;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

/// Subscribes `source` up to `count` times in a row, forwarding values and
/// suppressing the intermediate completions; `count == 0` repeats forever.
pub(super) struct RepeatOnSubscribe<Item> {
  source: Arc<dyn OnSubscribe<Item>>,
  count: usize,
}

impl<Item> RepeatOnSubscribe<Item> {
  pub(super) fn new(source: Arc<dyn OnSubscribe<Item>>, count: usize) -> Self {
    RepeatOnSubscribe { source, count }
  }
}

impl<Item: Send + 'static> OnSubscribe<Item> for RepeatOnSubscribe<Item> {
  fn call(&self, subscriber: &SubscriberRef<Item>) {
    let repeat = Arc::new_cyclic(|weak: &Weak<RepeatSubscriber<Item>>| {
      RepeatSubscriber {
        source: self.source.clone(),
        child: subscriber.clone(),
        self_ref: weak.clone(),
        infinite: self.count == 0,
        remaining: AtomicUsize::new(self.count),
        busy: AtomicBool::new(false),
        again: AtomicBool::new(false),
      }
    });
    repeat.drive();
  }
}

/// Forwards values and gates completion: an inner run completing triggers a
/// re-subscription instead of a downstream `complete` until the runs are
/// exhausted. Errors and unsubscription stop the cycle immediately.
struct RepeatSubscriber<Item> {
  source: Arc<dyn OnSubscribe<Item>>,
  child: SubscriberRef<Item>,
  self_ref: Weak<RepeatSubscriber<Item>>,
  infinite: bool,
  remaining: AtomicUsize,
  busy: AtomicBool,
  again: AtomicBool,
}

impl<Item: Send + 'static> RepeatSubscriber<Item> {
  /// Runs the source, trampolining re-subscriptions requested by a
  /// synchronous `complete` so a long repeat cannot overflow the stack.
  fn drive(self: &Arc<Self>) {
    if self.busy.swap(true, Ordering::AcqRel) {
      self.again.store(true, Ordering::Release);
      return;
    }
    let this: SubscriberRef<Item> = self.clone();
    loop {
      self.source.call(&this);
      if !self.again.swap(false, Ordering::AcqRel) {
        break;
      }
    }
    self.busy.store(false, Ordering::Release);
  }
}

impl<Item: Send + 'static> Observer<Item> for RepeatSubscriber<Item> {
  fn next(&self, value: Item) {
    if !self.is_unsubscribed() {
      self.child.next(value);
    }
  }

  fn error(&self, err: RxError) {
    self.child.error(err);
  }

  fn complete(&self) {
    if self.is_unsubscribed() {
      return;
    }
    if !self.infinite && self.remaining.fetch_sub(1, Ordering::AcqRel) <= 1 {
      self.child.complete();
      return;
    }
    if let Some(this) = self.self_ref.upgrade() {
      this.drive();
    }
  }
}

impl<Item> SubscriptionLike for RepeatSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item: Send + 'static> Subscriber<Item> for RepeatSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}

#[cfg(test)]
mod test {
  use crate::observable::{from_iter, range};
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  #[test]
  fn repeats_the_sequence_back_to_back() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let completed = Arc::new(AtomicBool::new(false));
    let (out_c, completed_c) = (out.clone(), completed.clone());
    range(0i32, 3).repeat(2).subscribe_complete(
      move |v| out_c.lock().unwrap().push(v),
      move || completed_c.store(true, Ordering::SeqCst),
    );
    assert_eq!(*out.lock().unwrap(), vec![0, 1, 2, 0, 1, 2]);
    assert!(completed.load(Ordering::SeqCst));
  }

  #[test]
  fn repeat_once_is_the_identity() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    from_iter(vec![7, 8])
      .repeat(1)
      .subscribe(move |v| out_c.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![7, 8]);
  }

  #[test]
  fn infinite_repeat_stops_with_take() {
    let count = Arc::new(AtomicUsize::new(0));
    let count_c = count.clone();
    from_iter(vec![1]).repeat(0).take(1000).subscribe(move |_| {
      count_c.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(count.load(Ordering::SeqCst), 1000);
  }

  #[test]
  fn deep_repeat_does_not_recurse() {
    // A large synchronous repeat count must loop, not nest stack frames.
    let count = Arc::new(AtomicUsize::new(0));
    let count_c = count.clone();
    from_iter(vec![0u8]).repeat(100_000).subscribe(move |_| {
      count_c.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(count.load(Ordering::SeqCst), 100_000);
  }
}
