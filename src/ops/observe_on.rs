use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::queue::BoundedQueue;
use crate::scheduler::Scheduler;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{
  CompositeSubscription, SharedSubscription, SubscriptionLike,
  WeakSubscription,
};

/// How long the drain loop blocks on an empty buffer before re-checking
/// cancellation and completion.
const DRAIN_POP_TIMEOUT: Duration = Duration::from_millis(50);

pub struct ObserveOnOp {
  scheduler: Arc<dyn Scheduler>,
  buffer_size: usize,
}

impl ObserveOnOp {
  pub(crate) fn new(scheduler: Arc<dyn Scheduler>, buffer_size: usize) -> Self {
    ObserveOnOp {
      scheduler,
      buffer_size,
    }
  }
}

impl<Item: Send + 'static> Operator<Item, Item> for ObserveOnOp {
  fn call(&self, child: SubscriberRef<Item>) -> SubscriberRef<Item> {
    let worker = self.scheduler.create_worker();
    let subscriber = Arc::new(ObserveOnSubscriber {
      child: child.clone(),
      buffer: BoundedQueue::new(self.buffer_size),
      pending: AtomicUsize::new(0),
      finished: AtomicBool::new(false),
      recorded_error: Mutex::new(None),
      subscriptions: CompositeSubscription::new(),
    });
    subscriber.subscriptions.add(worker.subscription());
    // Registered weakly: the child's teardown list must not keep this
    // stage (and its buffered values) alive.
    child.add(Arc::new(WeakSubscription::of(&subscriber)));

    // One long-lived drain job per subscription; the worker thread parks
    // on the buffer instead of being rescheduled per value.
    let drain = subscriber.clone();
    let handle = worker.schedule(Box::new(move || drain.drain()));
    subscriber.subscriptions.add(handle);
    subscriber
  }
}

/// Hands values off to a scheduler worker through a bounded buffer.
///
/// The producer side never blocks: a full buffer fails the stream with
/// [`RxError::SlowSubscriber`]. A terminal signal is recorded and delivered
/// by the drain loop only after every buffered value, preserving signal
/// order across the thread hop.
struct ObserveOnSubscriber<Item> {
  child: SubscriberRef<Item>,
  buffer: BoundedQueue<Item>,
  pending: AtomicUsize,
  finished: AtomicBool,
  recorded_error: Mutex<Option<RxError>>,
  subscriptions: CompositeSubscription,
}

impl<Item: Send + 'static> ObserveOnSubscriber<Item> {
  fn drain(&self) {
    loop {
      if self.subscriptions.is_unsubscribed()
        || self.child.is_unsubscribed()
      {
        if let Some(err) = self.recorded_error.lock().unwrap().take() {
          log::warn!("dropping error signaled after unsubscribe: {err}");
        }
        self.buffer.clear();
        return;
      }
      if let Some(value) = self.buffer.wait_for_and_pop(DRAIN_POP_TIMEOUT) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
        self.child.next(value);
      }
      if self.finished.load(Ordering::Acquire)
        && self.pending.load(Ordering::Acquire) == 0
      {
        match self.recorded_error.lock().unwrap().take() {
          Some(err) => self.child.error(err),
          None => self.child.complete(),
        }
        self.unsubscribe();
        return;
      }
    }
  }
}

impl<Item: Send + 'static> Observer<Item> for ObserveOnSubscriber<Item> {
  fn next(&self, value: Item) {
    if self.finished.load(Ordering::Acquire) || self.is_unsubscribed() {
      return;
    }
    // Counted before the offer so the drain's decrement cannot underflow.
    self.pending.fetch_add(1, Ordering::AcqRel);
    if !self.buffer.offer(value) {
      self.pending.fetch_sub(1, Ordering::AcqRel);
      self.error(RxError::SlowSubscriber);
    }
  }

  fn error(&self, err: RxError) {
    if self.finished.swap(true, Ordering::AcqRel) {
      return;
    }
    *self.recorded_error.lock().unwrap() = Some(err);
  }

  fn complete(&self) {
    self.finished.store(true, Ordering::Release);
  }
}

impl<Item: Send> SubscriptionLike for ObserveOnSubscriber<Item> {
  fn is_unsubscribed(&self) -> bool {
    // `finished` counts: once the stream is terminal (including a
    // buffer overflow) a polling producer must stop immediately, not
    // after the drain delivers the recorded signal.
    self.finished.load(Ordering::Acquire)
      || self.subscriptions.is_unsubscribed()
      || self.child.is_unsubscribed()
  }

  fn unsubscribe(&self) {
    self.subscriptions.unsubscribe()
  }
}

impl<Item: Send + 'static> Subscriber<Item> for ObserveOnSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.subscriptions.add(subscription)
  }
}
