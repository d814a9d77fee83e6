//! A bounded, condition-variable signaled FIFO shared between producer and
//! consumer threads.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Thread-safe FIFO with a capacity limit.
///
/// The `len() <= limit` invariant is enforced by [`offer`] only; [`push`]
/// is unconditional and reserved for in-process pressure points that own
/// their own backpressure policy (scheduler job submission).
///
/// [`offer`]: BoundedQueue::offer
/// [`push`]: BoundedQueue::push
pub struct BoundedQueue<T> {
  items: Mutex<VecDeque<T>>,
  available: Condvar,
  limit: usize,
}

impl<T> BoundedQueue<T> {
  pub fn new(limit: usize) -> Self {
    BoundedQueue {
      items: Mutex::new(VecDeque::new()),
      available: Condvar::new(),
      limit,
    }
  }

  /// A queue whose limit is the maximum representable size.
  pub fn unbounded() -> Self {
    Self::new(usize::MAX)
  }

  /// Enqueues unconditionally and wakes one waiting consumer.
  pub fn push(&self, value: T) {
    let mut items = self.items.lock().unwrap();
    items.push_back(value);
    self.available.notify_one();
  }

  /// Enqueues unless the queue is at capacity; returns whether the value
  /// was accepted. Check and insert happen under one lock.
  pub fn offer(&self, value: T) -> bool {
    let mut items = self.items.lock().unwrap();
    if items.len() >= self.limit {
      return false;
    }
    items.push_back(value);
    self.available.notify_one();
    true
  }

  pub fn try_pop(&self) -> Option<T> {
    self.items.lock().unwrap().pop_front()
  }

  /// Blocks until an item is available.
  pub fn wait_and_pop(&self) -> T {
    let items = self.items.lock().unwrap();
    let mut items = self
      .available
      .wait_while(items, |q| q.is_empty())
      .unwrap();
    items.pop_front().expect("woken with an item available")
  }

  /// Blocks until an item is available or the timeout elapses. Lets idle
  /// consumers wake up periodically to observe shutdown signals.
  pub fn wait_for_and_pop(&self, timeout: Duration) -> Option<T> {
    let items = self.items.lock().unwrap();
    let (mut items, _) = self
      .available
      .wait_timeout_while(items, timeout, |q| q.is_empty())
      .unwrap();
    items.pop_front()
  }

  pub fn len(&self) -> usize {
    self.items.lock().unwrap().len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.lock().unwrap().is_empty()
  }

  pub fn clear(&self) {
    self.items.lock().unwrap().clear();
  }
}
