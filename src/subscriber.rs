//! Subscriber: an [`Observer`] that is also a [`SubscriptionLike`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::RxError;
use crate::observer::Observer;
use crate::subscription::{
  CompositeSubscription, SharedSubscription, SubscriptionLike,
};

/// The receiver end of a subscription: observes the sequence's signals and
/// doubles as the cancellation handle for everything the subscription owns.
pub trait Subscriber<Item>: Observer<Item> + SubscriptionLike {
  /// Registers a resource to be released when this subscriber is
  /// unsubscribed.
  fn add(&self, subscription: SharedSubscription);

  /// Invoked once, before the producer starts emitting.
  fn on_start(&self) {}
}

/// Shared reference to a type erased subscriber; operator chains are built
/// out of these.
pub type SubscriberRef<Item> = Arc<dyn Subscriber<Item>>;

type NextFn<Item> = Box<dyn Fn(Item) + Send + Sync>;
type ErrorFn = Box<dyn Fn(RxError) + Send + Sync>;
type CompleteFn = Box<dyn Fn() + Send + Sync>;

/// Terminal subscriber built from up to three callbacks.
///
/// Latches on the first terminal signal: anything arriving after `error`,
/// `complete` or `unsubscribe` is silently dropped (errors are logged, so
/// an asynchronous failure is never lost without a trace).
///
/// If no error callback is installed, a delivered error panics on the
/// delivering thread, the synchronous equivalent of rethrowing. Scheduler
/// workers catch such panics and log them, so asynchronous chains degrade
/// to log-and-drop instead of killing a worker thread.
pub struct CallbackSubscriber<Item> {
  next_fn: NextFn<Item>,
  error_fn: Option<ErrorFn>,
  complete_fn: Option<CompleteFn>,
  stopped: AtomicBool,
  subscriptions: CompositeSubscription,
}

impl<Item> CallbackSubscriber<Item> {
  pub fn new(
    next_fn: NextFn<Item>,
    error_fn: Option<ErrorFn>,
    complete_fn: Option<CompleteFn>,
  ) -> Self {
    CallbackSubscriber {
      next_fn,
      error_fn,
      complete_fn,
      stopped: AtomicBool::new(false),
      subscriptions: CompositeSubscription::new(),
    }
  }

  fn terminated(&self) -> bool {
    self.stopped.load(Ordering::Acquire) || self.is_unsubscribed()
  }
}

impl<Item> Observer<Item> for CallbackSubscriber<Item> {
  fn next(&self, value: Item) {
    if !self.terminated() {
      (self.next_fn)(value);
    }
  }

  fn error(&self, err: RxError) {
    if self.stopped.swap(true, Ordering::AcqRel) {
      return;
    }
    if self.is_unsubscribed() {
      log::debug!("dropping error signaled after unsubscribe: {err}");
      return;
    }
    match &self.error_fn {
      Some(f) => {
        f(err);
        self.subscriptions.unsubscribe();
      }
      None => {
        self.subscriptions.unsubscribe();
        panic!("unhandled observable error: {err}");
      }
    }
  }

  fn complete(&self) {
    if self.stopped.swap(true, Ordering::AcqRel) {
      return;
    }
    if self.is_unsubscribed() {
      return;
    }
    if let Some(f) = &self.complete_fn {
      f();
    }
    self.subscriptions.unsubscribe();
  }
}

impl<Item> SubscriptionLike for CallbackSubscriber<Item> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.subscriptions.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.subscriptions.unsubscribe()
  }
}

impl<Item> Subscriber<Item> for CallbackSubscriber<Item> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.subscriptions.add(subscription)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::sync::atomic::AtomicUsize;

  fn counting_subscriber(
    next: Arc<AtomicUsize>,
    err: Arc<AtomicUsize>,
    complete: Arc<AtomicUsize>,
  ) -> CallbackSubscriber<i32> {
    CallbackSubscriber::new(
      Box::new(move |_| {
        next.fetch_add(1, Ordering::SeqCst);
      }),
      Some(Box::new(move |_| {
        err.fetch_add(1, Ordering::SeqCst);
      })),
      Some(Box::new(move || {
        complete.fetch_add(1, Ordering::SeqCst);
      })),
    )
  }

  #[test]
  fn signals_after_complete_are_dropped() {
    let next = Arc::new(AtomicUsize::new(0));
    let err = Arc::new(AtomicUsize::new(0));
    let complete = Arc::new(AtomicUsize::new(0));
    let s =
      counting_subscriber(next.clone(), err.clone(), complete.clone());

    s.next(1);
    s.next(2);
    s.complete();
    s.next(3);
    s.error(RxError::msg("never dispatched"));
    s.complete();

    assert_eq!(next.load(Ordering::SeqCst), 2);
    assert_eq!(complete.load(Ordering::SeqCst), 1);
    assert_eq!(err.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn signals_after_unsubscribe_are_dropped() {
    let next = Arc::new(AtomicUsize::new(0));
    let err = Arc::new(AtomicUsize::new(0));
    let complete = Arc::new(AtomicUsize::new(0));
    let s =
      counting_subscriber(next.clone(), err.clone(), complete.clone());

    s.next(1);
    s.unsubscribe();
    s.next(2);
    s.error(RxError::msg("late"));
    s.complete();

    assert_eq!(next.load(Ordering::SeqCst), 1);
    assert_eq!(err.load(Ordering::SeqCst), 0);
    assert_eq!(complete.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn terminal_signal_closes_the_subscription() {
    let s: CallbackSubscriber<i32> =
      CallbackSubscriber::new(Box::new(|_| {}), None, None);
    s.complete();
    assert!(s.is_unsubscribed());
  }

  #[test]
  #[should_panic(expected = "unhandled observable error")]
  fn missing_error_handler_panics() {
    let s: CallbackSubscriber<i32> =
      CallbackSubscriber::new(Box::new(|_| {}), None, None);
    s.error(RxError::msg("boom"));
  }
}
