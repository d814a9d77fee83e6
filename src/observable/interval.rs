//! Clock-driven sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observable::{Observable, OnSubscribe};
use crate::scheduler::{Scheduler, SchedulersFactory};
use crate::subscriber::SubscriberRef;

/// Emits an increasing counter from a scheduler worker: `0, 1, 2, ...`, one
/// value per tick. A fresh worker is created per subscription and both the
/// worker and the tick loop are cancelled when the subscriber unsubscribes.
struct PeriodicOnSubscribe {
  initial_delay: Duration,
  period: Duration,
  take: Option<usize>,
  scheduler: Arc<dyn Scheduler>,
}

impl OnSubscribe<u64> for PeriodicOnSubscribe {
  fn call(&self, subscriber: &SubscriberRef<u64>) {
    let worker = self.scheduler.create_worker();
    subscriber.add(worker.subscription());

    let counter = AtomicU64::new(0);
    let take = self.take;
    let downstream = subscriber.clone();
    let handle = worker.schedule_periodically(
      Box::new(move || {
        let tick = counter.fetch_add(1, Ordering::Relaxed);
        downstream.next(tick);
        if take.is_some_and(|n| tick + 1 >= n as u64) {
          downstream.complete();
        }
      }),
      self.initial_delay,
      self.period,
      take,
    );
    subscriber.add(handle);
  }
}

/// Ticks forever on a fresh thread: first tick after `delay`, then one
/// every `period`.
pub fn interval(delay: Duration, period: Duration) -> Observable<u64> {
  interval_on(delay, period, SchedulersFactory::instance().new_thread())
}

/// [`interval`] on an explicit scheduler.
pub fn interval_on(
  delay: Duration,
  period: Duration,
  scheduler: Arc<dyn Scheduler>,
) -> Observable<u64> {
  Observable::new(Arc::new(PeriodicOnSubscribe {
    initial_delay: delay,
    period,
    take: None,
    scheduler,
  }))
}

/// Emits a single `0` after `delay`, then completes.
pub fn timer(delay: Duration) -> Observable<u64> {
  Observable::new(Arc::new(PeriodicOnSubscribe {
    initial_delay: delay,
    period: delay,
    take: Some(1),
    scheduler: SchedulersFactory::instance().new_thread(),
  }))
}
