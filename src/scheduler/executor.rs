//! Fixed-size thread executor draining a shared job queue, plus the
//! worker implementation both schedulers build on.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::queue::BoundedQueue;
use crate::scheduler::{Action, PeriodicAction, Worker};
use crate::subscription::{SharedSubscription, SubscriptionLike};

/// How long an idle pool thread waits on the queue before re-checking the
/// shutdown flag.
const IDLE_POP_TIMEOUT: Duration = Duration::from_secs(2);

/// Cancellation handle of a scheduled action: flipping it before the
/// action is dequeued prevents the action from running at all; a running
/// periodic action polls it cooperatively.
pub(crate) struct ScheduledHandle {
  unsubscribed: AtomicBool,
}

impl ScheduledHandle {
  pub(crate) fn new() -> Arc<Self> {
    Arc::new(ScheduledHandle {
      unsubscribed: AtomicBool::new(false),
    })
  }
}

impl SubscriptionLike for ScheduledHandle {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.unsubscribed.load(Ordering::Acquire)
  }

  #[inline]
  fn unsubscribe(&self) {
    self.unsubscribed.store(true, Ordering::Release);
  }
}

struct Job {
  handle: Arc<ScheduledHandle>,
  action: Action,
}

/// A fixed set of threads draining one shared FIFO.
///
/// `submit` never blocks (the queue is the single in-process pressure
/// point for scheduling, see [`BoundedQueue::push`]). `shutdown` stops
/// accepting dequeues; already-dequeued actions finish. Dropping the
/// executor joins threads that still have queued work and detaches the
/// idle ones, so shutdown never hangs on cancelled work.
pub(crate) struct ThreadPoolExecutor {
  jobs: Arc<BoundedQueue<Job>>,
  done: Arc<AtomicBool>,
  threads: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPoolExecutor {
  pub(crate) fn new(pool_size: usize) -> Self {
    let jobs: Arc<BoundedQueue<Job>> = Arc::new(BoundedQueue::unbounded());
    let done = Arc::new(AtomicBool::new(false));
    let threads = (0..pool_size.max(1))
      .map(|_| {
        let jobs = jobs.clone();
        let done = done.clone();
        thread::spawn(move || Self::run(&jobs, &done))
      })
      .collect();
    ThreadPoolExecutor {
      jobs,
      done,
      threads: Mutex::new(threads),
    }
  }

  pub(crate) fn submit(&self, handle: Arc<ScheduledHandle>, action: Action) {
    self.jobs.push(Job { handle, action });
  }

  pub(crate) fn shutdown(&self) {
    self.done.store(true, Ordering::Release);
  }

  fn run(jobs: &BoundedQueue<Job>, done: &AtomicBool) {
    loop {
      if let Some(job) = jobs.wait_for_and_pop(IDLE_POP_TIMEOUT) {
        if !job.handle.is_unsubscribed() {
          let action = job.action;
          if let Err(payload) =
            panic::catch_unwind(AssertUnwindSafe(action))
          {
            log::error!(
              "scheduled action panicked: {}",
              crate::error::RxError::from_panic(payload)
            );
          }
        }
      }
      if done.load(Ordering::Acquire) {
        return;
      }
    }
  }
}

impl Drop for ThreadPoolExecutor {
  fn drop(&mut self) {
    self.shutdown();
    let mut threads = self.threads.lock().unwrap();
    for handle in threads.drain(..) {
      if !self.jobs.is_empty() {
        let _ = handle.join();
      }
      // Idle threads exit on their next timeout; dropping the handle
      // detaches them.
    }
  }
}

/// Worker over a [`ThreadPoolExecutor`]; the `lifetime` subscription is
/// what ties (or deliberately does not tie) the executor's fate to a
/// subscriber chain.
pub(crate) struct ExecutorWorker {
  executor: Arc<ThreadPoolExecutor>,
  lifetime: SharedSubscription,
}

impl ExecutorWorker {
  pub(crate) fn new(
    executor: Arc<ThreadPoolExecutor>,
    lifetime: SharedSubscription,
  ) -> Self {
    ExecutorWorker { executor, lifetime }
  }
}

impl Worker for ExecutorWorker {
  fn schedule(&self, action: Action) -> SharedSubscription {
    let handle = ScheduledHandle::new();
    self.executor.submit(handle.clone(), action);
    handle
  }

  fn schedule_periodically(
    &self,
    mut action: PeriodicAction,
    initial_delay: Duration,
    period: Duration,
    count: Option<usize>,
  ) -> SharedSubscription {
    let handle = ScheduledHandle::new();
    let loop_handle = handle.clone();
    let lifetime = self.lifetime.clone();
    let cancelled = move || {
      loop_handle.is_unsubscribed() || lifetime.is_unsubscribed()
    };
    let job = Box::new(move || {
      if cancelled() {
        return;
      }
      thread::sleep(initial_delay);
      let mut remaining = count;
      loop {
        if cancelled() {
          return;
        }
        action();
        if let Some(left) = &mut remaining {
          *left = left.saturating_sub(1);
          if *left == 0 {
            return;
          }
        }
        if cancelled() {
          return;
        }
        thread::sleep(period);
      }
    });
    self.executor.submit(handle.clone(), job);
    handle
  }

  fn subscription(&self) -> SharedSubscription {
    self.lifetime.clone()
  }
}
