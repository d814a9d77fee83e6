//! Scheduler policy: one dedicated execution context per worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::scheduler::{ExecutorWorker, Scheduler, ThreadPoolExecutor, Worker};
use crate::subscription::SubscriptionLike;

/// Creates an exclusive single-thread worker for every `create_worker`
/// call. Low overhead to create; correctness over efficiency.
#[derive(Default)]
pub struct NewThreadScheduler;

impl NewThreadScheduler {
  pub fn new() -> Self {
    NewThreadScheduler
  }
}

impl Scheduler for NewThreadScheduler {
  fn create_worker(&self) -> Arc<dyn Worker> {
    let executor = Arc::new(ThreadPoolExecutor::new(1));
    let lifetime = Arc::new(WorkerLifetime {
      executor: executor.clone(),
      unsubscribed: AtomicBool::new(false),
    });
    Arc::new(ExecutorWorker::new(executor, lifetime))
  }
}

/// Liveness of an exclusive worker: it owns the executor, so registering
/// this subscription into a subscriber chain keeps the worker thread
/// alive, and unsubscribing shuts it down.
struct WorkerLifetime {
  executor: Arc<ThreadPoolExecutor>,
  unsubscribed: AtomicBool,
}

impl SubscriptionLike for WorkerLifetime {
  fn is_unsubscribed(&self) -> bool {
    self.unsubscribed.load(Ordering::Acquire)
  }

  fn unsubscribe(&self) {
    if !self.unsubscribed.swap(true, Ordering::AcqRel) {
      self.executor.shutdown();
    }
  }
}
