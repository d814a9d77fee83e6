//! Scheduler policy: a fixed-size shared pool of execution contexts.

use std::sync::Arc;

use crate::scheduler::{ExecutorWorker, Scheduler, ThreadPoolExecutor, Worker};
use crate::subscription::CompositeSubscription;

/// A fixed pool of threads shared by every worker this scheduler hands
/// out. Submitted actions queue until a pool thread dequeues them.
pub struct ThreadPoolScheduler {
  executor: Arc<ThreadPoolExecutor>,
}

impl ThreadPoolScheduler {
  pub fn new(pool_size: usize) -> Self {
    ThreadPoolScheduler {
      executor: Arc::new(ThreadPoolExecutor::new(pool_size)),
    }
  }
}

impl Scheduler for ThreadPoolScheduler {
  fn create_worker(&self) -> Arc<dyn Worker> {
    // Workers share the pool but each gets its own lifetime subscription:
    // a chain cancelling its worker must not tear the shared pool down,
    // nor cancel work scheduled through sibling workers.
    let lifetime = Arc::new(CompositeSubscription::new());
    Arc::new(ExecutorWorker::new(self.executor.clone(), lifetime))
  }
}
