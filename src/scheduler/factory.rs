//! Process-wide shared scheduler instances.

use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;
use std::thread;

use crate::scheduler::{NewThreadScheduler, Scheduler, ThreadPoolScheduler};

static INSTANCE: Lazy<SchedulersFactory> = Lazy::new(SchedulersFactory::new);

/// Lazily-initialized registry of the shared schedulers. Each instance is
/// constructed exactly once and lives for the process lifetime.
pub struct SchedulersFactory {
  new_thread: OnceCell<Arc<NewThreadScheduler>>,
  thread_pool: OnceCell<Arc<ThreadPoolScheduler>>,
}

impl SchedulersFactory {
  fn new() -> Self {
    SchedulersFactory {
      new_thread: OnceCell::new(),
      thread_pool: OnceCell::new(),
    }
  }

  pub fn instance() -> &'static SchedulersFactory {
    &INSTANCE
  }

  /// The shared new-thread scheduler: every worker gets a dedicated
  /// thread.
  pub fn new_thread(&self) -> Arc<dyn Scheduler> {
    self
      .new_thread
      .get_or_init(|| Arc::new(NewThreadScheduler::new()))
      .clone()
  }

  /// The shared thread-pool scheduler, sized at twice the available
  /// hardware concurrency.
  pub fn thread_pool(&self) -> Arc<dyn Scheduler> {
    self
      .thread_pool
      .get_or_init(|| {
        let parallelism = thread::available_parallelism()
          .map(|n| n.get())
          .unwrap_or(1);
        Arc::new(ThreadPoolScheduler::new(parallelism * 2))
      })
      .clone()
  }
}
