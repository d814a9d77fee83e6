//! The concurrency abstraction: where code runs.
//!
//! A [`Scheduler`] creates [`Worker`]s; a worker owns one execution
//! context (a dedicated thread, or a slot of a shared pool) and accepts
//! units of work. Every submission returns a [`SharedSubscription`] so a
//! not-yet-started action can be cancelled best-effort, and a running
//! periodic action can observe cancellation cooperatively.

use std::sync::Arc;
use std::time::Duration;

use crate::subscription::SharedSubscription;

mod executor;
mod factory;
mod new_thread_scheduler;
mod thread_pool_scheduler;

pub use factory::SchedulersFactory;
pub use new_thread_scheduler::NewThreadScheduler;
pub use thread_pool_scheduler::ThreadPoolScheduler;

pub(crate) use executor::{ExecutorWorker, ThreadPoolExecutor};

/// A one-shot unit of work.
pub type Action = Box<dyn FnOnce() + Send>;

/// A repeatedly invoked unit of work.
pub type PeriodicAction = Box<dyn FnMut() + Send>;

/// Orders tasks and schedules their execution on some execution context.
pub trait Scheduler: Send + Sync {
  fn create_worker(&self) -> Arc<dyn Worker>;
}

/// One execution context of a scheduler.
pub trait Worker: Send + Sync {
  /// Submits an action for asynchronous execution. Unsubscribing the
  /// returned handle prevents the action from running if it has not
  /// started yet.
  fn schedule(&self, action: Action) -> SharedSubscription;

  /// Runs `action` repeatedly: after `initial_delay`, then every `period`,
  /// `count` times (`None` for unbounded). Cancellation is observed
  /// before each sleep and before each invocation.
  fn schedule_periodically(
    &self,
    action: PeriodicAction,
    initial_delay: Duration,
    period: Duration,
    count: Option<usize>,
  ) -> SharedSubscription;

  /// The worker's liveness subscription. While it is registered somewhere,
  /// the worker's execution context stays alive; unsubscribing it shuts an
  /// exclusive worker down.
  fn subscription(&self) -> SharedSubscription;
}
