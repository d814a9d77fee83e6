use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::RxError;
use crate::observable::OnSubscribe;
use crate::scheduler::Scheduler;
use crate::subscriber::SubscriberRef;
use crate::subscription::SubscriptionLike;

/// Moves the producer invocation onto a scheduler worker. The subscribing
/// thread only dispatches the job and returns; every signal of this run is
/// emitted from the worker.
pub struct SubscribeOnOnSubscribe<Item> {
  source: Arc<dyn OnSubscribe<Item>>,
  scheduler: Arc<dyn Scheduler>,
}

impl<Item> SubscribeOnOnSubscribe<Item> {
  pub(crate) fn new(
    source: Arc<dyn OnSubscribe<Item>>,
    scheduler: Arc<dyn Scheduler>,
  ) -> Self {
    SubscribeOnOnSubscribe { source, scheduler }
  }
}

impl<Item: Send + 'static> OnSubscribe<Item> for SubscribeOnOnSubscribe<Item> {
  fn call(&self, subscriber: &SubscriberRef<Item>) {
    let worker = self.scheduler.create_worker();
    // Unsubscribing the chain cancels the pending dispatch and, for an
    // exclusive worker, its thread.
    subscriber.add(worker.subscription());

    let source = self.source.clone();
    let downstream = subscriber.clone();
    let handle = worker.schedule(Box::new(move || {
      // Same boundary as a synchronous subscribe: a panicking producer
      // surfaces as an error signal instead of poisoning the worker.
      let run = panic::catch_unwind(AssertUnwindSafe(|| {
        source.call(&downstream);
      }));
      if let Err(payload) = run {
        if downstream.is_unsubscribed() {
          // Already past delivery; the worker loop logs the panic.
          panic::resume_unwind(payload);
        }
        downstream.error(RxError::from_panic(payload));
      }
    }));
    subscriber.add(handle);
  }
}

#[cfg(test)]
mod test {
  use crate::observable::from_iter;
  use crate::scheduler::SchedulersFactory;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::{Arc, Mutex};
  use std::thread;
  use std::time::Duration;

  fn wait_until(flag: &AtomicBool) {
    for _ in 0..200 {
      if flag.load(Ordering::SeqCst) {
        return;
      }
      thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for completion");
  }

  #[test]
  fn emits_from_a_worker_thread() {
    let emitter = Arc::new(Mutex::new(None));
    let completed = Arc::new(AtomicBool::new(false));
    let (emitter_c, completed_c) = (emitter.clone(), completed.clone());
    from_iter(vec![1])
      .subscribe_on(SchedulersFactory::instance().new_thread())
      .subscribe_complete(
        move |_| {
          *emitter_c.lock().unwrap() = Some(thread::current().id());
        },
        move || completed_c.store(true, Ordering::SeqCst),
      );
    wait_until(&completed);
    let emitter = emitter.lock().unwrap().expect("value delivered");
    assert_ne!(emitter, thread::current().id());
  }

  #[test]
  fn subscribe_returns_before_the_producer_runs() {
    let completed = Arc::new(AtomicBool::new(false));
    let completed_c = completed.clone();
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    from_iter(vec![1, 2, 3])
      .subscribe_on(SchedulersFactory::instance().thread_pool())
      .subscribe_complete(
        move |v| {
          thread::sleep(Duration::from_millis(20));
          out_c.lock().unwrap().push(v);
        },
        move || completed_c.store(true, Ordering::SeqCst),
      );
    // The slow consumer has not received everything yet at this point.
    wait_until(&completed);
    assert_eq!(*out.lock().unwrap(), vec![1, 2, 3]);
  }
}
