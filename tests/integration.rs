//! End-to-end tests: operator chains, scheduler hops, cancellation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use minirx::prelude::*;

fn wait_until(flag: &AtomicBool) {
  for _ in 0..600 {
    if flag.load(Ordering::SeqCst) {
      return;
    }
    thread::sleep(Duration::from_millis(5));
  }
  panic!("timed out waiting for the stream to finish");
}

fn collect<Item: Send + Clone + 'static>(
  o: &Observable<Item>,
) -> (Vec<Item>, bool) {
  let out = Arc::new(Mutex::new(Vec::new()));
  let completed = Arc::new(AtomicBool::new(false));
  let (out_c, completed_c) = (out.clone(), completed.clone());
  o.subscribe_complete(
    move |v| out_c.lock().unwrap().push(v),
    move || completed_c.store(true, Ordering::SeqCst),
  );
  let values = out.lock().unwrap().clone();
  (values, completed.load(Ordering::SeqCst))
}

#[test]
fn basic_chain() {
  let o = observable::from_iter(1..=10)
    .map(|x| x * 2)
    .filter(|&x| x > 10)
    .take(3);
  assert_eq!(collect(&o), (vec![12, 14, 16], true));
}

#[test]
fn complex_chain_with_multiple_operators() {
  // Even numbers: 2, 4, ..., 20
  // Squares: 4, 16, 36, 64, 100, ...
  // Running sums: 4, 20, 56, 120, ...
  // take_while < 100 leaves 4, 20, 56
  let o = observable::from_iter(1..=20)
    .filter(|&x| x % 2 == 0)
    .map(|x| x * x)
    .scan_initial(0, |acc, v| acc + v)
    .take_while(|&x| x < 100);
  assert_eq!(collect(&o), (vec![4, 20, 56], true));
}

#[test]
fn repeat_then_aggregate() {
  let o = observable::range(0i32, 3).repeat(2);
  assert_eq!(collect(&o), (vec![0, 1, 2, 0, 1, 2], true));

  let o = observable::range(1i64, 4).repeat(3).reduce(|a, b| a + b);
  assert_eq!(collect(&o), (vec![30], true));
}

#[test]
fn concat_map_preserves_upstream_order() {
  let o = observable::from_iter(vec![100, 1000])
    .concat_map(|v| observable::from_iter(vec![v, 2 * v]));
  assert_eq!(collect(&o), (vec![100, 200, 1000, 2000], true));
}

#[test]
fn concat_map_serializes_asynchronous_inners() {
  // Inners run on pool workers with inverted delays; concat_map must
  // still deliver them in arrival order, one inner at a time.
  let out = Arc::new(Mutex::new(Vec::new()));
  let done = Arc::new(AtomicBool::new(false));
  let (out_c, done_c) = (out.clone(), done.clone());

  observable::from_iter(vec![30u64, 10, 0])
    .concat_map(|delay| {
      observable::of(delay)
        .do_on_next(move |d| thread::sleep(Duration::from_millis(*d)))
        .subscribe_on(SchedulersFactory::instance().thread_pool())
    })
    .subscribe_complete(
      move |v| out_c.lock().unwrap().push(v),
      move || done_c.store(true, Ordering::SeqCst),
    );

  wait_until(&done);
  assert_eq!(*out.lock().unwrap(), vec![30, 10, 0]);
}

#[test]
fn flat_map_interleaves_but_loses_nothing() {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let done = Arc::new(AtomicBool::new(false));
  let (seen_c, done_c) = (seen.clone(), done.clone());

  observable::from_iter(0u64..8)
    .flat_map(|v| {
      observable::of(v)
        .subscribe_on(SchedulersFactory::instance().thread_pool())
    })
    .subscribe_complete(
      move |v| seen_c.lock().unwrap().push(v),
      move || done_c.store(true, Ordering::SeqCst),
    );

  wait_until(&done);
  let mut seen = seen.lock().unwrap().clone();
  seen.sort_unstable();
  assert_eq!(seen, (0u64..8).collect::<Vec<_>>());
}

#[test]
fn subscribe_on_and_observe_on_split_the_pipeline() {
  let emit_thread = Arc::new(Mutex::new(None));
  let observe_thread = Arc::new(Mutex::new(None));
  let done = Arc::new(AtomicBool::new(false));
  let (emit_c, observe_c, done_c) =
    (emit_thread.clone(), observe_thread.clone(), done.clone());

  Observable::create(move |s: &SubscriberRef<i32>| {
    *emit_c.lock().unwrap() = Some(thread::current().id());
    s.next(1);
    s.complete();
  })
  .subscribe_on(SchedulersFactory::instance().new_thread())
  .observe_on(SchedulersFactory::instance().new_thread())
  .subscribe_complete(
    move |_| {
      *observe_c.lock().unwrap() = Some(thread::current().id());
    },
    move || done_c.store(true, Ordering::SeqCst),
  );

  wait_until(&done);
  let emitter = emit_thread.lock().unwrap().expect("producer ran");
  let observer = observe_thread.lock().unwrap().expect("value observed");
  assert_ne!(emitter, thread::current().id());
  assert_ne!(observer, thread::current().id());
  assert_ne!(emitter, observer);
}

#[test]
fn interval_take_completes() {
  let ticks = Arc::new(Mutex::new(Vec::new()));
  let done = Arc::new(AtomicBool::new(false));
  let (ticks_c, done_c) = (ticks.clone(), done.clone());

  observable::interval(Duration::from_millis(10), Duration::from_millis(10))
    .take(5)
    .subscribe_complete(
      move |v| ticks_c.lock().unwrap().push(v),
      move || done_c.store(true, Ordering::SeqCst),
    );

  wait_until(&done);
  assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn error_payload_survives_the_thread_hop() {
  #[derive(Debug, PartialEq)]
  struct DeviceOffline {
    code: u32,
  }
  impl std::fmt::Display for DeviceOffline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      write!(f, "device offline (code {})", self.code)
    }
  }
  impl std::error::Error for DeviceOffline {}

  let code = Arc::new(AtomicUsize::new(0));
  let failed = Arc::new(AtomicBool::new(false));
  let (code_c, failed_c) = (code.clone(), failed.clone());

  observable::throw::<i32>(RxError::custom(DeviceOffline { code: 503 }))
    .observe_on(SchedulersFactory::instance().new_thread())
    .subscribe_err(|_| {}, move |err| {
      if let Some(payload) = err.downcast_ref::<DeviceOffline>() {
        code_c.store(payload.code as usize, Ordering::SeqCst);
      }
      failed_c.store(true, Ordering::SeqCst);
    });

  wait_until(&failed);
  assert_eq!(code.load(Ordering::SeqCst), 503);
}

#[test]
fn defer_builds_a_fresh_source_per_subscription() {
  let counter = Arc::new(AtomicUsize::new(0));
  let counter_c = counter.clone();
  let o = observable::defer(move || {
    observable::of(counter_c.fetch_add(1, Ordering::SeqCst) + 1)
  });
  assert_eq!(collect(&o), (vec![1], true));
  assert_eq!(collect(&o), (vec![2], true));
  assert_eq!(collect(&o), (vec![3], true));
}

#[test]
fn unsubscribe_is_idempotent_across_threads() {
  let sub =
    observable::interval(Duration::from_millis(5), Duration::from_millis(5))
      .subscribe(|_| {});
  let sub2 = sub.clone();
  let t = thread::spawn(move || {
    for _ in 0..100 {
      sub2.unsubscribe();
    }
  });
  for _ in 0..100 {
    sub.unsubscribe();
  }
  t.join().unwrap();
  assert!(sub.is_unsubscribed());
}

#[test]
fn guard_cancels_at_scope_exit() {
  let count = Arc::new(AtomicUsize::new(0));
  let count_c = count.clone();
  {
    let _guard = observable::interval(
      Duration::from_millis(10),
      Duration::from_millis(10),
    )
      .subscribe(move |_| {
        count_c.fetch_add(1, Ordering::SeqCst);
      })
      .unsubscribe_when_dropped();
    thread::sleep(Duration::from_millis(50));
  }
  thread::sleep(Duration::from_millis(30));
  let after = count.load(Ordering::SeqCst);
  thread::sleep(Duration::from_millis(50));
  assert_eq!(count.load(Ordering::SeqCst), after);
}

#[test]
fn merge_collects_from_concurrent_sources() {
  let seen = Arc::new(Mutex::new(HashSet::new()));
  let done = Arc::new(AtomicBool::new(false));
  let (seen_c, done_c) = (seen.clone(), done.clone());

  let sources: Vec<Observable<i32>> = (0..4)
    .map(|base| {
      observable::range(base * 10, 3)
        .subscribe_on(SchedulersFactory::instance().thread_pool())
    })
    .collect();

  observable::merge(sources).subscribe_complete(
    move |v| {
      seen_c.lock().unwrap().insert(v);
    },
    move || done_c.store(true, Ordering::SeqCst),
  );

  wait_until(&done);
  let expected: HashSet<i32> =
    (0..4).flat_map(|b| (b * 10)..(b * 10 + 3)).collect();
  assert_eq!(*seen.lock().unwrap(), expected);
}

#[test]
fn to_map_across_a_chain() {
  let o = observable::from_iter(vec![
    ("alpha", 1),
    ("beta", 2),
    ("alpha", 3),
  ])
  .to_map_resolve(|(k, _)| *k, |(_, v)| *v, |a, b| a + b);
  let (maps, completed) = collect(&o);
  assert!(completed);
  assert_eq!(maps.len(), 1);
  assert_eq!(maps[0].get("alpha"), Some(&4));
  assert_eq!(maps[0].get("beta"), Some(&2));
}
