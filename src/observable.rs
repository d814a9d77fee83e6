//! The cold, declarative pipeline description.
//!
//! An [`Observable`] wraps a shared, reusable [`OnSubscribe`] (the
//! producer logic) and offers chain-building combinators that each
//! return a new `Observable` without executing anything. Only
//! [`subscribe`](Observable::subscribe) triggers execution: it builds the
//! subscriber chain downstream-to-upstream via [`lift`](Observable::lift)
//! and then invokes the root producer synchronously on the calling
//! thread. Execution moves to other threads only when a `subscribe_on`,
//! `observe_on` or periodic source sits in the chain.

use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::RxError;
use crate::ops::all::AllOp;
use crate::ops::concat_map::ConcatMapOnSubscribe;
use crate::ops::distinct::DistinctOp;
use crate::ops::exist::ExistOp;
use crate::ops::filter::FilterOp;
use crate::ops::flat_map::FlatMapOnSubscribe;
use crate::ops::last::LastOp;
use crate::ops::map::MapOp;
use crate::ops::observe_on::ObserveOnOp;
use crate::ops::scan::ScanOp;
use crate::ops::subscribe_on::SubscribeOnOnSubscribe;
use crate::ops::take::TakeOp;
use crate::ops::take_while::TakeWhileOp;
use crate::ops::tap::TapOp;
use crate::ops::to_map::ToMapOp;
use crate::scheduler::Scheduler;
use crate::subscriber::{CallbackSubscriber, Subscriber, SubscriberRef};
use crate::subscription::{SubscriptionLike, WeakSubscription};

mod from_iter;
mod interval;
mod range;
mod repeat;
mod trivial;

pub use from_iter::{from_iter, of};
pub use interval::{interval, interval_on, timer};
pub use range::range;
pub use trivial::{empty, never, throw};

use repeat::RepeatOnSubscribe;

/// The producer logic bound to an [`Observable`]; invoked once per
/// subscription with the terminal subscriber of that run.
pub trait OnSubscribe<Item>: Send + Sync {
  fn call(&self, subscriber: &SubscriberRef<Item>);
}

impl<F, Item> OnSubscribe<Item> for F
where
  F: Fn(&SubscriberRef<Item>) + Send + Sync,
{
  #[inline]
  fn call(&self, subscriber: &SubscriberRef<Item>) {
    self(subscriber)
  }
}

/// A pure pipeline stage: given the downstream subscriber, returns the
/// subscriber handed to the upstream producer. Stateless across calls;
/// per-subscription state lives in the returned subscriber.
pub trait Operator<In, Out>: Send + Sync {
  fn call(&self, child: SubscriberRef<Out>) -> SubscriberRef<In>;
}

impl<F, In, Out> Operator<In, Out> for F
where
  F: Fn(SubscriberRef<Out>) -> SubscriberRef<In> + Send + Sync,
{
  #[inline]
  fn call(&self, child: SubscriberRef<Out>) -> SubscriberRef<In> {
    self(child)
  }
}

/// A representation of any set of values over any amount of time: the
/// basic building block of the library.
///
/// Observables are cold: creating one performs no work, and every
/// `subscribe` call is an independent execution of the producer.
pub struct Observable<Item> {
  on_subscribe: Arc<dyn OnSubscribe<Item>>,
}

impl<Item> Clone for Observable<Item> {
  fn clone(&self) -> Self {
    Observable {
      on_subscribe: self.on_subscribe.clone(),
    }
  }
}

impl<Item: 'static> Observable<Item> {
  /// Wraps an existing producer.
  pub fn new(on_subscribe: Arc<dyn OnSubscribe<Item>>) -> Self {
    Observable { on_subscribe }
  }

  /// Builds an observable from a producer function. The function is
  /// called on every subscription with the subscriber to which values can
  /// be `next`ed, an `error` raised, or `complete` signaled.
  pub fn create<F>(producer: F) -> Self
  where
    F: Fn(&SubscriberRef<Item>) + Send + Sync + 'static,
  {
    Observable {
      on_subscribe: Arc::new(producer),
    }
  }

  pub(crate) fn on_subscribe(&self) -> &Arc<dyn OnSubscribe<Item>> {
    &self.on_subscribe
  }

  // ---------------------------------------------------------------------
  // Chain construction
  // ---------------------------------------------------------------------

  /// Composes a new observable whose producer first adapts the terminal
  /// subscriber through `operator`, then invokes this observable's
  /// producer with the adapted subscriber. The subscriber chain is built
  /// downstream-to-upstream; data later flows the other way.
  pub fn lift<Out: 'static>(
    &self,
    operator: impl Operator<Item, Out> + 'static,
  ) -> Observable<Out> {
    let source = self.on_subscribe.clone();
    let operator = Arc::new(operator);
    Observable::create(move |subscriber: &SubscriberRef<Out>| {
      let upstream = operator.call(subscriber.clone());
      source.call(&upstream);
    })
  }

  /// Calls a closure on each value and passes its return downstream.
  pub fn map<Out, F>(&self, f: F) -> Observable<Out>
  where
    Out: 'static,
    F: Fn(Item) -> Out + Send + Sync + 'static,
  {
    self.lift(MapOp::new(f))
  }

  /// Passes through only the values satisfying the predicate.
  pub fn filter<F>(&self, predicate: F) -> Observable<Item>
  where
    F: Fn(&Item) -> bool + Send + Sync + 'static,
  {
    self.lift(FilterOp::new(predicate))
  }

  /// Suppresses values whose key has been seen before.
  pub fn distinct_by<K, F>(&self, key_fn: F) -> Observable<Item>
  where
    K: Eq + Hash + Send + 'static,
    F: Fn(&Item) -> K + Send + Sync + 'static,
  {
    self.lift(DistinctOp::new(key_fn))
  }

  /// Suppresses duplicate values.
  pub fn distinct(&self) -> Observable<Item>
  where
    Item: Clone + Eq + Hash + Send + 'static,
  {
    self.distinct_by(|v| v.clone())
  }

  /// Passes through the first `count` values, then completes.
  pub fn take(&self, count: usize) -> Observable<Item> {
    self.lift(TakeOp::new(count))
  }

  /// Passes values through while the predicate holds, then completes.
  pub fn take_while<F>(&self, predicate: F) -> Observable<Item>
  where
    F: Fn(&Item) -> bool + Send + Sync + 'static,
  {
    self.lift(TakeWhileOp::new(predicate))
  }

  /// Emits every intermediate accumulation, starting from `seed`.
  pub fn scan_initial<Out, F>(&self, seed: Out, f: F) -> Observable<Out>
  where
    Out: Clone + Send + Sync + 'static,
    F: Fn(Out, Item) -> Out + Send + Sync + 'static,
  {
    self.lift(ScanOp::with_seed(seed, f))
  }

  /// Like [`scan_initial`](Observable::scan_initial) but the first value
  /// seeds the accumulation and is emitted unchanged.
  pub fn scan<F>(&self, f: F) -> Observable<Item>
  where
    Item: Clone + Send + Sync + 'static,
    F: Fn(Item, Item) -> Item + Send + Sync + 'static,
  {
    self.lift(ScanOp::without_seed(f))
  }

  /// Emits only the final accumulation, when the source completes.
  pub fn reduce<F>(&self, f: F) -> Observable<Item>
  where
    Item: Clone + Send + Sync + 'static,
    F: Fn(Item, Item) -> Item + Send + Sync + 'static,
  {
    self.scan(f).last()
  }

  /// Emits only the last value of the source, when it completes.
  pub fn last(&self) -> Observable<Item>
  where
    Item: Send + 'static,
  {
    self.lift(LastOp::new())
  }

  /// Emits a single `bool`: whether every value satisfied the predicate.
  pub fn all<F>(&self, predicate: F) -> Observable<bool>
  where
    F: Fn(&Item) -> bool + Send + Sync + 'static,
  {
    self.lift(AllOp::new(predicate))
  }

  /// Emits a single `bool`: whether any value satisfied the predicate.
  pub fn exist<F>(&self, predicate: F) -> Observable<bool>
  where
    F: Fn(&Item) -> bool + Send + Sync + 'static,
  {
    self.lift(ExistOp::new(predicate))
  }

  /// Collects the sequence into a map keyed by `key_fn`; emits the map
  /// once, on completion. Later values win on key conflicts.
  pub fn to_map<K, FK>(&self, key_fn: FK) -> Observable<HashMap<K, Item>>
  where
    Item: Clone + Send + 'static,
    K: Eq + Hash + Send + 'static,
    FK: Fn(&Item) -> K + Send + Sync + 'static,
  {
    self.to_map_kv(key_fn, |v: &Item| v.clone())
  }

  /// Like [`to_map`](Observable::to_map) with a value selector.
  pub fn to_map_kv<K, V, FK, FV>(
    &self,
    key_fn: FK,
    value_fn: FV,
  ) -> Observable<HashMap<K, V>>
  where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
    FK: Fn(&Item) -> K + Send + Sync + 'static,
    FV: Fn(&Item) -> V + Send + Sync + 'static,
  {
    self.lift(ToMapOp::new(key_fn, value_fn, None))
  }

  /// Like [`to_map_kv`](Observable::to_map_kv), resolving key conflicts
  /// through `resolve(existing, incoming)`.
  pub fn to_map_resolve<K, V, FK, FV, FR>(
    &self,
    key_fn: FK,
    value_fn: FV,
    resolve: FR,
  ) -> Observable<HashMap<K, V>>
  where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
    FK: Fn(&Item) -> K + Send + Sync + 'static,
    FV: Fn(&Item) -> V + Send + Sync + 'static,
    FR: Fn(V, V) -> V + Send + Sync + 'static,
  {
    self.lift(ToMapOp::new(key_fn, value_fn, Some(Box::new(resolve))))
  }

  /// Runs side effects on each signal without altering the sequence.
  pub fn tap<FN, FE, FC>(
    &self,
    on_next: FN,
    on_error: FE,
    on_complete: FC,
  ) -> Observable<Item>
  where
    FN: Fn(&Item) + Send + Sync + 'static,
    FE: Fn(&RxError) + Send + Sync + 'static,
    FC: Fn() + Send + Sync + 'static,
  {
    self.lift(TapOp::new(on_next, on_error, on_complete))
  }

  /// Side effect on each value.
  pub fn do_on_next<F>(&self, f: F) -> Observable<Item>
  where
    F: Fn(&Item) + Send + Sync + 'static,
  {
    self.tap(f, |_| {}, || {})
  }

  /// Side effect on the terminal error.
  pub fn do_on_error<F>(&self, f: F) -> Observable<Item>
  where
    F: Fn(&RxError) + Send + Sync + 'static,
  {
    self.tap(|_| {}, f, || {})
  }

  /// Side effect on completion.
  pub fn do_on_completed<F>(&self, f: F) -> Observable<Item>
  where
    F: Fn() + Send + Sync + 'static,
  {
    self.tap(|_| {}, |_| {}, f)
  }

  /// Re-subscribes the source `count` times in a row (`0` repeats
  /// forever); completes after the last run, stops early on error or
  /// unsubscription.
  pub fn repeat(&self, count: usize) -> Observable<Item>
  where
    Item: Send + 'static,
  {
    Observable::new(Arc::new(RepeatOnSubscribe::new(
      self.on_subscribe.clone(),
      count,
    )))
  }

  /// Moves the invocation of the producer, and hence its emissions, to
  /// a worker of `scheduler`; `subscribe` returns immediately.
  pub fn subscribe_on(
    &self,
    scheduler: Arc<dyn Scheduler>,
  ) -> Observable<Item>
  where
    Item: Send + 'static,
  {
    Observable::new(Arc::new(SubscribeOnOnSubscribe::new(
      self.on_subscribe.clone(),
      scheduler,
    )))
  }

  /// Moves consumption of the emissions to a worker of `scheduler`,
  /// decoupling producer and consumer thread identity through an
  /// effectively unbounded hand-off buffer.
  pub fn observe_on(&self, scheduler: Arc<dyn Scheduler>) -> Observable<Item>
  where
    Item: Send + 'static,
  {
    self.observe_on_with_buffer(scheduler, usize::MAX)
  }

  /// Like [`observe_on`](Observable::observe_on) with an explicit buffer
  /// capacity. A producer overrunning the buffer fails the stream with
  /// [`RxError::SlowSubscriber`] instead of blocking or dropping.
  pub fn observe_on_with_buffer(
    &self,
    scheduler: Arc<dyn Scheduler>,
    buffer_size: usize,
  ) -> Observable<Item>
  where
    Item: Send + 'static,
  {
    self.lift(ObserveOnOp::new(scheduler, buffer_size))
  }

  /// Maps each value to an inner observable and subscribes to them one at
  /// a time in arrival order, preserving upstream order in the output.
  pub fn concat_map<Out, F>(&self, mapper: F) -> Observable<Out>
  where
    Item: Send + 'static,
    Out: 'static,
    F: Fn(Item) -> Observable<Out> + Send + Sync + 'static,
  {
    Observable::new(Arc::new(ConcatMapOnSubscribe::new(
      self.on_subscribe.clone(),
      mapper,
    )))
  }

  /// Maps each value to an inner observable and subscribes to all of them
  /// immediately; output order across inners is not guaranteed.
  pub fn flat_map<Out, F>(&self, mapper: F) -> Observable<Out>
  where
    Item: Send + 'static,
    Out: 'static,
    F: Fn(Item) -> Observable<Out> + Send + Sync + 'static,
  {
    Observable::new(Arc::new(FlatMapOnSubscribe::new(
      self.on_subscribe.clone(),
      mapper,
    )))
  }

  // ---------------------------------------------------------------------
  // Termination
  // ---------------------------------------------------------------------

  /// Subscribes with a value callback. A delivered error panics on the
  /// delivering thread (see [`CallbackSubscriber`]).
  pub fn subscribe<FN>(&self, next: FN) -> WeakSubscription
  where
    FN: Fn(Item) + Send + Sync + 'static,
  {
    self.do_subscribe(Arc::new(CallbackSubscriber::new(
      Box::new(next),
      None,
      None,
    )))
  }

  /// Subscribes with value and error callbacks.
  pub fn subscribe_err<FN, FE>(&self, next: FN, error: FE) -> WeakSubscription
  where
    FN: Fn(Item) + Send + Sync + 'static,
    FE: Fn(RxError) + Send + Sync + 'static,
  {
    self.do_subscribe(Arc::new(CallbackSubscriber::new(
      Box::new(next),
      Some(Box::new(error)),
      None,
    )))
  }

  /// Subscribes with value and completion callbacks.
  pub fn subscribe_complete<FN, FC>(
    &self,
    next: FN,
    complete: FC,
  ) -> WeakSubscription
  where
    FN: Fn(Item) + Send + Sync + 'static,
    FC: Fn() + Send + Sync + 'static,
  {
    self.do_subscribe(Arc::new(CallbackSubscriber::new(
      Box::new(next),
      None,
      Some(Box::new(complete)),
    )))
  }

  /// Subscribes with all three callbacks.
  pub fn subscribe_all<FN, FE, FC>(
    &self,
    next: FN,
    error: FE,
    complete: FC,
  ) -> WeakSubscription
  where
    FN: Fn(Item) + Send + Sync + 'static,
    FE: Fn(RxError) + Send + Sync + 'static,
    FC: Fn() + Send + Sync + 'static,
  {
    self.do_subscribe(Arc::new(CallbackSubscriber::new(
      Box::new(next),
      Some(Box::new(error)),
      Some(Box::new(complete)),
    )))
  }

  /// Subscribes an explicit subscriber object.
  pub fn subscribe_with<S>(&self, subscriber: Arc<S>) -> WeakSubscription
  where
    S: Subscriber<Item> + 'static,
  {
    self.do_subscribe(subscriber)
  }

  fn do_subscribe<S>(&self, subscriber: Arc<S>) -> WeakSubscription
  where
    S: Subscriber<Item> + 'static,
  {
    let handle = WeakSubscription::of(&subscriber);
    subscriber.on_start();
    let subscriber: SubscriberRef<Item> = subscriber;
    // The producer boundary: a panicking producer must not unwind into
    // the caller without attribution.
    let run = panic::catch_unwind(AssertUnwindSafe(|| {
      self.on_subscribe.call(&subscriber)
    }));
    if let Err(payload) = run {
      // A panic reaching a terminated subscriber is not a producer
      // failure to report but a rethrow already past delivery (an
      // unhandled error, or a panic after the terminal signal); let it
      // keep unwinding.
      if subscriber.is_unsubscribed() {
        panic::resume_unwind(payload);
      }
      subscriber.error(RxError::from_panic(payload));
    }
    handle
  }
}

/// Subscribes the given observables one after another, in order.
pub fn concat<Item>(
  sources: impl IntoIterator<Item = Observable<Item>> + Clone + Send + Sync + 'static,
) -> Observable<Item>
where
  Item: Send + 'static,
{
  from_iter(sources).concat_map(|o| o)
}

/// Subscribes the given observables all at once, interleaving output.
pub fn merge<Item>(
  sources: impl IntoIterator<Item = Observable<Item>> + Clone + Send + Sync + 'static,
) -> Observable<Item>
where
  Item: Send + 'static,
{
  from_iter(sources).flat_map(|o| o)
}

/// Builds a fresh observable from the factory for every subscription,
/// deferring all producer state to subscribe time.
pub fn defer<Item, F>(factory: F) -> Observable<Item>
where
  Item: 'static,
  F: Fn() -> Observable<Item> + Send + Sync + 'static,
{
  Observable::create(move |subscriber: &SubscriberRef<Item>| {
    let observable = factory();
    observable.on_subscribe().call(subscriber);
  })
}

#[cfg(test)]
mod test {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  #[test]
  fn create_and_subscribe() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    Observable::create(|s: &SubscriberRef<i32>| {
      s.next(1);
      s.next(2);
      s.next(3);
      s.complete();
      s.next(4);
      s.error(RxError::msg("never dispatched"));
    })
    .subscribe_all(
      move |v| out_c.lock().unwrap().push(v),
      |_| panic!("no error expected"),
      || {},
    );
    assert_eq!(*out.lock().unwrap(), vec![1, 2, 3]);
  }

  #[test]
  fn cold_observable_replays_per_subscription() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_c = calls.clone();
    let o = Observable::create(move |s: &SubscriberRef<usize>| {
      s.next(calls_c.fetch_add(1, Ordering::SeqCst));
      s.complete();
    });
    o.subscribe(|_| {});
    o.subscribe(|_| {});
    o.subscribe(|_| {});
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn composing_operators_runs_nothing() {
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_c = ran.clone();
    let o = Observable::create(move |s: &SubscriberRef<i32>| {
      ran_c.fetch_add(1, Ordering::SeqCst);
      s.complete();
    });
    let _chained = o.map(|v| v * 2).filter(|v| *v > 0).take(1);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn lift_with_custom_operator() {
    // A hand-written pass-through stage built directly on `lift`.
    struct Double;
    impl Operator<i32, i32> for Double {
      fn call(&self, child: SubscriberRef<i32>) -> SubscriberRef<i32> {
        Arc::new(crate::ops::map::MapSubscriber::new(
          child,
          Arc::new(|v: i32| v * 2),
        ))
      }
    }

    let sum = Arc::new(AtomicUsize::new(0));
    let sum_c = sum.clone();
    from_iter(1..=3).lift(Double).subscribe(move |v| {
      sum_c.fetch_add(v as usize, Ordering::SeqCst);
    });
    assert_eq!(sum.load(Ordering::SeqCst), 12);
  }

  #[test]
  fn panicking_producer_becomes_an_error() {
    let caught = Arc::new(Mutex::new(None));
    let caught_c = caught.clone();
    Observable::create(|_s: &SubscriberRef<i32>| {
      panic!("producer exploded");
    })
    .subscribe_err(|_| {}, move |err| {
      *caught_c.lock().unwrap() = Some(err.to_string());
    });
    assert_eq!(
      caught.lock().unwrap().as_deref(),
      Some("producer panicked: producer exploded")
    );
  }

  #[test]
  #[should_panic(expected = "unhandled observable error")]
  fn unhandled_error_panics_the_delivering_thread() {
    throw::<i32>(RxError::msg("boom")).subscribe(|_| {});
  }

  #[test]
  fn producer_error_after_value() {
    #[derive(Debug, PartialEq)]
    struct Marker(i32);
    impl std::fmt::Display for Marker {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker {}", self.0)
      }
    }
    impl std::error::Error for Marker {}

    let values = Arc::new(Mutex::new(Vec::new()));
    let payload = Arc::new(Mutex::new(None));
    let (values_c, payload_c) = (values.clone(), payload.clone());
    Observable::create(|s: &SubscriberRef<i32>| {
      s.next(10);
      s.error(RxError::custom(Marker(7)));
    })
    .subscribe_err(
      move |v| values_c.lock().unwrap().push(v),
      move |err| {
        *payload_c.lock().unwrap() =
          err.downcast_ref::<Marker>().map(|m| m.0);
      },
    );
    assert_eq!(*values.lock().unwrap(), vec![10]);
    assert_eq!(*payload.lock().unwrap(), Some(7));
  }

  #[test]
  fn defer_runs_the_factory_per_subscription() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_c = counter.clone();
    let o = defer(move || of(counter_c.fetch_add(1, Ordering::SeqCst) + 1));
    let collect = |o: &Observable<usize>| {
      let out = Arc::new(Mutex::new(Vec::new()));
      let out_c = out.clone();
      o.subscribe(move |v| out_c.lock().unwrap().push(v));
      let v = out.lock().unwrap().clone();
      v
    };
    assert_eq!(collect(&o), vec![1]);
    assert_eq!(collect(&o), vec![2]);
    assert_eq!(collect(&o), vec![3]);
  }

  #[test]
  fn concat_preserves_order() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    concat(vec![from_iter(vec![1, 2]), from_iter(vec![3, 4])])
      .subscribe(move |v| out_c.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![1, 2, 3, 4]);
  }

  #[test]
  fn merge_delivers_everything() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    merge(vec![from_iter(vec![1, 2]), from_iter(vec![3, 4])])
      .subscribe(move |v| out_c.lock().unwrap().push(v));
    let mut got = out.lock().unwrap().clone();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2, 3, 4]);
  }

  #[test]
  fn take_cancels_the_upstream_producer() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    let seen = Arc::new(Mutex::new(None));
    let seen_c = seen.clone();
    let o = Observable::create(move |s: &SubscriberRef<i32>| {
      let mut i = 0;
      while !s.is_unsubscribed() {
        i += 1;
        s.next(i);
      }
      *seen_c.lock().unwrap() = Some(i);
    });
    // take() cancels upstream after the third value; the producer loop
    // must observe it promptly.
    o.take(3)
      .subscribe(move |v| out_c.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(*seen.lock().unwrap(), Some(3));
  }
}
