use std::sync::Arc;

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct MapOp<In, Out> {
  f: Arc<dyn Fn(In) -> Out + Send + Sync>,
}

impl<In, Out> MapOp<In, Out> {
  pub(crate) fn new(f: impl Fn(In) -> Out + Send + Sync + 'static) -> Self {
    MapOp { f: Arc::new(f) }
  }
}

impl<In: 'static, Out: 'static> Operator<In, Out> for MapOp<In, Out> {
  fn call(&self, child: SubscriberRef<Out>) -> SubscriberRef<In> {
    Arc::new(MapSubscriber::new(child, self.f.clone()))
  }
}

pub(crate) struct MapSubscriber<In, Out> {
  child: SubscriberRef<Out>,
  f: Arc<dyn Fn(In) -> Out + Send + Sync>,
}

impl<In, Out> MapSubscriber<In, Out> {
  pub(crate) fn new(
    child: SubscriberRef<Out>,
    f: Arc<dyn Fn(In) -> Out + Send + Sync>,
  ) -> Self {
    MapSubscriber { child, f }
  }
}

impl<In: 'static, Out: 'static> Observer<In> for MapSubscriber<In, Out> {
  fn next(&self, value: In) {
    self.child.next((self.f)(value));
  }

  fn error(&self, err: RxError) {
    self.child.error(err);
  }

  fn complete(&self) {
    self.child.complete();
  }
}

impl<In, Out> SubscriptionLike for MapSubscriber<In, Out> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<In: 'static, Out: 'static> Subscriber<In> for MapSubscriber<In, Out> {
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}

#[cfg(test)]
mod test {
  use crate::observable::from_iter;
  use bencher::{benchmark_group, Bencher};
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  #[test]
  fn maps_every_value() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    from_iter(vec![1, 2, 3])
      .map(|v| v * 10)
      .subscribe(move |v| out_c.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![10, 20, 30]);
  }

  #[test]
  fn changes_the_item_type() {
    let lens = Arc::new(AtomicUsize::new(0));
    let lens_c = lens.clone();
    from_iter(vec!["a", "bb", "ccc"])
      .map(|s| s.len())
      .subscribe(move |n| {
        lens_c.fetch_add(n, Ordering::SeqCst);
      });
    assert_eq!(lens.load(Ordering::SeqCst), 6);
  }

  #[test]
  fn bench() {
    do_bench();
  }

  benchmark_group!(do_bench, bench_map);

  fn bench_map(b: &mut Bencher) {
    b.iter(|| {
      let sum = Arc::new(AtomicUsize::new(0));
      let sum_c = sum.clone();
      from_iter(0..1000usize).map(|v| v * 2).subscribe(move |v| {
        sum_c.fetch_add(v, Ordering::Relaxed);
      });
    });
  }
}
