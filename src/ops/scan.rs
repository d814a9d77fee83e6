use std::sync::{Arc, Mutex};

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

type InitFn<In, Out> = Arc<dyn Fn(In) -> Out + Send + Sync>;

/// How the accumulation starts: an explicit seed, or the first value of
/// the sequence converted by `InitFn`.
enum Seed<In, Out> {
  Value(Out),
  FirstItem(InitFn<In, Out>),
}

impl<In, Out: Clone> Seed<In, Out> {
  fn clone_for_subscription(&self) -> Seed<In, Out> {
    match self {
      Seed::Value(v) => Seed::Value(v.clone()),
      Seed::FirstItem(f) => Seed::FirstItem(f.clone()),
    }
  }
}

pub struct ScanOp<In, Out> {
  seed: Seed<In, Out>,
  f: Arc<dyn Fn(Out, In) -> Out + Send + Sync>,
}

impl<In, Out> ScanOp<In, Out> {
  pub(crate) fn with_seed(
    seed: Out,
    f: impl Fn(Out, In) -> Out + Send + Sync + 'static,
  ) -> Self {
    ScanOp {
      seed: Seed::Value(seed),
      f: Arc::new(f),
    }
  }
}

impl<Item> ScanOp<Item, Item> {
  pub(crate) fn without_seed(
    f: impl Fn(Item, Item) -> Item + Send + Sync + 'static,
  ) -> Self {
    ScanOp {
      seed: Seed::FirstItem(Arc::new(|first| first)),
      f: Arc::new(f),
    }
  }
}

impl<In, Out> Operator<In, Out> for ScanOp<In, Out>
where
  In: 'static,
  Out: Clone + Send + Sync + 'static,
{
  fn call(&self, child: SubscriberRef<Out>) -> SubscriberRef<In> {
    Arc::new(ScanSubscriber {
      child,
      state: Mutex::new(Some(self.seed.clone_for_subscription())),
      f: self.f.clone(),
    })
  }
}

struct ScanSubscriber<In, Out> {
  child: SubscriberRef<Out>,
  state: Mutex<Option<Seed<In, Out>>>,
  f: Arc<dyn Fn(Out, In) -> Out + Send + Sync>,
}

impl<In, Out> Observer<In> for ScanSubscriber<In, Out>
where
  In: 'static,
  Out: Clone + Send + 'static,
{
  fn next(&self, value: In) {
    let acc = {
      let mut state = self.state.lock().unwrap();
      let acc = match state.take() {
        Some(Seed::Value(prev)) => (self.f)(prev, value),
        Some(Seed::FirstItem(init)) => init(value),
        None => return,
      };
      *state = Some(Seed::Value(acc.clone()));
      acc
    };
    self.child.next(acc);
  }

  fn error(&self, err: RxError) {
    self.child.error(err);
  }

  fn complete(&self) {
    self.child.complete();
  }
}

impl<In, Out: Send> SubscriptionLike for ScanSubscriber<In, Out> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<In, Out> Subscriber<In> for ScanSubscriber<In, Out>
where
  In: 'static,
  Out: Clone + Send + 'static,
{
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}
