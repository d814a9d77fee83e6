use std::sync::{Arc, Mutex, Weak};

use crate::error::RxError;
use crate::observable::{Observable, OnSubscribe};
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

type MapperFn<In, Out> =
  Arc<dyn Fn(In) -> Observable<Out> + Send + Sync>;

/// Maps each upstream value to an inner observable and subscribes to it
/// immediately; inner outputs interleave in whatever order they arrive.
pub struct FlatMapOnSubscribe<In, Out> {
  source: Arc<dyn OnSubscribe<In>>,
  mapper: MapperFn<In, Out>,
}

impl<In, Out> FlatMapOnSubscribe<In, Out> {
  pub(crate) fn new(
    source: Arc<dyn OnSubscribe<In>>,
    mapper: impl Fn(In) -> Observable<Out> + Send + Sync + 'static,
  ) -> Self {
    FlatMapOnSubscribe {
      source,
      mapper: Arc::new(mapper),
    }
  }
}

impl<In, Out> OnSubscribe<Out> for FlatMapOnSubscribe<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  fn call(&self, subscriber: &SubscriberRef<Out>) {
    let parent = Arc::new_cyclic(|weak: &Weak<FlatMapSubscriber<In, Out>>| {
      FlatMapSubscriber {
        child: subscriber.clone(),
        mapper: self.mapper.clone(),
        self_ref: weak.clone(),
        state: Mutex::new(State {
          active: 0,
          upstream_complete: false,
          done: false,
        }),
      }
    });
    let parent: SubscriberRef<In> = parent;
    self.source.call(&parent);
  }
}

struct State {
  /// Inners subscribed but not yet terminated.
  active: usize,
  upstream_complete: bool,
  done: bool,
}

/// Completion is gated on both sides: downstream completes only once the
/// upstream has completed and every inner has terminated, whichever
/// happens last.
struct FlatMapSubscriber<In, Out> {
  child: SubscriberRef<Out>,
  mapper: MapperFn<In, Out>,
  self_ref: Weak<FlatMapSubscriber<In, Out>>,
  state: Mutex<State>,
}

impl<In, Out> FlatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  fn inner_complete(&self) {
    let finished = {
      let mut state = self.state.lock().unwrap();
      if state.done {
        return;
      }
      state.active -= 1;
      if state.upstream_complete && state.active == 0 {
        state.done = true;
        true
      } else {
        false
      }
    };
    if finished {
      self.child.complete();
    }
  }

  fn fail(&self, err: RxError) {
    {
      let mut state = self.state.lock().unwrap();
      if state.done {
        return;
      }
      state.done = true;
    }
    self.child.error(err);
  }
}

impl<In, Out> Observer<In> for FlatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  fn next(&self, value: In) {
    let this = match self.self_ref.upgrade() {
      Some(this) => this,
      None => return,
    };
    let inner = (self.mapper)(value);
    {
      let mut state = self.state.lock().unwrap();
      if state.done {
        return;
      }
      state.active += 1;
    }
    let inner_subscriber: SubscriberRef<Out> =
      Arc::new(InnerFlatMapSubscriber { parent: this });
    inner.on_subscribe().call(&inner_subscriber);
  }

  fn error(&self, err: RxError) {
    self.fail(err);
  }

  fn complete(&self) {
    let finished = {
      let mut state = self.state.lock().unwrap();
      if state.done {
        return;
      }
      state.upstream_complete = true;
      if state.active == 0 {
        state.done = true;
        true
      } else {
        false
      }
    };
    if finished {
      self.child.complete();
    }
  }
}

impl<In, Out> SubscriptionLike for FlatMapSubscriber<In, Out> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<In, Out> Subscriber<In> for FlatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}

/// Holds the parent strongly so the completion bookkeeping survives while
/// an asynchronous inner runs; the parent keeps no reference back, so
/// ownership stays acyclic.
struct InnerFlatMapSubscriber<In, Out> {
  parent: Arc<FlatMapSubscriber<In, Out>>,
}

impl<In, Out> Observer<Out> for InnerFlatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  fn next(&self, value: Out) {
    if !self.parent.state.lock().unwrap().done {
      self.parent.child.next(value);
    }
  }

  fn error(&self, err: RxError) {
    self.parent.fail(err);
  }

  fn complete(&self) {
    self.parent.inner_complete();
  }
}

impl<In, Out> SubscriptionLike for InnerFlatMapSubscriber<In, Out> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.parent.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.parent.unsubscribe()
  }
}

impl<In, Out> Subscriber<Out> for InnerFlatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.parent.add(subscription)
  }
}
