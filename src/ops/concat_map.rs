use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

use crate::error::RxError;
use crate::observable::{Observable, OnSubscribe};
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

type MapperFn<In, Out> =
  Arc<dyn Fn(In) -> Observable<Out> + Send + Sync>;

/// Maps each upstream value to an inner observable and runs the inners
/// strictly one at a time, in arrival order.
pub struct ConcatMapOnSubscribe<In, Out> {
  source: Arc<dyn OnSubscribe<In>>,
  mapper: MapperFn<In, Out>,
}

impl<In, Out> ConcatMapOnSubscribe<In, Out> {
  pub(crate) fn new(
    source: Arc<dyn OnSubscribe<In>>,
    mapper: impl Fn(In) -> Observable<Out> + Send + Sync + 'static,
  ) -> Self {
    ConcatMapOnSubscribe {
      source,
      mapper: Arc::new(mapper),
    }
  }
}

impl<In, Out> OnSubscribe<Out> for ConcatMapOnSubscribe<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  fn call(&self, subscriber: &SubscriberRef<Out>) {
    let parent = Arc::new_cyclic(|weak: &Weak<ConcatMapSubscriber<In, Out>>| {
      ConcatMapSubscriber {
        child: subscriber.clone(),
        mapper: self.mapper.clone(),
        self_ref: weak.clone(),
        state: Mutex::new(State {
          waiting: VecDeque::new(),
          active: false,
          upstream_complete: false,
          done: false,
        }),
      }
    });
    let parent: SubscriberRef<In> = parent;
    self.source.call(&parent);
  }
}

struct State<Out> {
  /// Inner observables waiting for the active one to finish.
  waiting: VecDeque<Observable<Out>>,
  active: bool,
  upstream_complete: bool,
  done: bool,
}

/// Serializes the inner subscriptions.
///
/// `process` fires only on the two state transitions that can free the
/// slot (a new inner arriving, the active inner completing); between
/// signals nothing runs. Downstream completes when the upstream has
/// completed, the queue is empty and no inner is active.
struct ConcatMapSubscriber<In, Out> {
  child: SubscriberRef<Out>,
  mapper: MapperFn<In, Out>,
  self_ref: Weak<ConcatMapSubscriber<In, Out>>,
  state: Mutex<State<Out>>,
}

impl<In, Out> ConcatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  fn process(self: &Arc<Self>) {
    loop {
      let next_inner = {
        let mut state = self.state.lock().unwrap();
        // Unsubscription halts dequeuing; queued inners are released
        // unconsumed instead of being subscribed after cancellation.
        if self.is_unsubscribed() {
          state.done = true;
          state.waiting.clear();
          return;
        }
        if state.done || state.active {
          return;
        }
        match state.waiting.pop_front() {
          Some(inner) => {
            state.active = true;
            inner
          }
          None => {
            if !state.upstream_complete {
              return;
            }
            state.done = true;
            drop(state);
            self.child.complete();
            return;
          }
        }
      };
      let inner_subscriber: SubscriberRef<Out> =
        Arc::new(InnerConcatMapSubscriber {
          parent: self.clone(),
        });
      next_inner.on_subscribe().call(&inner_subscriber);
      // A synchronous inner has already completed here and freed the
      // slot; loop instead of recursing through process().
    }
  }

  fn inner_complete(self: &Arc<Self>) {
    {
      let mut state = self.state.lock().unwrap();
      if state.done {
        return;
      }
      state.active = false;
    }
    self.process();
  }

  fn fail(&self, err: RxError) {
    {
      let mut state = self.state.lock().unwrap();
      if state.done {
        return;
      }
      state.done = true;
      state.waiting.clear();
    }
    self.child.error(err);
  }
}

impl<In, Out> Observer<In> for ConcatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  fn next(&self, value: In) {
    let inner = (self.mapper)(value);
    {
      let mut state = self.state.lock().unwrap();
      if state.done {
        return;
      }
      state.waiting.push_back(inner);
    }
    if let Some(this) = self.self_ref.upgrade() {
      this.process();
    }
  }

  fn error(&self, err: RxError) {
    self.fail(err);
  }

  fn complete(&self) {
    {
      let mut state = self.state.lock().unwrap();
      if state.done {
        return;
      }
      state.upstream_complete = true;
    }
    if let Some(this) = self.self_ref.upgrade() {
      this.process();
    }
  }
}

impl<In, Out> SubscriptionLike for ConcatMapSubscriber<In, Out> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<In, Out> Subscriber<In> for ConcatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}

/// Receiver of the currently active inner. Holds the parent strongly: an
/// asynchronous inner must keep the queue and completion state alive past
/// the upstream `subscribe` call. The parent keeps no reference back, so
/// ownership stays acyclic and the chain is freed when the last inner is.
struct InnerConcatMapSubscriber<In, Out> {
  parent: Arc<ConcatMapSubscriber<In, Out>>,
}

impl<In, Out> Observer<Out> for InnerConcatMapSubscriber<In, Out>
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

impl<In, Out> SubscriptionLike for InnerConcatMapSubscriber<In, Out> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.parent.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.parent.unsubscribe()
  }
}

impl<In, Out> Subscriber<Out> for InnerConcatMapSubscriber<In, Out>
where
  In: Send + 'static,
  Out: 'static,
{
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.parent.add(subscription)
  }
}
