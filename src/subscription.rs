//! Cancellation tokens and cancellation groups.

use smallvec::SmallVec;
use std::sync::{Arc, Mutex, Weak};

/// A handle that can cancel an active subscription.
///
/// Implementations must make `unsubscribe` idempotent and safe to call
/// concurrently from multiple threads; the `unsubscribed` state is
/// monotonic and never reverts.
pub trait SubscriptionLike: Send + Sync {
  fn is_unsubscribed(&self) -> bool;

  /// Deregisters the stream before it has delivered all its events.
  /// Transitively cancels every linked resource exactly once.
  fn unsubscribe(&self);
}

/// Shared ownership of a type erased subscription.
pub type SharedSubscription = Arc<dyn SubscriptionLike>;

impl<T: SubscriptionLike + ?Sized> SubscriptionLike for Arc<T> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    (**self).is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    (**self).unsubscribe()
  }
}

/// A cancellation group: unsubscribing it unsubscribes every child that is
/// not already unsubscribed, exactly once.
///
/// One lock guards the flag and the child list together, so a child added
/// concurrently with `unsubscribe` is either cancelled by the group or
/// cancelled immediately on `add`, never leaked.
#[derive(Default)]
pub struct CompositeSubscription(Mutex<Inner>);

#[derive(Default)]
struct Inner {
  unsubscribed: bool,
  children: SmallVec<[SharedSubscription; 1]>,
}

impl CompositeSubscription {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a child. Already-closed children are pruned on every add
  /// so long lived groups do not grow without bound.
  pub fn add(&self, subscription: SharedSubscription) {
    let mut inner = self.0.lock().unwrap();
    if inner.unsubscribed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.children.retain(|c| !c.is_unsubscribed());
      inner.children.push(subscription);
    }
  }

  #[cfg(test)]
  pub(crate) fn child_count(&self) -> usize {
    self.0.lock().unwrap().children.len()
  }
}

impl SubscriptionLike for CompositeSubscription {
  fn is_unsubscribed(&self) -> bool {
    self.0.lock().unwrap().unsubscribed
  }

  fn unsubscribe(&self) {
    let children = {
      let mut inner = self.0.lock().unwrap();
      if inner.unsubscribed {
        return;
      }
      inner.unsubscribed = true;
      std::mem::take(&mut inner.children)
    };
    // Children run outside the lock: a child may itself be a group that
    // calls back into other subscriptions.
    for child in children {
      if !child.is_unsubscribed() {
        child.unsubscribe();
      }
    }
  }
}

/// A non-owning subscription handle.
///
/// Returned to client code from `subscribe`; once the chain it points at
/// has been torn down, `is_unsubscribed` conservatively reports `true` and
/// `unsubscribe` is a no-op, so lingering handles can never touch freed
/// state.
#[derive(Clone)]
pub struct WeakSubscription(Weak<dyn SubscriptionLike>);

impl WeakSubscription {
  pub fn new(target: Weak<dyn SubscriptionLike>) -> Self {
    WeakSubscription(target)
  }

  pub fn of<S: SubscriptionLike + 'static>(target: &Arc<S>) -> Self {
    // Unsize to the trait object before downgrading; `Arc::downgrade`
    // cannot coerce the pointee itself.
    let target: Arc<dyn SubscriptionLike> = target.clone();
    WeakSubscription(Arc::downgrade(&target))
  }

  /// Activates RAII behavior: `unsubscribe` runs when the returned guard
  /// goes out of scope.
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self> {
    SubscriptionGuard::new(self)
  }
}

impl SubscriptionLike for WeakSubscription {
  fn is_unsubscribed(&self) -> bool {
    match self.0.upgrade() {
      Some(target) => target.is_unsubscribed(),
      None => true,
    }
  }

  fn unsubscribe(&self) {
    if let Some(target) = self.0.upgrade() {
      target.unsubscribe();
    }
  }
}

/// An RAII wrapper of a subscription. When the guard is dropped (falls out
/// of scope), the subscription is unsubscribed.
#[must_use]
pub struct SubscriptionGuard<T: SubscriptionLike>(T);

impl<T: SubscriptionLike> SubscriptionGuard<T> {
  pub fn new(subscription: T) -> Self {
    SubscriptionGuard(subscription)
  }
}

impl<T: SubscriptionLike> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    self.0.unsubscribe()
  }
}
