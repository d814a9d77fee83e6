use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

type ResolveFn<V> = Box<dyn Fn(V, V) -> V + Send + Sync>;

pub struct ToMapOp<Item, K, V> {
  key_fn: Arc<dyn Fn(&Item) -> K + Send + Sync>,
  value_fn: Arc<dyn Fn(&Item) -> V + Send + Sync>,
  resolve: Option<Arc<ResolveFn<V>>>,
}

impl<Item, K, V> ToMapOp<Item, K, V> {
  pub(crate) fn new(
    key_fn: impl Fn(&Item) -> K + Send + Sync + 'static,
    value_fn: impl Fn(&Item) -> V + Send + Sync + 'static,
    resolve: Option<ResolveFn<V>>,
  ) -> Self {
    ToMapOp {
      key_fn: Arc::new(key_fn),
      value_fn: Arc::new(value_fn),
      resolve: resolve.map(Arc::new),
    }
  }
}

impl<Item, K, V> Operator<Item, HashMap<K, V>> for ToMapOp<Item, K, V>
where
  Item: 'static,
  K: Eq + Hash + Send + 'static,
  V: Send + 'static,
{
  fn call(
    &self,
    child: SubscriberRef<HashMap<K, V>>,
  ) -> SubscriberRef<Item> {
    Arc::new(ToMapSubscriber {
      child,
      key_fn: self.key_fn.clone(),
      value_fn: self.value_fn.clone(),
      resolve: self.resolve.clone(),
      collected: Mutex::new(HashMap::new()),
    })
  }
}

/// Accumulates the whole sequence and emits the map once, on completion.
/// Without a resolver the later value wins a key conflict.
struct ToMapSubscriber<Item, K, V> {
  child: SubscriberRef<HashMap<K, V>>,
  key_fn: Arc<dyn Fn(&Item) -> K + Send + Sync>,
  value_fn: Arc<dyn Fn(&Item) -> V + Send + Sync>,
  resolve: Option<Arc<ResolveFn<V>>>,
  collected: Mutex<HashMap<K, V>>,
}

impl<Item, K, V> Observer<Item> for ToMapSubscriber<Item, K, V>
where
  Item: 'static,
  K: Eq + Hash + Send + 'static,
  V: Send + 'static,
{
  fn next(&self, value: Item) {
    let key = (self.key_fn)(&value);
    let incoming = (self.value_fn)(&value);
    let mut collected = self.collected.lock().unwrap();
    let merged = match (collected.remove(&key), &self.resolve) {
      (Some(existing), Some(resolve)) => resolve(existing, incoming),
      _ => incoming,
    };
    collected.insert(key, merged);
  }

  fn error(&self, err: RxError) {
    self.child.error(err);
  }

  fn complete(&self) {
    let collected = std::mem::take(&mut *self.collected.lock().unwrap());
    self.child.next(collected);
    self.child.complete();
  }
}

impl<Item, K: Send, V: Send> SubscriptionLike for ToMapSubscriber<Item, K, V> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item, K, V> Subscriber<Item> for ToMapSubscriber<Item, K, V>
where
  Item: 'static,
  K: Eq + Hash + Send + 'static,
  V: Send + 'static,
{
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}
