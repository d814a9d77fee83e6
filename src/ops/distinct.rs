use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::error::RxError;
use crate::observable::Operator;
use crate::observer::Observer;
use crate::subscriber::{Subscriber, SubscriberRef};
use crate::subscription::{SharedSubscription, SubscriptionLike};

pub struct DistinctOp<Item, K> {
  key_fn: Arc<dyn Fn(&Item) -> K + Send + Sync>,
}

impl<Item, K> DistinctOp<Item, K> {
  pub(crate) fn new(
    key_fn: impl Fn(&Item) -> K + Send + Sync + 'static,
  ) -> Self {
    DistinctOp {
      key_fn: Arc::new(key_fn),
    }
  }
}

impl<Item, K> Operator<Item, Item> for DistinctOp<Item, K>
where
  Item: 'static,
  K: Eq + Hash + Send + 'static,
{
  fn call(&self, child: SubscriberRef<Item>) -> SubscriberRef<Item> {
    Arc::new(DistinctSubscriber {
      child,
      key_fn: self.key_fn.clone(),
      seen: Mutex::new(HashSet::new()),
    })
  }
}

struct DistinctSubscriber<Item, K> {
  child: SubscriberRef<Item>,
  key_fn: Arc<dyn Fn(&Item) -> K + Send + Sync>,
  seen: Mutex<HashSet<K>>,
}

impl<Item, K> Observer<Item> for DistinctSubscriber<Item, K>
where
  Item: 'static,
  K: Eq + Hash + Send + 'static,
{
  fn next(&self, value: Item) {
    let first_time = {
      let mut seen = self.seen.lock().unwrap();
      seen.insert((self.key_fn)(&value))
    };
    if first_time {
      self.child.next(value);
    }
  }

  fn error(&self, err: RxError) {
    self.child.error(err);
  }

  fn complete(&self) {
    self.child.complete();
  }
}

impl<Item, K: Send> SubscriptionLike for DistinctSubscriber<Item, K> {
  #[inline]
  fn is_unsubscribed(&self) -> bool {
    self.child.is_unsubscribed()
  }

  #[inline]
  fn unsubscribe(&self) {
    self.child.unsubscribe()
  }
}

impl<Item, K> Subscriber<Item> for DistinctSubscriber<Item, K>
where
  Item: 'static,
  K: Eq + Hash + Send + 'static,
{
  #[inline]
  fn add(&self, subscription: SharedSubscription) {
    self.child.add(subscription)
  }
}

#[cfg(test)]
mod test {
  use crate::observable::from_iter;
  use std::sync::{Arc, Mutex};

  #[test]
  fn suppresses_duplicates() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    from_iter(vec![1, 2, 1, 3, 2, 1])
      .distinct()
      .subscribe(move |v| out_c.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![1, 2, 3]);
  }

  #[test]
  fn distinct_by_key() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let out_c = out.clone();
    from_iter(vec!["apple", "avocado", "banana", "blueberry", "cherry"])
      .distinct_by(|s| s.as_bytes()[0])
      .subscribe(move |v| out_c.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec!["apple", "banana", "cherry"]);
  }
}
