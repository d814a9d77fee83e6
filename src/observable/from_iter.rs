//! Sources backed by in-memory values.

use crate::observable::Observable;
use crate::subscriber::SubscriberRef;
use crate::subscription::SubscriptionLike;

/// Emits every value of the iterable in order, then completes. Cold: the
/// iterable is re-iterated for every subscription, and cancellation is
/// checked between items so an unsubscribing consumer stops the loop.
pub fn from_iter<I>(iterable: I) -> Observable<I::Item>
where
  I: IntoIterator + Clone + Send + Sync + 'static,
  I::Item: 'static,
{
  Observable::create(move |subscriber: &SubscriberRef<I::Item>| {
    for value in iterable.clone() {
      if subscriber.is_unsubscribed() {
        return;
      }
      subscriber.next(value);
    }
    subscriber.complete();
  })
}

/// Emits a single value, then completes.
pub fn of<Item>(value: Item) -> Observable<Item>
where
  Item: Clone + Send + Sync + 'static,
{
  Observable::create(move |subscriber: &SubscriberRef<Item>| {
    subscriber.next(value.clone());
    subscriber.complete();
  })
}
