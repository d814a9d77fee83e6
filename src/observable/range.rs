//! Arithmetic sequence source.

use std::ops::Add;

use crate::observable::Observable;
use crate::subscriber::SubscriberRef;
use crate::subscription::SubscriptionLike;

/// Emits `count` consecutive values starting at `start`, then completes.
pub fn range<Item>(start: Item, count: usize) -> Observable<Item>
where
  Item: Copy + Add<Output = Item> + From<u8> + Send + Sync + 'static,
{
  Observable::create(move |subscriber: &SubscriberRef<Item>| {
    let one = Item::from(1u8);
    let mut current = start;
    for _ in 0..count {
      if subscriber.is_unsubscribed() {
        return;
      }
      subscriber.next(current);
      current = current + one;
    }
    subscriber.complete();
  })
}
