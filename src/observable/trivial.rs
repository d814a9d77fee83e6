//! Degenerate sources.

use crate::error::RxError;
use crate::observable::Observable;
use crate::subscriber::SubscriberRef;

/// Completes immediately without emitting.
pub fn empty<Item: 'static>() -> Observable<Item> {
  Observable::create(|subscriber: &SubscriberRef<Item>| {
    subscriber.complete();
  })
}

/// Errors immediately without emitting.
pub fn throw<Item: 'static>(err: RxError) -> Observable<Item> {
  Observable::create(move |subscriber: &SubscriberRef<Item>| {
    subscriber.error(err.clone());
  })
}

/// Never emits and never terminates; the subscription stays open until the
/// consumer unsubscribes.
pub fn never<Item: 'static>() -> Observable<Item> {
  Observable::create(|_subscriber: &SubscriberRef<Item>| {})
}
