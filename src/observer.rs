//! The three-channel receiver of a sequence's signals.

use crate::error::RxError;

/// Consumer of the data in the reactive pattern: receives values, at most
/// one terminal error, and at most one completion notification.
///
/// Receivers take `&self` because a single observer is shared via `Arc`
/// between producer and consumer threads (`observe_on`, `flat_map`); any
/// per-subscription state lives behind interior mutability inside the
/// implementing type.
pub trait Observer<Item>: Send + Sync {
  /// Receives the next value of the sequence.
  fn next(&self, value: Item);

  /// Receives the terminal error. No further signals may be delivered
  /// after this one.
  fn error(&self, err: RxError);

  /// Receives the completion notification. No further signals may be
  /// delivered after this one.
  fn complete(&self);
}
