//! The error union delivered through the `error` channel.
//!
//! Streams carry failures as values instead of unwinding across operator
//! boundaries: a producer that fails calls [`Observer::error`] with an
//! [`RxError`], every stage forwards it downstream, and the stream is
//! terminal afterwards.
//!
//! [`Observer::error`]: crate::observer::Observer::error

use std::any::Any;
use std::sync::Arc;

/// Error type flowing through observable chains.
///
/// `RxError` is cheap to clone because the same terminal error may fan out
/// to several subscribers (for example every inner subscription of a
/// `flat_map`).
#[derive(Clone, Debug, thiserror::Error)]
pub enum RxError {
  /// A bounded buffer overflowed because the consumer could not keep up
  /// with the producer. See `observe_on`.
  #[error("subscriber is too slow, bounded buffer overflowed")]
  SlowSubscriber,

  /// A producer or a mapper closure panicked. The panic is caught at the
  /// subscribe boundary and converted into this error.
  #[error("producer panicked: {0}")]
  Panicked(Arc<str>),

  /// An ad-hoc textual error, see [`RxError::msg`].
  #[error("{0}")]
  Message(Arc<str>),

  /// A caller supplied error payload, see [`RxError::custom`]. The
  /// original payload can be recovered with [`RxError::downcast_ref`].
  #[error(transparent)]
  Custom(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl RxError {
  /// Wraps a plain message.
  pub fn msg(msg: impl Into<String>) -> Self {
    RxError::Message(Arc::from(msg.into().into_boxed_str()))
  }

  /// Wraps a caller supplied error value.
  pub fn custom<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    RxError::Custom(Arc::new(err))
  }

  /// Recovers the payload passed to [`RxError::custom`], unchanged.
  pub fn downcast_ref<E>(&self) -> Option<&E>
  where
    E: std::error::Error + 'static,
  {
    match self {
      RxError::Custom(err) => err.downcast_ref::<E>(),
      _ => None,
    }
  }

  /// Converts a caught panic payload into an error value.
  pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
      (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "opaque panic payload".to_owned()
    };
    RxError::Panicked(Arc::from(msg.into_boxed_str()))
  }
}
