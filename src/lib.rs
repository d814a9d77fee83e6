//! # minirx: a small thread-based Reactive Extensions runtime
//!
//! Cold observables, composable operators and explicit scheduling,
//! built on plain OS threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use minirx::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let sum = Arc::new(Mutex::new(0));
//! let sum_c = sum.clone();
//! observable::range(1, 10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * v)
//!   .subscribe(move |v| *sum_c.lock().unwrap() += v);
//! assert_eq!(*sum.lock().unwrap(), 220);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A cold, reusable description of a value stream |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` signals |
//! | [`Subscriber`] | An observer that doubles as a cancellation handle |
//! | [`Scheduler`] / [`Worker`] | Where and when producers and consumers run |
//!
//! Nothing runs until `subscribe`; every subscription is an independent
//! execution of the producer. Chains stay on the subscribing thread
//! unless `subscribe_on`, `observe_on` or a timed source moves them.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscriber`]: subscriber::Subscriber
//! [`Scheduler`]: scheduler::Scheduler
//! [`Worker`]: scheduler::Worker

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod queue;
pub mod scheduler;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;
