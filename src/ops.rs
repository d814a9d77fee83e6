//! Operator implementations backing the [`Observable`] combinators.
//!
//! Each operator lives in its own module as an `XxxOp` pipeline stage and
//! an `XxxSubscriber` carrying the per-subscription state.
//!
//! [`Observable`]: crate::observable::Observable

pub mod all;
pub mod concat_map;
pub mod distinct;
pub mod exist;
pub mod filter;
pub mod flat_map;
pub mod last;
pub mod map;
pub mod observe_on;
pub mod scan;
pub mod subscribe_on;
pub mod take;
pub mod take_while;
pub mod tap;
pub mod to_map;
