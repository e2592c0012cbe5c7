//! Lazy, single-pass, pull-based sequences
//!
//! A [`Functor`] hands out one value per [`shift`](Functor::shift) until it is
//! exhausted. Every combinator is a small struct holding its upstream plus
//! whatever private state it needs, so nothing is evaluated until pulled.

pub mod core;
pub mod constructors;
pub mod advanced;
pub mod utility;

// Re-export core types
pub use self::core::{Catch, Filter, Fold, Functor, FunctorExt, Map, Rest, Status, Take, Unshift};

// Re-export constructors
pub use constructors::{from_fn, from_iter, from_sparse, nothing, of, FromFn, FromIter, Nothing};

// Re-export advanced combinators
pub use advanced::{Chunk, Concat, Fork, Join, Partition, Sort, Split, Syphon};

// Re-export utility combinators
pub use utility::{Dedup, First, Iter, Latest, Tap, Unique};
