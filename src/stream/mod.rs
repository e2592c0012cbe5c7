//! Single-threaded push/pull streams
//!
//! A [`Stream`] pairs a lazily constructed [`Source`] with event listeners.
//! Consumers pull with `shift`; producers push, and the source announces new
//! values with [`Event::Push`]. Streams are also [`Functor`](crate::functor::Functor)s,
//! so every functor combinator applies to them.

pub mod core;
pub mod source;
pub mod combine;
pub mod select;
pub mod rate;
pub mod fork;
pub mod events;

// Re-export core types
pub use self::core::{Done, Event, ListenerId, Notifier, Stopper, Stream, WeakStream};

// Re-export sources
pub use source::{BufferSource, Source};
pub use combine::CombineSource;
pub use select::MergeSource;
pub use rate::{ChokeSource, ClockSource, ThrottleSource};
pub use fork::ForkSource;
pub use events::{Emitter, EventSource, Subscription};
