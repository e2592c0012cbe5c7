pub mod error;

pub mod curry;
pub mod pipe;
pub mod path;

pub mod functor;
pub mod stream;

pub mod scheduler;
pub mod timer;
pub mod throttle;

pub mod stream_configuration;

// Re-export the everyday surface at the crate root
pub use error::{StreamError, StreamResult};
pub use functor::{from_fn, from_iter, from_sparse, nothing, of, Functor, FunctorExt, Status};
pub use stream::{Event, ListenerId, Source, Stream};
pub use scheduler::{Scheduler, TokioScheduler, VirtualScheduler};
pub use timer::{RequestTimer, StreamTimer, Timer};
pub use throttle::{Throttle, Wait};
pub use stream_configuration::{BufferConfig, StreamConfig, TimerConfig};
