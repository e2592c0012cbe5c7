//! Stream sources
//!
//! A source is the engine behind a [`Stream`](super::Stream): it stores or
//! produces values and decides what `push` and `stop` mean. Sources are
//! shared behind an `Rc` and called through `&self`, so any mutable state
//! lives in cells that are never borrowed across a callback.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::core::{Event, Notifier, Stopper};
use crate::functor::Functor;

pub trait Source<T> {
    /// Next value, or `None` if nothing is available right now
    fn shift(&self) -> Option<T>;

    /// Accept values pushed into the stream
    fn push(&self, values: Vec<T>) {
        let _ = values;
    }

    fn start(&self) {}

    /// Stop the stream through the source's [`Stopper`]
    fn stop(&self) {}
}

/// A FIFO buffer, optionally backed by an upstream functor that is pulled
/// whenever the buffer runs dry
pub struct BufferSource<T> {
    buffer: RefCell<VecDeque<T>>,
    upstream: RefCell<Option<Box<dyn Functor<Item = T>>>>,
    notify: Notifier<T>,
    stop: Stopper<T>,
}

impl<T: Clone + 'static> BufferSource<T> {
    pub fn new(notify: Notifier<T>, stop: Stopper<T>, values: VecDeque<T>) -> Self {
        BufferSource {
            buffer: RefCell::new(values),
            upstream: RefCell::new(None),
            notify,
            stop,
        }
    }

    pub fn with_upstream(
        notify: Notifier<T>,
        stop: Stopper<T>,
        upstream: Box<dyn Functor<Item = T>>,
    ) -> Self {
        BufferSource {
            buffer: RefCell::new(VecDeque::new()),
            upstream: RefCell::new(Some(upstream)),
            notify,
            stop,
        }
    }
}

impl<T: Clone + 'static> Source<T> for BufferSource<T> {
    fn shift(&self) -> Option<T> {
        let buffered = self.buffer.borrow_mut().pop_front();
        if buffered.is_some() {
            return buffered;
        }

        let pulled = match self.upstream.try_borrow_mut() {
            Ok(mut upstream) => upstream.as_mut().and_then(|f| f.shift()),
            Err(_) => None,
        };
        if pulled.is_some() {
            return pulled;
        }

        self.notify.notify(Event::Pull)
    }

    fn push(&self, values: Vec<T>) {
        self.buffer.borrow_mut().extend(values);
        self.notify.notify(Event::Push);
    }

    fn stop(&self) {
        let n = self.buffer.borrow().len();
        self.stop.stop(n, None);
    }
}
