//! Adapter from callback-style event sources to streams
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use super::core::{Event, Notifier, Stopper, Stream};
use super::source::Source;

/// Feeds values from an external event source into a stream
pub struct Emitter<T> {
    buffer: Weak<RefCell<VecDeque<T>>>,
    notify: Notifier<T>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Emitter {
            buffer: Weak::clone(&self.buffer),
            notify: self.notify.clone(),
        }
    }
}

impl<T: Clone + 'static> Emitter<T> {
    /// Returns false once the stream has gone away
    pub fn emit(&self, value: T) -> bool {
        let buffer = match self.buffer.upgrade() {
            Some(buffer) => buffer,
            None => return false,
        };
        buffer.borrow_mut().push_back(value);
        self.notify.notify(Event::Push);
        true
    }
}

/// Detaches from an external event source when cancelled or dropped
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F: FnOnce() + 'static>(release: F) -> Self {
        Subscription { release: Some(Box::new(release)) }
    }

    /// A subscription with nothing to release
    pub fn noop() -> Self {
        Subscription { release: None }
    }

    pub fn cancel(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct EventSource<T> {
    buffer: Rc<RefCell<VecDeque<T>>>,
    subscription: RefCell<Subscription>,
    stop: Stopper<T>,
}

impl<T: Clone + 'static> EventSource<T> {
    pub fn new<F>(notify: Notifier<T>, stop: Stopper<T>, subscribe: F) -> Self
    where
        F: FnOnce(Emitter<T>) -> Subscription,
    {
        let buffer = Rc::new(RefCell::new(VecDeque::new()));
        let emitter = Emitter { buffer: Rc::downgrade(&buffer), notify };
        let subscription = subscribe(emitter);
        EventSource {
            buffer,
            subscription: RefCell::new(subscription),
            stop,
        }
    }
}

impl<T: Clone + 'static> Source<T> for EventSource<T> {
    fn shift(&self) -> Option<T> {
        self.buffer.borrow_mut().pop_front()
    }

    fn stop(&self) {
        let subscription = self.subscription.replace(Subscription::noop());
        drop(subscription);
        let n = self.buffer.borrow().len();
        self.stop.stop(n, None);
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// A stream fed by an external event source. `subscribe` runs when the
    /// stream is first used and hands back the [`Subscription`] that detaches
    /// it again when the stream stops.
    pub fn events<F>(subscribe: F) -> Self
    where
        F: FnOnce(Emitter<T>) -> Subscription + 'static,
    {
        Stream::new(move |notify, stop| EventSource::new(notify, stop, subscribe))
    }
}
