//! Fork: two independent readers over one stream
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::core::{Event, ListenerId, Notifier, Stopper, Stream};
use super::source::Source;

struct Shared<T> {
    buffers: [VecDeque<T>; 2],
}

/// One side of a forked stream. Values pulled from the upstream by either
/// side are buffered for the other, so each side sees every value once at
/// its own pace.
pub struct ForkSource<T> {
    side: usize,
    upstream: Stream<T>,
    shared: Rc<RefCell<Shared<T>>>,
    listener: Cell<Option<ListenerId>>,
    stop: Stopper<T>,
}

impl<T: Clone + 'static> ForkSource<T> {
    fn new(
        notify: Notifier<T>,
        stop: Stopper<T>,
        side: usize,
        upstream: Stream<T>,
        shared: Rc<RefCell<Shared<T>>>,
    ) -> Self {
        let listener = upstream.on(Event::Push, move |_| {
            notify.notify(Event::Push);
            None
        });

        ForkSource {
            side,
            upstream,
            shared,
            listener: Cell::new(Some(listener)),
            stop,
        }
    }
}

impl<T> ForkSource<T> {
    fn release(&self) {
        if let Some(id) = self.listener.take() {
            self.upstream.off(Event::Push, id);
        }
    }
}

impl<T: Clone + 'static> Source<T> for ForkSource<T> {
    fn shift(&self) -> Option<T> {
        let buffered = self.shared.borrow_mut().buffers[self.side].pop_front();
        if buffered.is_some() {
            return buffered;
        }

        let value = self.upstream.shift();
        if let Some(value) = &value {
            self.shared.borrow_mut().buffers[1 - self.side].push_back(value.clone());
        }
        value
    }

    fn stop(&self) {
        // whatever the upstream still holds belongs to both sides
        while let Some(value) = self.upstream.shift() {
            let mut shared = self.shared.borrow_mut();
            shared.buffers[1 - self.side].push_back(value.clone());
            shared.buffers[self.side].push_back(value);
        }

        self.release();
        let n = self.shared.borrow().buffers[self.side].len();
        self.stop.stop(n, None);
    }
}

impl<T> Drop for ForkSource<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Split into two streams that each see every value of this one. Both
    /// stop when this stream stops.
    pub fn fork(self) -> (Stream<T>, Stream<T>) {
        let shared = Rc::new(RefCell::new(Shared {
            buffers: [VecDeque::new(), VecDeque::new()],
        }));

        let side = |n: usize| {
            let upstream = self.clone();
            let shared = Rc::clone(&shared);
            Stream::new(move |notify, stop| ForkSource::new(notify, stop, n, upstream, shared))
        };
        let (left, right) = (side(0), side(1));

        let forks = [left.downgrade(), right.downgrade()];
        self.then(move |_| {
            for fork in &forks {
                if let Some(fork) = fork.upgrade() {
                    fork.stop();
                }
            }
        });

        (left, right)
    }
}
