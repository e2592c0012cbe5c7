//! Merge: values from several streams in arrival order
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::core::{Event, ListenerId, Notifier, Stopper, Stream};
use super::source::Source;
use crate::functor::Status;

/// Interleaves its inputs by arrival. Whatever the inputs already hold when
/// the merge starts is taken first, in input order; after that every push on
/// an input queues that input to be drained, so a batch pushed with
/// `extend` arrives together.
pub struct MergeSource<T> {
    inputs: Vec<Stream<T>>,
    listeners: RefCell<Vec<ListenerId>>,
    values: RefCell<VecDeque<T>>,
    arrivals: Rc<RefCell<VecDeque<usize>>>,
    stop: Stopper<T>,
}

impl<T: Clone + 'static> MergeSource<T> {
    pub fn new(notify: Notifier<T>, stop: Stopper<T>, inputs: Vec<Stream<T>>) -> Self {
        let mut values = VecDeque::new();
        for input in &inputs {
            while let Some(value) = input.shift() {
                values.push_back(value);
            }
        }

        let arrivals = Rc::new(RefCell::new(VecDeque::new()));
        let listeners = inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let arrivals = Rc::clone(&arrivals);
                let notify = notify.clone();
                input.on(Event::Push, move |_| {
                    arrivals.borrow_mut().push_back(i);
                    notify.notify(Event::Push);
                    None
                })
            })
            .collect();

        log::debug!("merging {} streams, {} values already waiting", inputs.len(), values.len());

        MergeSource {
            inputs,
            listeners: RefCell::new(listeners),
            values: RefCell::new(values),
            arrivals,
            stop,
        }
    }
}

impl<T: Clone + 'static> MergeSource<T> {
    /// Move everything the next arrived input holds into `values`. Returns
    /// false once no arrivals are queued.
    fn drain_arrival(&self) -> bool {
        let next = self.arrivals.borrow_mut().pop_front();
        let i = match next {
            Some(i) => i,
            None => return false,
        };

        let mut drained = Vec::new();
        while let Some(value) = self.inputs[i].shift() {
            drained.push(value);
        }
        self.values.borrow_mut().extend(drained);
        true
    }
}

impl<T> MergeSource<T> {
    fn release(&self) {
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for (input, id) in self.inputs.iter().zip(listeners) {
            input.off(Event::Push, id);
        }
    }
}

impl<T: Clone + 'static> Source<T> for MergeSource<T> {
    fn shift(&self) -> Option<T> {
        let waiting = self.values.borrow_mut().pop_front();
        if waiting.is_some() {
            return waiting;
        }

        // an input already drained by an earlier arrival yields nothing
        let mut value = None;
        while value.is_none() && self.drain_arrival() {
            value = self.values.borrow_mut().pop_front();
        }

        if self.arrivals.borrow().is_empty()
            && self.values.borrow().is_empty()
            && self.inputs.iter().all(|input| input.status() == Status::Done)
        {
            self.release();
            self.stop.stop(0, None);
        }
        value
    }

    fn stop(&self) {
        while self.drain_arrival() {}
        self.release();
        let n = self.values.borrow().len();
        self.stop.stop(n, None);
    }
}

impl<T> Drop for MergeSource<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Merge `inputs` into one stream in arrival order
    pub fn merge(inputs: Vec<Stream<T>>) -> Self {
        Stream::new(move |notify, stop| MergeSource::new(notify, stop, inputs))
    }

    /// Merge this stream with `others`
    pub fn merge_with<I>(self, others: I) -> Self
    where
        I: IntoIterator<Item = Stream<T>>,
    {
        let mut inputs = vec![self];
        inputs.extend(others);
        Stream::merge(inputs)
    }
}
