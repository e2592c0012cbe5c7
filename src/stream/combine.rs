//! Combine: the latest value of each input, mapped through a function
use std::cell::RefCell;
use std::rc::Rc;

use super::core::{Event, ListenerId, Notifier, Stopper, Stream};
use super::source::Source;
use crate::error::{StreamError, StreamResult};
use crate::functor::Status;

struct CombineState<A> {
    values: Vec<Option<A>>,
    hot: bool,
}

/// Holds the latest value from every input. Nothing is emitted until each
/// input has produced at least once; after that any input push yields a fresh
/// combination.
pub struct CombineSource<A, T, F> {
    inputs: Vec<Stream<A>>,
    listeners: RefCell<Vec<ListenerId>>,
    state: Rc<RefCell<CombineState<A>>>,
    f: RefCell<F>,
    stop: Stopper<T>,
}

impl<A, T, F> CombineSource<A, T, F>
where
    A: Clone + 'static,
    T: Clone + 'static,
    F: FnMut(&[A]) -> T + 'static,
{
    pub fn new(notify: Notifier<T>, stop: Stopper<T>, f: F, inputs: Vec<Stream<A>>) -> Self {
        let state = Rc::new(RefCell::new(CombineState {
            values: vec![None; inputs.len()],
            hot: true,
        }));

        let listeners = inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let state = Rc::clone(&state);
                let notify = notify.clone();
                input.on(Event::Push, move |_| {
                    {
                        let mut state = state.borrow_mut();
                        state.values[i] = None;
                        state.hot = true;
                    }
                    notify.notify(Event::Push);
                    None
                })
            })
            .collect();

        log::debug!("combining {} streams", inputs.len());

        CombineSource {
            inputs,
            listeners: RefCell::new(listeners),
            state,
            f: RefCell::new(f),
            stop,
        }
    }
}

impl<A, T, F> CombineSource<A, T, F> {
    fn release(&self) {
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for (input, id) in self.inputs.iter().zip(listeners) {
            input.off(Event::Push, id);
        }
    }
}

impl<A, T, F> Source<T> for CombineSource<A, T, F>
where
    A: Clone + 'static,
    T: Clone + 'static,
    F: FnMut(&[A]) -> T + 'static,
{
    fn shift(&self) -> Option<T> {
        if !self.state.borrow().hot {
            return None;
        }
        self.state.borrow_mut().hot = false;

        for (i, input) in self.inputs.iter().enumerate() {
            let mut latest = None;
            while let Some(value) = input.shift() {
                latest = Some(value);
            }
            if latest.is_some() {
                self.state.borrow_mut().values[i] = latest;
            }
        }

        if self.inputs.iter().all(|input| input.status() == Status::Done) {
            self.stop.stop(0, None);
        }

        let values: Option<Vec<A>> = self.state.borrow().values.iter().cloned().collect();
        let values = values?;
        let mut f = self.f.try_borrow_mut().ok()?;
        Some((*f)(&values))
    }

    fn stop(&self) {
        let hot = self.state.borrow().hot;
        self.release();
        self.stop.stop(if hot { 1 } else { 0 }, None);
    }
}

impl<A, T, F> Drop for CombineSource<A, T, F> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Combine the latest values of `inputs` through `f`. Needs at least two
    /// inputs.
    pub fn combine<A, F>(f: F, inputs: Vec<Stream<A>>) -> StreamResult<Self>
    where
        A: Clone + 'static,
        F: FnMut(&[A]) -> T + 'static,
    {
        if inputs.len() < 2 {
            return Err(StreamError::CombineArity(inputs.len()));
        }
        Ok(Stream::new(move |notify, stop| CombineSource::new(notify, stop, f, inputs)))
    }

    /// Combine this stream with `other`
    pub fn combine_with<U, F>(self, other: Stream<T>, mut f: F) -> Stream<U>
    where
        U: Clone + 'static,
        F: FnMut(&T, &T) -> U + 'static,
    {
        let inputs = vec![self, other];
        Stream::new(move |notify, stop| {
            CombineSource::new(notify, stop, move |values: &[T]| f(&values[0], &values[1]), inputs)
        })
    }
}
