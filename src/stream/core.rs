//! Core stream handle, events and lifecycle

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use futures::channel::{mpsc, oneshot};

use super::source::{BufferSource, Source};
use crate::functor::{Functor, Status};
use crate::stream_configuration::BufferConfig;

/// Stream events. `Push` announces that values may be waiting; `Pull` is
/// raised when a consumer found the buffer empty, giving listeners a chance
/// to supply a value on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Push,
    Pull,
}

impl Event {
    fn slot(self) -> usize {
        match self {
            Event::Push => 0,
            Event::Pull => 1,
        }
    }
}

/// Handle returned by [`Stream::on`], used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener<T> {
    id: ListenerId,
    active: Cell<bool>,
    f: RefCell<Box<dyn FnMut(Event) -> Option<T>>>,
}

type Factory<T> = Box<dyn FnOnce(Notifier<T>, Stopper<T>) -> Rc<dyn Source<T>>>;
type Listeners<T> = HashMap<Event, Vec<Rc<Listener<T>>>>;

enum State<T> {
    Unstarted(Factory<T>),
    Starting,
    Active(Rc<dyn Source<T>>),
    // stopped, but `remaining` values may still be shifted out
    Stopping {
        source: Rc<dyn Source<T>>,
        remaining: usize,
    },
    Done,
}

impl<T> State<T> {
    fn name(&self) -> &'static str {
        match self {
            State::Unstarted(_) => "unstarted",
            State::Starting => "starting",
            State::Active(_) => "active",
            State::Stopping { .. } => "stopping",
            State::Done => "done",
        }
    }
}

enum Completion<T> {
    Pending(Vec<Box<dyn FnOnce(Option<T>)>>),
    Resolved(Option<T>),
}

struct Inner<T> {
    state: RefCell<State<T>>,
    // None once the stream has stopped; listeners are released at that point
    listeners: RefCell<Option<Listeners<T>>>,
    next_id: Cell<u64>,
    dispatching: [Cell<bool>; 2],
    completion: RefCell<Completion<T>>,
}

struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

enum Step<T> {
    Shift(Rc<dyn Source<T>>),
    Last(Rc<dyn Source<T>>),
    Inert,
}

impl<T: Clone + 'static> Inner<T> {
    fn notify(&self, event: Event) -> Option<T> {
        let flag = &self.dispatching[event.slot()];
        if flag.replace(true) {
            log::trace!("suppressed re-entrant {:?} notification", event);
            return None;
        }
        let _guard = DispatchGuard(flag);

        let listeners: Vec<Rc<Listener<T>>> = match &*self.listeners.borrow() {
            Some(map) => map.get(&event).cloned().unwrap_or_default(),
            None => return None,
        };

        for listener in listeners {
            if !listener.active.get() {
                continue;
            }
            let value = match listener.f.try_borrow_mut() {
                Ok(mut f) => (*f)(event),
                Err(_) => None,
            };
            if value.is_some() {
                return value;
            }
        }
        None
    }

    fn stop_with(&self, n: usize, value: Option<T>) {
        log::debug!("stream stopping with {} values left to shift", n);

        let listeners = self.listeners.borrow_mut().take();
        let previous = {
            let mut state = self.state.borrow_mut();
            match mem::replace(&mut *state, State::Done) {
                State::Active(source) if n > 0 => {
                    *state = State::Stopping { source, remaining: n };
                    None
                }
                State::Stopping { source, remaining } if n > 0 => {
                    *state = State::Stopping { source, remaining: remaining.min(n) };
                    None
                }
                other => Some(other),
            }
        };

        // Sources and listeners may own handles that lead back here
        drop(previous);
        drop(listeners);

        self.resolve(value);
    }

    fn resolve(&self, value: Option<T>) {
        let callbacks = {
            let mut completion = self.completion.borrow_mut();
            if let Completion::Resolved(_) = *completion {
                return;
            }
            match mem::replace(&mut *completion, Completion::Resolved(value.clone())) {
                Completion::Pending(callbacks) => callbacks,
                Completion::Resolved(_) => Vec::new(),
            }
        };

        for callback in callbacks {
            callback(value.clone());
        }
    }
}

/// Lets a source raise events on its stream
pub struct Notifier<T> {
    inner: Weak<Inner<T>>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Notifier { inner: Weak::clone(&self.inner) }
    }
}

impl<T: Clone + 'static> Notifier<T> {
    /// Dispatch `event` to the stream's listeners, returning the first value
    /// a listener supplies
    pub fn notify(&self, event: Event) -> Option<T> {
        self.inner.upgrade().and_then(|inner| inner.notify(event))
    }
}

/// Lets a source stop its stream
pub struct Stopper<T> {
    inner: Weak<Inner<T>>,
}

impl<T> Clone for Stopper<T> {
    fn clone(&self) -> Self {
        Stopper { inner: Weak::clone(&self.inner) }
    }
}

impl<T: Clone + 'static> Stopper<T> {
    /// Stop the stream, allowing `n` more values to be shifted out before it
    /// reports done. `value` resolves the stream's completion.
    pub fn stop(&self, n: usize, value: Option<T>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.stop_with(n, value);
        }
    }
}

/// A single-threaded push/pull stream.
///
/// `Stream` is a cheap handle: clones share the same underlying stream. The
/// source is built lazily on first use, values are pulled with
/// [`shift`](Stream::shift) and listeners are told about new values through
/// [`Event::Push`].
pub struct Stream<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream { inner: Rc::clone(&self.inner) }
    }
}

/// Non-owning handle to a [`Stream`]
pub struct WeakStream<T> {
    inner: Weak<Inner<T>>,
}

impl<T> Clone for WeakStream<T> {
    fn clone(&self) -> Self {
        WeakStream { inner: Weak::clone(&self.inner) }
    }
}

impl<T> WeakStream<T> {
    pub fn upgrade(&self) -> Option<Stream<T>> {
        self.inner.upgrade().map(|inner| Stream { inner })
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.state.try_borrow() {
            Ok(state) => state.name(),
            Err(_) => "busy",
        };
        f.debug_struct("Stream").field("state", &state).finish()
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Create a stream whose source is built by `factory` the first time the
    /// stream is used
    pub fn new<S, F>(factory: F) -> Self
    where
        S: Source<T> + 'static,
        F: FnOnce(Notifier<T>, Stopper<T>) -> S + 'static,
    {
        let factory: Factory<T> =
            Box::new(move |notify, stop| Rc::new(factory(notify, stop)) as Rc<dyn Source<T>>);

        Stream {
            inner: Rc::new(Inner {
                state: RefCell::new(State::Unstarted(factory)),
                listeners: RefCell::new(Some(HashMap::new())),
                next_id: Cell::new(0),
                dispatching: [Cell::new(false), Cell::new(false)],
                completion: RefCell::new(Completion::Pending(Vec::new())),
            }),
        }
    }

    /// A buffered stream holding `values`, open for further pushes
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let values: VecDeque<T> = values.into_iter().collect();
        Self::new(move |notify, stop| BufferSource::new(notify, stop, values))
    }

    /// An empty buffered stream
    pub fn empty() -> Self {
        Self::with_config(&BufferConfig::default())
    }

    pub fn with_config(config: &BufferConfig) -> Self {
        let values = VecDeque::with_capacity(config.initial_capacity);
        Self::new(move |notify, stop| BufferSource::new(notify, stop, values))
    }

    /// A buffered stream that falls back to pulling `upstream` when empty
    pub fn from_functor<F>(upstream: F) -> Self
    where
        F: Functor<Item = T> + 'static,
    {
        Self::new(move |notify, stop| BufferSource::with_upstream(notify, stop, Box::new(upstream)))
    }

    fn ensure_started(&self) {
        let factory = {
            let mut state = self.inner.state.borrow_mut();
            match mem::replace(&mut *state, State::Starting) {
                State::Unstarted(factory) => factory,
                other => {
                    *state = other;
                    return;
                }
            }
        };

        log::debug!("stream source starting");
        let notify = Notifier { inner: Rc::downgrade(&self.inner) };
        let stop = Stopper { inner: Rc::downgrade(&self.inner) };
        let source = factory(notify, stop);

        let orphan = {
            let mut state = self.inner.state.borrow_mut();
            if matches!(*state, State::Starting) {
                *state = State::Active(source);
                None
            } else {
                // stopped while the source was being built
                Some(source)
            }
        };
        drop(orphan);
    }

    fn active_source(&self) -> Option<Rc<dyn Source<T>>> {
        self.ensure_started();
        match &*self.inner.state.borrow() {
            State::Active(source) => Some(Rc::clone(source)),
            _ => None,
        }
    }

    /// Pull the next value
    pub fn shift(&self) -> Option<T> {
        self.ensure_started();

        let step = {
            let mut state = self.inner.state.borrow_mut();
            match &mut *state {
                State::Active(source) => Step::Shift(Rc::clone(source)),
                State::Stopping { source, remaining } => {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 {
                        Step::Last(Rc::clone(source))
                    } else {
                        Step::Shift(Rc::clone(source))
                    }
                }
                _ => Step::Inert,
            }
        };

        match step {
            Step::Shift(source) => source.shift(),
            Step::Last(source) => {
                let previous = mem::replace(&mut *self.inner.state.borrow_mut(), State::Done);
                drop(previous);
                source.shift()
            }
            Step::Inert => None,
        }
    }

    /// Push a value into the stream's source. Ignored once stopped.
    pub fn push(&self, value: T) -> &Self {
        self.extend(std::iter::once(value))
    }

    /// Push several values at once; listeners hear a single `Push`
    pub fn extend<I>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = T>,
    {
        match self.active_source() {
            Some(source) => source.push(values.into_iter().collect()),
            None => log::trace!("push to a stopped stream ignored"),
        }
        self
    }

    /// Build the source, if that hasn't happened yet, and start it
    pub fn start(&self) -> &Self {
        if let Some(source) = self.active_source() {
            source.start();
        }
        self
    }

    /// Ask the source to stop. Each source decides how many buffered values
    /// remain available afterwards.
    pub fn stop(&self) -> &Self {
        if let Some(source) = self.active_source() {
            source.stop();
        }
        self
    }

    /// Stop now, leaving exactly `n` more values to be shifted
    pub fn stop_after(&self, n: usize) -> &Self {
        // the values to keep live in the source, so it has to exist first
        self.ensure_started();
        self.inner.stop_with(n, None);
        self
    }

    pub fn status(&self) -> Status {
        match *self.inner.state.borrow() {
            State::Done => Status::Done,
            _ => Status::Active,
        }
    }

    /// Register `f` to run once the stream stops. Runs straight away if it
    /// already has.
    pub fn then<F>(&self, f: F) -> &Self
    where
        F: FnOnce(Option<T>) + 'static,
    {
        let resolved = match &*self.inner.completion.borrow() {
            Completion::Resolved(value) => Some(value.clone()),
            Completion::Pending(_) => None,
        };

        match resolved {
            Some(value) => f(value),
            None => {
                if let Completion::Pending(callbacks) = &mut *self.inner.completion.borrow_mut() {
                    callbacks.push(Box::new(f));
                }
            }
        }
        self
    }

    /// A future resolving once the stream stops.
    ///
    /// If every handle to the stream is dropped before it stops, the future
    /// resolves to `None` rather than staying pending forever.
    pub fn done(&self) -> Done<T> {
        let (tx, rx) = oneshot::channel();
        self.then(move |value| {
            let _ = tx.send(value);
        });
        Done { receiver: rx }
    }

    pub fn on<F>(&self, event: Event, f: F) -> ListenerId
    where
        F: FnMut(Event) -> Option<T> + 'static,
    {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        match &mut *self.inner.listeners.borrow_mut() {
            Some(map) => map.entry(event).or_default().push(Rc::new(Listener {
                id,
                active: Cell::new(true),
                f: RefCell::new(Box::new(f)),
            })),
            None => log::trace!("listener on a stopped stream ignored"),
        }
        id
    }

    /// Consume everything available now, then keep consuming on every push
    pub fn each<F>(self, f: F) -> Self
    where
        F: FnMut(T) + 'static,
    {
        let sink = Rc::new(RefCell::new(f));
        drain(&self, &sink);

        let weak = self.downgrade();
        self.on(Event::Push, move |_| {
            if let Some(stream) = weak.upgrade() {
                drain(&stream, &sink);
            }
            None
        });
        self
    }

    /// Deliver every value to an async channel. The receiver ends once the
    /// stream stops and has been drained.
    pub fn subscribe(self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded();
        let closer = tx.clone();
        let stream = self.each(move |value| {
            let _ = tx.unbounded_send(value);
        });
        stream.then(move |_| closer.close_channel());
        rx
    }
}

impl<T> Stream<T> {
    /// Remove one listener; returns whether it was registered
    pub fn off(&self, event: Event, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.inner.listeners.borrow_mut();
            let list = match listeners.as_mut().and_then(|map| map.get_mut(&event)) {
                Some(list) => list,
                None => return false,
            };
            list.iter().position(|l| l.id == id).map(|at| list.remove(at))
        };

        match removed {
            Some(listener) => {
                listener.active.set(false);
                true
            }
            None => false,
        }
    }

    /// Remove every listener for `event`
    pub fn off_event(&self, event: Event) {
        let removed = self
            .inner
            .listeners
            .borrow_mut()
            .as_mut()
            .and_then(|map| map.remove(&event));
        for listener in removed.into_iter().flatten() {
            listener.active.set(false);
        }
    }

    /// Remove every listener
    pub fn off_all(&self) {
        let removed = self
            .inner
            .listeners
            .borrow_mut()
            .as_mut()
            .map(mem::take);
        for listener in removed.into_iter().flat_map(|map| map.into_values()).flatten() {
            listener.active.set(false);
        }
    }

    pub fn downgrade(&self) -> WeakStream<T> {
        WeakStream { inner: Rc::downgrade(&self.inner) }
    }

    /// True when both handles refer to the same stream
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn drain<T, F>(stream: &Stream<T>, sink: &RefCell<F>)
where
    T: Clone + 'static,
    F: FnMut(T),
{
    let mut sink = match sink.try_borrow_mut() {
        Ok(sink) => sink,
        Err(_) => return,
    };
    while let Some(value) = stream.shift() {
        (*sink)(value);
    }
}

impl<T: Clone + 'static> Functor for Stream<T> {
    type Item = T;

    fn shift(&mut self) -> Option<T> {
        Stream::shift(self)
    }

    fn status(&self) -> Status {
        Stream::status(self)
    }

    fn observe(&self, mut listener: Box<dyn FnMut()>) -> bool {
        self.on(Event::Push, move |_| {
            listener();
            None
        });
        true
    }
}

impl<T: Clone + 'static> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(values: I) -> Self {
        Stream::of(values)
    }
}

impl<T: Clone + 'static> Default for Stream<T> {
    fn default() -> Self {
        Stream::empty()
    }
}

/// Future returned by [`Stream::done`]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Done<T> {
    receiver: oneshot::Receiver<Option<T>>,
}

impl<T> Future for Done<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(value),
            // the stream was dropped without ever stopping
            Poll::Ready(Err(_)) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
