//! Rate limiting and timing sources: throttle, choke, clock
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::core::{Event, Notifier, Stopper, Stream};
use super::source::Source;
use crate::scheduler::Scheduler;
use crate::stream_configuration::TimerConfig;
use crate::throttle::Wait;
use crate::timer::{RequestId, RequestTimer};

// ================================
// Throttle
// ================================

struct ThrottleState<T> {
    value: Option<T>,
    request: Option<RequestId>,
    closed: bool,
}

/// Keeps only the newest pushed value and announces it once per timer
/// frame. Stopping discards a value still waiting for its frame.
pub struct ThrottleSource<T> {
    state: Rc<RefCell<ThrottleState<T>>>,
    timer: Rc<dyn RequestTimer>,
    notify: Notifier<T>,
    stop: Stopper<T>,
}

impl<T: Clone + 'static> ThrottleSource<T> {
    pub fn new(notify: Notifier<T>, stop: Stopper<T>, timer: Rc<dyn RequestTimer>) -> Self {
        ThrottleSource {
            state: Rc::new(RefCell::new(ThrottleState { value: None, request: None, closed: false })),
            timer,
            notify,
            stop,
        }
    }

    fn schedule(&self) {
        let state = Rc::downgrade(&self.state);
        let notify = self.notify.clone();
        let id = self.timer.request(Box::new(move |_| {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().request = None;
            }
            notify.notify(Event::Push);
        }));
        self.state.borrow_mut().request = Some(id);
    }
}

impl<T: Clone + 'static> Source<T> for ThrottleSource<T> {
    fn shift(&self) -> Option<T> {
        self.state.borrow_mut().value.take()
    }

    fn push(&self, mut values: Vec<T>) {
        let latest = match values.pop() {
            Some(latest) => latest,
            None => return,
        };

        let schedule = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            if state.value.is_some() {
                log::trace!("throttled value superseded before its frame");
            }
            state.value = Some(latest);
            state.request.is_none()
        };

        if schedule {
            self.schedule();
        }
    }

    fn stop(&self) {
        let request = {
            let mut state = self.state.borrow_mut();
            state.closed = true;
            state.value = None;
            state.request.take()
        };
        if let Some(id) = request {
            self.timer.cancel(id);
        }
        self.stop.stop(0, None);
    }
}

impl<T> Drop for ThrottleSource<T> {
    fn drop(&mut self) {
        let request = self.state.borrow_mut().request.take();
        if let Some(id) = request {
            self.timer.cancel(id);
        }
    }
}

// ================================
// Choke
// ================================

/// Emits the newest value only after `time` seconds without a push
pub struct ChokeSource<T> {
    latest: Rc<RefCell<Option<T>>>,
    wait: Wait<T>,
    stop: Stopper<T>,
}

impl<T: Clone + 'static> ChokeSource<T> {
    pub fn new(notify: Notifier<T>, stop: Stopper<T>, time: f64, scheduler: Rc<dyn Scheduler>) -> Self {
        let latest = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&latest);
        let wait = Wait::new(
            move |value| {
                *slot.borrow_mut() = Some(value);
                notify.notify(Event::Push);
            },
            time,
            scheduler,
        );
        ChokeSource { latest, wait, stop }
    }
}

impl<T: Clone + 'static> Source<T> for ChokeSource<T> {
    fn shift(&self) -> Option<T> {
        self.latest.borrow_mut().take()
    }

    fn push(&self, mut values: Vec<T>) {
        if let Some(value) = values.pop() {
            self.wait.call(value);
        }
    }

    fn stop(&self) {
        self.wait.cancel();
        self.stop.stop(0, None);
    }
}

// ================================
// Clock
// ================================

struct ClockState {
    timer: Rc<dyn RequestTimer>,
    notify: Notifier<f64>,
    value: Cell<Option<f64>>,
    request: Cell<Option<RequestId>>,
    running: Cell<bool>,
}

impl ClockState {
    fn schedule(self: &Rc<Self>) {
        let this = Rc::clone(self);
        let id = self.timer.request(Box::new(move |time| this.frame(time)));
        self.request.set(Some(id));
    }

    fn frame(self: &Rc<Self>, time: f64) {
        self.request.set(None);
        if !self.running.get() {
            return;
        }
        // the timestamp only exists while listeners are being told about it
        self.value.set(Some(time));
        self.notify.notify(Event::Push);
        self.value.set(None);
        if self.running.get() {
            self.schedule();
        }
    }

    fn halt(&self) {
        self.running.set(false);
        if let Some(id) = self.request.take() {
            self.timer.cancel(id);
        }
    }
}

/// Emits the timer's timestamp on every frame until stopped
pub struct ClockSource {
    state: Rc<ClockState>,
    stop: Stopper<f64>,
}

impl ClockSource {
    pub fn new(notify: Notifier<f64>, stop: Stopper<f64>, timer: Rc<dyn RequestTimer>) -> Self {
        let state = Rc::new(ClockState {
            timer,
            notify,
            value: Cell::new(None),
            request: Cell::new(None),
            running: Cell::new(true),
        });
        state.schedule();
        ClockSource { state, stop }
    }
}

impl Source<f64> for ClockSource {
    fn shift(&self) -> Option<f64> {
        self.state.value.take()
    }

    fn stop(&self) {
        self.state.halt();
        self.stop.stop(0, None);
    }
}

impl Drop for ClockSource {
    fn drop(&mut self) {
        self.state.halt();
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// A stream emitting at most one value, the newest, per timer frame
    pub fn throttled(timer: Rc<dyn RequestTimer>) -> Self {
        Stream::new(move |notify, stop| ThrottleSource::new(notify, stop, timer))
    }

    /// A stream emitting the newest value once pushes pause for `time` seconds
    pub fn choked(time: f64, scheduler: Rc<dyn Scheduler>) -> Self {
        Stream::new(move |notify, stop| ChokeSource::new(notify, stop, time, scheduler))
    }

    /// A choked stream using the configured default delay
    pub fn choked_from_config(config: &TimerConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::choked(config.choke_delay, scheduler)
    }
}

impl Stream<f64> {
    /// A stream of frame timestamps. The clock starts when the stream is
    /// first used, for example by [`start`](Stream::start) or `each`.
    pub fn clock(timer: Rc<dyn RequestTimer>) -> Self {
        Stream::new(move |notify, stop| ClockSource::new(notify, stop, timer))
    }
}
