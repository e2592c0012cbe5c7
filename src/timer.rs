//! Frame timers
//!
//! A [`RequestTimer`] batches callbacks into frames: everything requested
//! before a frame fires runs together and receives the frame's timestamp.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use crate::error::{StreamError, StreamResult};
use crate::scheduler::{Scheduler, TaskId};
use crate::stream::Stream;
use crate::stream_configuration::TimerConfig;

/// Handle to a requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

pub trait RequestTimer {
    /// Time of the most recent frame, or the current time for timers that
    /// track a clock
    fn now(&self) -> f64;

    /// Run `callback` on the next frame
    fn request(&self, callback: Box<dyn FnOnce(f64)>) -> RequestId;

    /// Withdraw a callback that has not run yet
    fn cancel(&self, id: RequestId);
}

type Callback = (RequestId, Box<dyn FnOnce(f64)>);

struct TimerInner {
    this: Weak<TimerInner>,
    duration: f64,
    scheduler: Rc<dyn Scheduler>,
    queue: RefCell<VecDeque<Callback>>,
    armed: Cell<Option<TaskId>>,
    last: Cell<f64>,
    next_id: Cell<u64>,
}

/// Runs queued callbacks at most once every `duration` seconds. The first
/// request after an idle period fires on the next tick rather than waiting a
/// full frame.
#[derive(Clone)]
pub struct Timer {
    inner: Rc<TimerInner>,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("duration", &self.inner.duration)
            .field("queued", &self.inner.queue.borrow().len())
            .finish()
    }
}

impl Timer {
    pub fn new(duration: f64, scheduler: Rc<dyn Scheduler>) -> StreamResult<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(StreamError::Config(format!(
                "timer duration must be a non-negative number of seconds, got {}",
                duration
            )));
        }

        Ok(Timer {
            inner: Rc::new_cyclic(|this| TimerInner {
                this: this.clone(),
                duration,
                scheduler,
                queue: RefCell::new(VecDeque::new()),
                armed: Cell::new(None),
                last: Cell::new(f64::NEG_INFINITY),
                next_id: Cell::new(0),
            }),
        })
    }

    /// A timer firing at the default frame rate
    pub fn frame(scheduler: Rc<dyn Scheduler>) -> StreamResult<Self> {
        Self::from_config(&TimerConfig::default(), scheduler)
    }

    pub fn from_config(config: &TimerConfig, scheduler: Rc<dyn Scheduler>) -> StreamResult<Self> {
        Self::new(config.frame_duration, scheduler)
    }

    pub fn duration(&self) -> f64 {
        self.inner.duration
    }

    /// Callbacks waiting for the next frame
    pub fn queued(&self) -> usize {
        self.inner.queue.borrow().len()
    }
}

impl TimerInner {
    fn arm(&self) {
        if self.armed.get().is_some() {
            return;
        }

        let this = self.this.clone();
        let fire: Box<dyn FnOnce()> = Box::new(move || {
            if let Some(timer) = this.upgrade() {
                timer.frame();
            }
        });

        let t1 = self.scheduler.now();
        let t0 = self.last.get();
        let task = if t0 + self.duration > t1 {
            self.scheduler.set_timeout(t0 + self.duration - t1, fire)
        } else {
            self.scheduler.request_tick(fire)
        };
        self.armed.set(Some(task));
    }

    fn frame(&self) {
        self.armed.set(None);
        let t0 = self.scheduler.now();
        self.last.set(t0);

        // Only callbacks queued before the frame began belong to it
        let batch: Vec<RequestId> = self.queue.borrow().iter().map(|(id, _)| *id).collect();
        log::trace!("timer frame at {:.3}s running {} callbacks", t0, batch.len());

        for id in batch {
            let callback = {
                let mut queue = self.queue.borrow_mut();
                queue
                    .iter()
                    .position(|(queued, _)| *queued == id)
                    .and_then(|at| queue.remove(at))
            };
            if let Some((_, callback)) = callback {
                callback(t0);
            }
        }

        if !self.queue.borrow().is_empty() {
            self.arm();
        }
    }
}

impl RequestTimer for Timer {
    fn now(&self) -> f64 {
        self.inner.scheduler.now()
    }

    fn request(&self, callback: Box<dyn FnOnce(f64)>) -> RequestId {
        let id = RequestId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.queue.borrow_mut().push_back((id, callback));
        self.inner.arm();
        id
    }

    fn cancel(&self, id: RequestId) {
        let removed = {
            let mut queue = self.inner.queue.borrow_mut();
            queue
                .iter()
                .position(|(queued, _)| *queued == id)
                .and_then(|at| queue.remove(at))
        };
        drop(removed);

        if self.inner.queue.borrow().is_empty() {
            if let Some(task) = self.inner.armed.take() {
                self.inner.scheduler.clear_timeout(task);
            }
        }
    }
}

struct StreamTimerInner {
    pending: RefCell<Vec<Callback>>,
    last: Cell<f64>,
    next_id: Cell<u64>,
}

/// A timer whose frames are the values of a stream of timestamps. Callbacks
/// requested while a frame is running wait for the following one.
#[derive(Clone)]
pub struct StreamTimer {
    inner: Rc<StreamTimerInner>,
    ticks: Stream<f64>,
}

impl fmt::Debug for StreamTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamTimer")
            .field("last", &self.inner.last.get())
            .field("pending", &self.inner.pending.borrow().len())
            .finish()
    }
}

impl StreamTimer {
    pub fn new(ticks: Stream<f64>) -> Self {
        let inner = Rc::new(StreamTimerInner {
            pending: RefCell::new(Vec::new()),
            last: Cell::new(f64::NEG_INFINITY),
            next_id: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let ticks = ticks.each(move |time| {
            if let Some(inner) = weak.upgrade() {
                inner.last.set(time);
                let batch = mem::take(&mut *inner.pending.borrow_mut());
                for (_, callback) in batch {
                    callback(time);
                }
            }
        });

        StreamTimer { inner, ticks }
    }

    /// The stream driving this timer
    pub fn ticks(&self) -> &Stream<f64> {
        &self.ticks
    }
}

impl RequestTimer for StreamTimer {
    fn now(&self) -> f64 {
        self.inner.last.get()
    }

    fn request(&self, callback: Box<dyn FnOnce(f64)>) -> RequestId {
        let id = RequestId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.pending.borrow_mut().push((id, callback));
        id
    }

    fn cancel(&self, id: RequestId) {
        let removed = {
            let mut pending = self.inner.pending.borrow_mut();
            pending
                .iter()
                .position(|(queued, _)| *queued == id)
                .map(|at| pending.remove(at))
        };
        drop(removed);
    }
}
