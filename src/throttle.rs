//! Call-rate limiting for plain functions

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::scheduler::{Scheduler, TaskId};
use crate::timer::{RequestId, RequestTimer};

struct ThrottleInner<A> {
    f: RefCell<Box<dyn FnMut(A)>>,
    timer: Rc<dyn RequestTimer>,
    args: RefCell<Option<A>>,
    request: Cell<Option<RequestId>>,
    cancelled: Cell<bool>,
}

impl<A> ThrottleInner<A> {
    fn update(&self) {
        self.request.set(None);
        let args = self.args.borrow_mut().take();
        if let Some(args) = args {
            if let Ok(mut f) = self.f.try_borrow_mut() {
                (*f)(args);
            }
        }
    }
}

/// Coalesces calls so `f` runs at most once per timer frame, with the
/// arguments of the most recent call
pub struct Throttle<A> {
    inner: Rc<ThrottleInner<A>>,
}

impl<A: 'static> Throttle<A> {
    pub fn new<F>(f: F, timer: Rc<dyn RequestTimer>) -> Self
    where
        F: FnMut(A) + 'static,
    {
        Throttle {
            inner: Rc::new(ThrottleInner {
                f: RefCell::new(Box::new(f)),
                timer,
                args: RefCell::new(None),
                request: Cell::new(None),
                cancelled: Cell::new(false),
            }),
        }
    }

    pub fn call(&self, args: A) {
        let inner = &self.inner;
        if inner.cancelled.get() {
            return;
        }

        *inner.args.borrow_mut() = Some(args);
        if inner.request.get().is_some() {
            return;
        }

        let weak: Weak<ThrottleInner<A>> = Rc::downgrade(inner);
        let id = inner.timer.request(Box::new(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.update();
            }
        }));
        inner.request.set(Some(id));
    }

    /// Stop throttling. With `call_last` a pending call runs immediately,
    /// otherwise it is dropped. Later calls are ignored.
    pub fn cancel(&self, call_last: bool) {
        let inner = &self.inner;
        if let Some(id) = inner.request.take() {
            inner.timer.cancel(id);
            if call_last {
                inner.update();
            }
        }
        inner.args.borrow_mut().take();
        inner.cancelled.set(true);
    }

    pub fn is_pending(&self) -> bool {
        self.inner.request.get().is_some()
    }
}

struct WaitInner<A> {
    f: RefCell<Box<dyn FnMut(A)>>,
    time: f64,
    scheduler: Rc<dyn Scheduler>,
    args: RefCell<Option<A>>,
    task: Cell<Option<TaskId>>,
    cancelled: Cell<bool>,
}

impl<A> WaitInner<A> {
    fn update(&self) {
        self.task.set(None);
        let args = self.args.borrow_mut().take();
        if let Some(args) = args {
            if let Ok(mut f) = self.f.try_borrow_mut() {
                (*f)(args);
            }
        }
    }
}

/// Debounce: every call restarts the delay, and `f` only runs once `time`
/// seconds pass without a call
pub struct Wait<A> {
    inner: Rc<WaitInner<A>>,
}

impl<A: 'static> Wait<A> {
    pub fn new<F>(f: F, time: f64, scheduler: Rc<dyn Scheduler>) -> Self
    where
        F: FnMut(A) + 'static,
    {
        Wait {
            inner: Rc::new(WaitInner {
                f: RefCell::new(Box::new(f)),
                time,
                scheduler,
                args: RefCell::new(None),
                task: Cell::new(None),
                cancelled: Cell::new(false),
            }),
        }
    }

    pub fn call(&self, args: A) {
        let inner = &self.inner;
        if inner.cancelled.get() {
            return;
        }

        *inner.args.borrow_mut() = Some(args);
        if let Some(task) = inner.task.take() {
            inner.scheduler.clear_timeout(task);
        }

        let weak: Weak<WaitInner<A>> = Rc::downgrade(inner);
        let task = inner.scheduler.set_timeout(
            inner.time,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.update();
                }
            }),
        );
        inner.task.set(Some(task));
    }

    /// Drop any pending call; later calls are ignored
    pub fn cancel(&self) {
        let inner = &self.inner;
        if let Some(task) = inner.task.take() {
            inner.scheduler.clear_timeout(task);
        }
        inner.args.borrow_mut().take();
        inner.cancelled.set(true);
    }

    pub fn is_pending(&self) -> bool {
        self.inner.task.get().is_some()
    }
}
