//! Deferred callback scheduling
//!
//! Timers in this crate never block. They hand callbacks to a [`Scheduler`],
//! which decides what "later" means: [`TokioScheduler`] uses real time on a
//! tokio `LocalSet`, while [`VirtualScheduler`] only moves when told to, which
//! makes timing behaviour fully deterministic in tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Handle to a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

pub trait Scheduler {
    /// Seconds since the scheduler's origin
    fn now(&self) -> f64;

    /// Run `callback` once `delay` seconds have passed
    fn set_timeout(&self, delay: f64, callback: Box<dyn FnOnce()>) -> TaskId;

    /// Cancel a pending callback. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TaskId);

    /// Run `callback` as soon as the current turn has finished
    fn request_tick(&self, callback: Box<dyn FnOnce()>) -> TaskId {
        self.set_timeout(0.0, callback)
    }
}

struct Task {
    id: TaskId,
    due: f64,
    callback: Box<dyn FnOnce()>,
}

struct VirtualState {
    now: Cell<f64>,
    next_id: Cell<u64>,
    tasks: RefCell<Vec<Task>>,
}

/// A scheduler driven by hand. Nothing runs until [`advance`](Self::advance)
/// is called; callbacks then fire in deadline order, with ties broken by the
/// order they were scheduled in.
#[derive(Clone)]
pub struct VirtualScheduler {
    inner: Rc<VirtualState>,
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualScheduler")
            .field("now", &self.inner.now.get())
            .field("pending", &self.pending())
            .finish()
    }
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    pub fn starting_at(now: f64) -> Self {
        VirtualScheduler {
            inner: Rc::new(VirtualState {
                now: Cell::new(now),
                next_id: Cell::new(0),
                tasks: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Number of callbacks waiting to fire
    pub fn pending(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Move the clock forward, firing every callback that falls due on the
    /// way. Callbacks scheduled while advancing run too if they fall within
    /// the window. Returns how many callbacks ran.
    pub fn advance(&self, seconds: f64) -> usize {
        let target = self.inner.now.get() + seconds.max(0.0);
        let mut fired = 0;

        while let Some(task) = self.pop_due(target) {
            if task.due > self.inner.now.get() {
                self.inner.now.set(task.due);
            }
            (task.callback)();
            fired += 1;
        }

        if target > self.inner.now.get() {
            self.inner.now.set(target);
        }
        fired
    }

    /// Fire everything due now without moving the clock
    pub fn run_until_idle(&self) -> usize {
        self.advance(0.0)
    }

    fn pop_due(&self, until: f64) -> Option<Task> {
        let mut tasks = self.inner.tasks.borrow_mut();
        let at = tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due <= until)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(at, _)| at)?;
        Some(tasks.remove(at))
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> f64 {
        self.inner.now.get()
    }

    fn set_timeout(&self, delay: f64, callback: Box<dyn FnOnce()>) -> TaskId {
        let id = TaskId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        let due = self.inner.now.get() + delay.max(0.0);
        self.inner.tasks.borrow_mut().push(Task { id, due, callback });
        id
    }

    fn clear_timeout(&self, id: TaskId) {
        let removed = {
            let mut tasks = self.inner.tasks.borrow_mut();
            tasks.iter().position(|task| task.id == id).map(|at| tasks.remove(at))
        };
        // dropped outside the borrow: a callback may own handles back into us
        drop(removed);
    }
}

struct TokioState {
    origin: Instant,
    next_id: Cell<u64>,
    handles: RefCell<HashMap<TaskId, JoinHandle<()>>>,
}

/// Real-time scheduler backed by `tokio::task::spawn_local`.
///
/// Every call must happen inside a [`tokio::task::LocalSet`], since callbacks
/// capture single-threaded handles and cannot be sent across threads.
#[derive(Clone)]
pub struct TokioScheduler {
    inner: Rc<TokioState>,
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("pending", &self.inner.handles.borrow().len())
            .finish()
    }
}

impl TokioScheduler {
    pub fn new() -> Self {
        TokioScheduler {
            inner: Rc::new(TokioState {
                origin: Instant::now(),
                next_id: Cell::new(0),
                handles: RefCell::new(HashMap::new()),
            }),
        }
    }

    fn forget(state: &Weak<TokioState>, id: TaskId) {
        if let Some(state) = state.upgrade() {
            state.handles.borrow_mut().remove(&id);
        }
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> f64 {
        self.inner.origin.elapsed().as_secs_f64()
    }

    fn set_timeout(&self, delay: f64, callback: Box<dyn FnOnce()>) -> TaskId {
        let id = TaskId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let delay = if delay.is_finite() && delay > 0.0 {
            Duration::from_secs_f64(delay)
        } else {
            Duration::ZERO
        };

        let state = Rc::downgrade(&self.inner);
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            Self::forget(&state, id);
            callback();
        });
        self.inner.handles.borrow_mut().insert(id, handle);
        id
    }

    fn clear_timeout(&self, id: TaskId) {
        let handle = self.inner.handles.borrow_mut().remove(&id);
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn request_tick(&self, callback: Box<dyn FnOnce()>) -> TaskId {
        let id = TaskId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let state = Rc::downgrade(&self.inner);
        let handle = tokio::task::spawn_local(async move {
            tokio::task::yield_now().await;
            Self::forget(&state, id);
            callback();
        });
        self.inner.handles.borrow_mut().insert(id, handle);
        id
    }
}
