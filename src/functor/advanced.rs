//! Advanced functor combinators: chunk, split, partition, sort, concat, join, fork, syphon
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::mem;
use std::rc::Rc;

use super::core::{Functor, Status};
use crate::stream::{Event, Stream, WeakStream};

// ================================
// Chunk
// ================================

/// Groups of `size` values. A size of zero drains everything currently
/// available into one group. A short trailing group is only released once
/// the upstream is done.
pub struct Chunk<S: Functor> {
    source: S,
    size: usize,
    buffer: Vec<S::Item>,
}

impl<S: Functor> Chunk<S> {
    pub(crate) fn new(source: S, size: usize) -> Self {
        Chunk { source, size, buffer: Vec::with_capacity(size) }
    }
}

impl<S: Functor> Functor for Chunk<S> {
    type Item = Vec<S::Item>;

    fn shift(&mut self) -> Option<Vec<S::Item>> {
        if self.size == 0 {
            while let Some(value) = self.source.shift() {
                self.buffer.push(value);
            }
            if self.buffer.is_empty() {
                return None;
            }
            return Some(mem::take(&mut self.buffer));
        }

        while self.buffer.len() < self.size {
            match self.source.shift() {
                Some(value) => self.buffer.push(value),
                None if self.source.is_done() && !self.buffer.is_empty() => {
                    return Some(mem::take(&mut self.buffer));
                }
                None => return None,
            }
        }

        Some(mem::replace(&mut self.buffer, Vec::with_capacity(self.size)))
    }

    fn status(&self) -> Status {
        if self.buffer.is_empty() {
            self.source.status()
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

// ================================
// Split
// ================================

/// Starts a new group at every value matching the predicate; the matching
/// value opens the new group
pub struct Split<S: Functor, F> {
    source: S,
    f: F,
    buffer: Vec<S::Item>,
}

impl<S: Functor, F> Split<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Split { source, f, buffer: Vec::new() }
    }
}

impl<S, F> Functor for Split<S, F>
where
    S: Functor,
    F: FnMut(&S::Item) -> bool,
{
    type Item = Vec<S::Item>;

    fn shift(&mut self) -> Option<Vec<S::Item>> {
        loop {
            let value = match self.source.shift() {
                Some(value) => value,
                None if self.buffer.is_empty() => return None,
                None => return Some(mem::take(&mut self.buffer)),
            };

            if (self.f)(&value) {
                let group = mem::replace(&mut self.buffer, vec![value]);
                if !group.is_empty() {
                    return Some(group);
                }
            } else {
                self.buffer.push(value);
            }
        }
    }

    fn status(&self) -> Status {
        if self.buffer.is_empty() {
            self.source.status()
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

// ================================
// Partition
// ================================

struct PartitionState<S: Functor, K, F> {
    source: S,
    key: F,
    parts: HashMap<K, WeakStream<S::Item>>,
    // parts created while a child was pulling, not yet handed out
    fresh: VecDeque<(K, Stream<S::Item>)>,
}

type Shared<S, K, F> = Rc<RefCell<PartitionState<S, K, F>>>;

/// Splits the upstream into one child stream per key. Each child is handed
/// out the first time its key is seen. Pulling any child pulls the shared
/// upstream, routing values for other keys to their own children.
pub struct Partition<S: Functor, K, F> {
    state: Shared<S, K, F>,
}

impl<S, K, F> Partition<S, K, F>
where
    S: Functor + 'static,
    S::Item: Clone + 'static,
    K: Eq + Hash + Clone + 'static,
    F: FnMut(&S::Item) -> K + 'static,
{
    pub(crate) fn new(source: S, key: F) -> Self {
        Partition {
            state: Rc::new(RefCell::new(PartitionState {
                source,
                key,
                parts: HashMap::new(),
                fresh: VecDeque::new(),
            })),
        }
    }

    fn pull(state: &Shared<S, K, F>) -> Option<(K, S::Item)> {
        let mut guard = state.try_borrow_mut().ok()?;
        let st = &mut *guard;
        let value = st.source.shift()?;
        let key = (st.key)(&value);
        Some((key, value))
    }

    fn part(state: &Shared<S, K, F>, key: &K) -> Option<Stream<S::Item>> {
        state.borrow().parts.get(key).and_then(WeakStream::upgrade)
    }

    fn create(state: &Shared<S, K, F>, key: K) -> Stream<S::Item> {
        let stream = Stream::empty();
        let owner = Rc::clone(state);
        let wanted = key.clone();
        stream.on(Event::Pull, move |_| Self::pull_for(&owner, &wanted));
        state.borrow_mut().parts.insert(key, stream.downgrade());
        stream
    }

    // A child ran dry: keep pulling the upstream until a value for this key
    // turns up, routing everything else
    fn pull_for(state: &Shared<S, K, F>, wanted: &K) -> Option<S::Item> {
        loop {
            let (key, value) = Self::pull(state)?;
            if &key == wanted {
                return Some(value);
            }
            match Self::part(state, &key) {
                Some(stream) => {
                    stream.push(value);
                }
                None => {
                    let stream = Self::create(state, key.clone());
                    stream.push(value);
                    state.borrow_mut().fresh.push_back((key, stream));
                }
            }
        }
    }
}

impl<S, K, F> Functor for Partition<S, K, F>
where
    S: Functor + 'static,
    S::Item: Clone + 'static,
    K: Eq + Hash + Clone + 'static,
    F: FnMut(&S::Item) -> K + 'static,
{
    type Item = (K, Stream<S::Item>);

    fn shift(&mut self) -> Option<Self::Item> {
        loop {
            let fresh = self.state.borrow_mut().fresh.pop_front();
            if fresh.is_some() {
                return fresh;
            }

            let (key, value) = Self::pull(&self.state)?;
            match Self::part(&self.state, &key) {
                Some(stream) => {
                    stream.push(value);
                }
                None => {
                    let stream = Self::create(&self.state, key.clone());
                    stream.push(value);
                    return Some((key, stream));
                }
            }
        }
    }

    fn status(&self) -> Status {
        let state = self.state.borrow();
        if state.fresh.is_empty() {
            state.source.status()
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.state.borrow().source.observe(listener)
    }
}

// ================================
// Sort
// ================================

/// Drains the upstream on every pull and hands out the smallest value seen.
/// Equal values keep their arrival order.
pub struct Sort<S: Functor, F> {
    source: S,
    cmp: F,
    buffer: VecDeque<S::Item>,
}

impl<S: Functor, F> Sort<S, F> {
    pub(crate) fn new(source: S, cmp: F) -> Self {
        Sort { source, cmp, buffer: VecDeque::new() }
    }
}

impl<S, F> Functor for Sort<S, F>
where
    S: Functor,
    F: FnMut(&S::Item, &S::Item) -> Ordering,
{
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        while let Some(value) = self.source.shift() {
            let cmp = &mut self.cmp;
            let at = self.buffer.partition_point(|x| cmp(&value, x) != Ordering::Less);
            self.buffer.insert(at, value);
        }
        self.buffer.pop_front()
    }

    fn status(&self) -> Status {
        if self.buffer.is_empty() {
            self.source.status()
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

// ================================
// Concat
// ================================

/// Everything from the first functor, then the second once the first is done
pub struct Concat<A, B> {
    first: A,
    second: B,
    on_first: bool,
}

impl<A, B> Concat<A, B> {
    pub(crate) fn new(first: A, second: B) -> Self {
        Concat { first, second, on_first: true }
    }
}

impl<A, B> Functor for Concat<A, B>
where
    A: Functor,
    B: Functor<Item = A::Item>,
{
    type Item = A::Item;

    fn shift(&mut self) -> Option<A::Item> {
        if self.on_first {
            if let Some(value) = self.first.shift() {
                return Some(value);
            }
            if !self.first.is_done() {
                return None;
            }
            self.on_first = false;
        }
        self.second.shift()
    }

    fn status(&self) -> Status {
        if self.first.is_done() && self.second.is_done() {
            Status::Done
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        let shared = Rc::new(RefCell::new(listener));
        let other = Rc::clone(&shared);
        let first = self.first.observe(Box::new(move || {
            if let Ok(mut f) = shared.try_borrow_mut() {
                (*f)()
            }
        }));
        let second = self.second.observe(Box::new(move || {
            if let Ok(mut f) = other.try_borrow_mut() {
                (*f)()
            }
        }));
        first || second
    }
}

// ================================
// Join
// ================================

/// Flattens a functor of functors
pub struct Join<S: Functor> {
    source: S,
    inner: Option<S::Item>,
}

impl<S: Functor> Join<S> {
    pub(crate) fn new(source: S) -> Self {
        Join { source, inner: None }
    }
}

impl<S> Functor for Join<S>
where
    S: Functor,
    S::Item: Functor,
{
    type Item = <S::Item as Functor>::Item;

    fn shift(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(inner) = &mut self.inner {
                if let Some(value) = inner.shift() {
                    return Some(value);
                }
            }
            match self.source.shift() {
                Some(next) => self.inner = Some(next),
                None => return None,
            }
        }
    }

    fn status(&self) -> Status {
        let inner_done = self.inner.as_ref().map_or(true, |inner| inner.is_done());
        if inner_done {
            self.source.status()
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

// ================================
// Fork
// ================================

struct ForkState<S: Functor> {
    source: S,
    buffers: [VecDeque<S::Item>; 2],
    done: bool,
}

/// One of two independent readers over a shared upstream. Each value is
/// pulled once and buffered for the other side until it catches up.
pub struct Fork<S: Functor> {
    state: Rc<RefCell<ForkState<S>>>,
    side: usize,
}

impl<S: Functor> Fork<S>
where
    S::Item: Clone,
{
    pub(crate) fn pair(source: S) -> (Self, Self) {
        let state = Rc::new(RefCell::new(ForkState {
            source,
            buffers: [VecDeque::new(), VecDeque::new()],
            done: false,
        }));
        (
            Fork { state: Rc::clone(&state), side: 0 },
            Fork { state, side: 1 },
        )
    }
}

impl<S: Functor> Functor for Fork<S>
where
    S::Item: Clone,
{
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        let mut state = match self.state.try_borrow_mut() {
            Ok(state) => state,
            Err(_) => return None,
        };
        if let Some(value) = state.buffers[self.side].pop_front() {
            return Some(value);
        }
        if state.done {
            return None;
        }

        let value = state.source.shift();
        if state.source.is_done() {
            state.done = true;
        }
        if let Some(value) = &value {
            state.buffers[1 - self.side].push_back(value.clone());
        }
        value
    }

    fn status(&self) -> Status {
        let state = self.state.borrow();
        if state.buffers[self.side].is_empty() && (state.done || state.source.is_done()) {
            Status::Done
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.state.borrow().source.observe(listener)
    }
}

// ================================
// Syphon
// ================================

struct SyphonState<S: Functor, F> {
    source: S,
    f: F,
    // [0] holds values for the remainder, [1] values that matched
    buffers: [VecDeque<S::Item>; 2],
}

/// One side of a predicate split over a shared upstream. Pulling either side
/// parks values meant for the other one until it asks for them.
pub struct Syphon<S: Functor, F> {
    state: Rc<RefCell<SyphonState<S, F>>>,
    matching: bool,
}

impl<S: Functor, F> Syphon<S, F>
where
    F: FnMut(&S::Item) -> bool,
{
    /// Returns `(remainder, matched)`
    pub(crate) fn pair(source: S, f: F) -> (Self, Self) {
        let state = Rc::new(RefCell::new(SyphonState {
            source,
            f,
            buffers: [VecDeque::new(), VecDeque::new()],
        }));
        (
            Syphon { state: Rc::clone(&state), matching: false },
            Syphon { state, matching: true },
        )
    }

    fn side(&self) -> usize {
        usize::from(self.matching)
    }
}

impl<S: Functor, F> Functor for Syphon<S, F>
where
    F: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        let side = self.side();
        let mut guard = match self.state.try_borrow_mut() {
            Ok(state) => state,
            Err(_) => return None,
        };
        let state = &mut *guard;
        if let Some(value) = state.buffers[side].pop_front() {
            return Some(value);
        }

        loop {
            let value = state.source.shift()?;
            if (state.f)(&value) == self.matching {
                return Some(value);
            }
            state.buffers[1 - side].push_back(value);
        }
    }

    fn status(&self) -> Status {
        let state = self.state.borrow();
        if state.buffers[self.side()].is_empty() {
            state.source.status()
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.state.borrow().source.observe(listener)
    }
}
