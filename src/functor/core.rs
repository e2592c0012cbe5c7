//! Core functor trait and its extension combinators

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::hash::Hash;
use std::rc::Rc;

use crate::scheduler::Scheduler;
use crate::stream::{Event, Stream};
use crate::timer::RequestTimer;

use super::advanced::{Chunk, Concat, Fork, Join, Partition, Sort, Split, Syphon};
use super::utility::{Dedup, First, Iter, Latest, Tap, Unique};

/// Lifecycle of a functor or stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Active,
    /// No further values will be produced
    Done,
}

/// A lazy, single-pass source of values.
///
/// `shift` returning `None` means "nothing right now". Only [`Status::Done`]
/// means nothing ever again; a live stream can return `None` and produce more
/// after the next push.
pub trait Functor {
    type Item;

    /// Pull the next value
    fn shift(&mut self) -> Option<Self::Item>;

    fn status(&self) -> Status {
        Status::Active
    }

    fn is_done(&self) -> bool {
        self.status() == Status::Done
    }

    /// Register a callback fired whenever new values may have become
    /// available upstream. Returns false for purely pull-driven functors,
    /// which never announce anything.
    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        let _ = listener;
        false
    }
}

impl<F: Functor + ?Sized> Functor for Box<F> {
    type Item = F::Item;

    fn shift(&mut self) -> Option<Self::Item> {
        (**self).shift()
    }

    fn status(&self) -> Status {
        (**self).status()
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        (**self).observe(listener)
    }
}

impl<F: Functor + ?Sized> Functor for &mut F {
    type Item = F::Item;

    fn shift(&mut self) -> Option<Self::Item> {
        (**self).shift()
    }

    fn status(&self) -> Status {
        (**self).status()
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        (**self).observe(listener)
    }
}

/// A deque drains from the front and is done once empty
impl<T> Functor for VecDeque<T> {
    type Item = T;

    fn shift(&mut self) -> Option<T> {
        self.pop_front()
    }

    fn status(&self) -> Status {
        if self.is_empty() {
            Status::Done
        } else {
            Status::Active
        }
    }
}

/// Extension trait providing functor combinators
pub trait FunctorExt: Functor + Sized {
    fn boxed<'a>(self) -> Box<dyn Functor<Item = Self::Item> + 'a>
    where Self: 'a;
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where F: FnMut(Self::Item) -> U;
    fn filter<F>(self, f: F) -> Filter<Self, F>
    where F: FnMut(&Self::Item) -> bool;
    fn fold<B, F>(self, seed: B, f: F) -> Fold<Self, B, F>
    where B: Clone, F: FnMut(B, Self::Item) -> B;
    fn take(self, n: usize) -> Take<Self>;
    fn rest(self, n: usize) -> Rest<Self>;
    fn chunk(self, n: usize) -> Chunk<Self>;
    fn split<F>(self, f: F) -> Split<Self, F>
    where F: FnMut(&Self::Item) -> bool;
    fn partition<K, F>(self, key: F) -> Partition<Self, K, F>
    where
        Self: 'static,
        Self::Item: Clone + 'static,
        K: Eq + Hash + Clone + 'static,
        F: FnMut(&Self::Item) -> K + 'static;
    fn unique(self) -> Unique<Self>
    where Self::Item: PartialEq + Clone;
    fn dedup(self) -> Dedup<Self>
    where Self::Item: PartialEq + Clone;
    fn sort(self) -> Sort<Self, fn(&Self::Item, &Self::Item) -> Ordering>
    where Self::Item: Ord;
    fn sort_by<F>(self, cmp: F) -> Sort<Self, F>
    where F: FnMut(&Self::Item, &Self::Item) -> Ordering;
    fn concat<G>(self, other: G) -> Concat<Self, G>
    where G: Functor<Item = Self::Item>;
    fn join(self) -> Join<Self>
    where Self::Item: Functor;
    fn chain<U, F>(self, f: F) -> Join<Map<Self, F>>
    where F: FnMut(Self::Item) -> U, U: Functor;
    fn fork(self) -> (Fork<Self>, Fork<Self>)
    where Self::Item: Clone;
    /// Split into `(remainder, matched)` readers by `f`
    fn syphon<F>(self, f: F) -> (Syphon<Self, F>, Syphon<Self, F>)
    where F: FnMut(&Self::Item) -> bool;
    fn catch<T, E, F>(self, f: F) -> Catch<Self, F>
    where Self: Functor<Item = Result<T, E>>, F: FnMut(E) -> T;
    fn unshift<I>(self, values: I) -> Unshift<Self>
    where I: IntoIterator<Item = Self::Item>;
    fn first(self) -> First<Self>;
    fn latest(self) -> Latest<Self>;
    fn tap<F>(self, f: F) -> Tap<Self, F>
    where F: FnMut(&Self::Item);
    fn iter(self) -> Iter<Self>;

    /// Drain everything available, then keep draining whenever upstream
    /// announces new values
    fn each<F>(self, f: F)
    where Self: 'static, F: FnMut(Self::Item) + 'static;
    fn reduce<B, F>(self, seed: B, f: F) -> B
    where F: FnMut(B, Self::Item) -> B;
    fn find<F>(self, f: F) -> Option<Self::Item>
    where F: FnMut(&Self::Item) -> bool;
    fn to_vec(self) -> Vec<Self::Item>;
    /// Make this functor the upstream of `target`, returning `target`
    fn pipe(self, target: &Stream<Self::Item>) -> Stream<Self::Item>
    where Self: 'static, Self::Item: Clone + 'static;
    fn throttle(self, timer: Rc<dyn RequestTimer>) -> Stream<Self::Item>
    where Self: 'static, Self::Item: Clone + 'static;
    fn choke(self, time: f64, scheduler: Rc<dyn Scheduler>) -> Stream<Self::Item>
    where Self: 'static, Self::Item: Clone + 'static;
}

impl<S: Functor + Sized> FunctorExt for S {
    fn boxed<'a>(self) -> Box<dyn Functor<Item = Self::Item> + 'a>
    where Self: 'a,
    {
        Box::new(self)
    }

    fn map<U, F>(self, f: F) -> Map<Self, F>
    where F: FnMut(Self::Item) -> U,
    {
        Map { source: self, f }
    }

    fn filter<F>(self, f: F) -> Filter<Self, F>
    where F: FnMut(&Self::Item) -> bool,
    {
        Filter { source: self, f }
    }

    fn fold<B, F>(self, seed: B, f: F) -> Fold<Self, B, F>
    where B: Clone, F: FnMut(B, Self::Item) -> B,
    {
        Fold { source: self, acc: Some(seed), seeded: false, f }
    }

    fn take(self, n: usize) -> Take<Self> {
        Take { source: self, remaining: n }
    }

    fn rest(self, n: usize) -> Rest<Self> {
        Rest { source: self, skip: n }
    }

    fn chunk(self, n: usize) -> Chunk<Self> {
        Chunk::new(self, n)
    }

    fn split<F>(self, f: F) -> Split<Self, F>
    where F: FnMut(&Self::Item) -> bool,
    {
        Split::new(self, f)
    }

    fn partition<K, F>(self, key: F) -> Partition<Self, K, F>
    where
        Self: 'static,
        Self::Item: Clone + 'static,
        K: Eq + Hash + Clone + 'static,
        F: FnMut(&Self::Item) -> K + 'static,
    {
        Partition::new(self, key)
    }

    fn unique(self) -> Unique<Self>
    where Self::Item: PartialEq + Clone,
    {
        Unique::new(self)
    }

    fn dedup(self) -> Dedup<Self>
    where Self::Item: PartialEq + Clone,
    {
        Dedup::new(self)
    }

    fn sort(self) -> Sort<Self, fn(&Self::Item, &Self::Item) -> Ordering>
    where Self::Item: Ord,
    {
        Sort::new(self, Ord::cmp as fn(&Self::Item, &Self::Item) -> Ordering)
    }

    fn sort_by<F>(self, cmp: F) -> Sort<Self, F>
    where F: FnMut(&Self::Item, &Self::Item) -> Ordering,
    {
        Sort::new(self, cmp)
    }

    fn concat<G>(self, other: G) -> Concat<Self, G>
    where G: Functor<Item = Self::Item>,
    {
        Concat::new(self, other)
    }

    fn join(self) -> Join<Self>
    where Self::Item: Functor,
    {
        Join::new(self)
    }

    fn chain<U, F>(self, f: F) -> Join<Map<Self, F>>
    where F: FnMut(Self::Item) -> U, U: Functor,
    {
        Join::new(self.map(f))
    }

    fn fork(self) -> (Fork<Self>, Fork<Self>)
    where Self::Item: Clone,
    {
        Fork::pair(self)
    }

    fn syphon<F>(self, f: F) -> (Syphon<Self, F>, Syphon<Self, F>)
    where F: FnMut(&Self::Item) -> bool,
    {
        Syphon::pair(self, f)
    }

    fn catch<T, E, F>(self, f: F) -> Catch<Self, F>
    where Self: Functor<Item = Result<T, E>>, F: FnMut(E) -> T,
    {
        Catch { source: self, f }
    }

    fn unshift<I>(self, values: I) -> Unshift<Self>
    where I: IntoIterator<Item = Self::Item>,
    {
        Unshift { source: self, front: values.into_iter().collect() }
    }

    fn first(self) -> First<Self> {
        First::new(self)
    }

    fn latest(self) -> Latest<Self> {
        Latest::new(self)
    }

    fn tap<F>(self, f: F) -> Tap<Self, F>
    where F: FnMut(&Self::Item),
    {
        Tap::new(self, f)
    }

    fn iter(self) -> Iter<Self> {
        Iter::new(self)
    }

    fn each<F>(self, f: F)
    where Self: 'static, F: FnMut(Self::Item) + 'static,
    {
        let source = Rc::new(RefCell::new(self));
        let sink = Rc::new(RefCell::new(f));
        drain_into(&source, &sink);

        let (s, k) = (Rc::clone(&source), Rc::clone(&sink));
        let observed = source.borrow().observe(Box::new(move || drain_into(&s, &k)));
        if !observed {
            log::trace!("each() over a pull-only functor finished after one drain");
        }
    }

    fn reduce<B, F>(mut self, seed: B, mut f: F) -> B
    where F: FnMut(B, Self::Item) -> B,
    {
        let mut acc = seed;
        while let Some(value) = self.shift() {
            acc = f(acc, value);
        }
        acc
    }

    fn find<F>(mut self, mut f: F) -> Option<Self::Item>
    where F: FnMut(&Self::Item) -> bool,
    {
        while let Some(value) = self.shift() {
            if f(&value) {
                return Some(value);
            }
        }
        None
    }

    fn to_vec(mut self) -> Vec<Self::Item> {
        let mut values = Vec::new();
        while let Some(value) = self.shift() {
            values.push(value);
        }
        values
    }

    fn pipe(self, target: &Stream<Self::Item>) -> Stream<Self::Item>
    where Self: 'static, Self::Item: Clone + 'static,
    {
        let source = Rc::new(RefCell::new(self));

        let pull = Rc::clone(&source);
        target.on(Event::Pull, move |_| {
            pull.try_borrow_mut().ok().and_then(|mut s| s.shift())
        });

        let weak = target.downgrade();
        let push = Rc::clone(&source);
        let observed = source.borrow().observe(Box::new(move || {
            if let Some(target) = weak.upgrade() {
                flush_into(&push, &target);
            }
        }));

        if observed {
            flush_into(&source, target);
        }

        target.clone()
    }

    fn throttle(self, timer: Rc<dyn RequestTimer>) -> Stream<Self::Item>
    where Self: 'static, Self::Item: Clone + 'static,
    {
        let target = Stream::throttled(timer);
        let source = Rc::new(RefCell::new(self));
        flush_into(&source, &target);

        let weak = target.downgrade();
        let push = Rc::clone(&source);
        source.borrow().observe(Box::new(move || {
            if let Some(target) = weak.upgrade() {
                flush_into(&push, &target);
            }
        }));
        target
    }

    fn choke(self, time: f64, scheduler: Rc<dyn Scheduler>) -> Stream<Self::Item>
    where Self: 'static, Self::Item: Clone + 'static,
    {
        let target = Stream::choked(time, scheduler);
        let source = Rc::new(RefCell::new(self));
        flush_into(&source, &target);

        let weak = target.downgrade();
        let push = Rc::clone(&source);
        source.borrow().observe(Box::new(move || {
            if let Some(target) = weak.upgrade() {
                flush_into(&push, &target);
            }
        }));
        target
    }
}

// A busy source or sink means a drain is already running further up the call
// stack; it will see anything we would have delivered.
fn drain_into<S, F>(source: &Rc<RefCell<S>>, sink: &Rc<RefCell<F>>)
where
    S: Functor,
    F: FnMut(S::Item),
{
    let mut sink = match sink.try_borrow_mut() {
        Ok(sink) => sink,
        Err(_) => return,
    };
    loop {
        let value = match source.try_borrow_mut() {
            Ok(mut source) => source.shift(),
            Err(_) => return,
        };
        match value {
            Some(value) => (*sink)(value),
            None => return,
        }
    }
}

fn flush_into<S>(source: &Rc<RefCell<S>>, target: &Stream<S::Item>)
where
    S: Functor,
    S::Item: Clone + 'static,
{
    loop {
        let value = match source.try_borrow_mut() {
            Ok(mut source) => source.shift(),
            Err(_) => return,
        };
        match value {
            Some(value) => {
                target.push(value);
            }
            None => return,
        }
    }
}

// Combinator structs

pub struct Map<S, F> {
    source: S,
    f: F,
}

impl<S, U, F> Functor for Map<S, F>
where
    S: Functor,
    F: FnMut(S::Item) -> U,
{
    type Item = U;

    fn shift(&mut self) -> Option<U> {
        self.source.shift().map(&mut self.f)
    }

    fn status(&self) -> Status {
        self.source.status()
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

pub struct Filter<S, F> {
    source: S,
    f: F,
}

impl<S, F> Functor for Filter<S, F>
where
    S: Functor,
    F: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        loop {
            let value = self.source.shift()?;
            if (self.f)(&value) {
                return Some(value);
            }
        }
    }

    fn status(&self) -> Status {
        self.source.status()
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

/// Running accumulation. The seed is emitted first, then the accumulator after
/// every upstream value.
pub struct Fold<S, B, F> {
    source: S,
    acc: Option<B>,
    seeded: bool,
    f: F,
}

impl<S, B, F> Functor for Fold<S, B, F>
where
    S: Functor,
    B: Clone,
    F: FnMut(B, S::Item) -> B,
{
    type Item = B;

    fn shift(&mut self) -> Option<B> {
        if !self.seeded {
            self.seeded = true;
            return self.acc.clone();
        }
        let value = self.source.shift()?;
        let acc = self.acc.take()?;
        let next = (self.f)(acc, value);
        self.acc = Some(next.clone());
        Some(next)
    }

    fn status(&self) -> Status {
        if self.seeded {
            self.source.status()
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

pub struct Take<S> {
    source: S,
    remaining: usize,
}

impl<S: Functor> Functor for Take<S> {
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.source.shift()?;
        self.remaining -= 1;
        Some(value)
    }

    fn status(&self) -> Status {
        if self.remaining == 0 {
            Status::Done
        } else {
            self.source.status()
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

/// Skips the first `n` values, then passes everything through
pub struct Rest<S> {
    source: S,
    skip: usize,
}

impl<S: Functor> Functor for Rest<S> {
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        while self.skip > 0 {
            self.source.shift()?;
            self.skip -= 1;
        }
        self.source.shift()
    }

    fn status(&self) -> Status {
        self.source.status()
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

/// Replaces errors in a fallible functor with a fallback value
pub struct Catch<S, F> {
    source: S,
    f: F,
}

impl<S, T, E, F> Functor for Catch<S, F>
where
    S: Functor<Item = Result<T, E>>,
    F: FnMut(E) -> T,
{
    type Item = T;

    fn shift(&mut self) -> Option<T> {
        match self.source.shift()? {
            Ok(value) => Some(value),
            Err(error) => Some((self.f)(error)),
        }
    }

    fn status(&self) -> Status {
        self.source.status()
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

/// Values placed in front of the upstream
pub struct Unshift<S: Functor> {
    source: S,
    front: VecDeque<S::Item>,
}

impl<S: Functor> Functor for Unshift<S> {
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        match self.front.pop_front() {
            Some(value) => Some(value),
            None => self.source.shift(),
        }
    }

    fn status(&self) -> Status {
        if self.front.is_empty() {
            self.source.status()
        } else {
            Status::Active
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}
