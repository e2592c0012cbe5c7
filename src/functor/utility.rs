//! Utility functor combinators: unique, dedup, first, latest, tap, iter
use super::core::{Functor, Status};

/// Drops every value equal to one already emitted
pub struct Unique<S: Functor> {
    source: S,
    seen: Vec<S::Item>,
}

impl<S: Functor> Unique<S> {
    pub(crate) fn new(source: S) -> Self {
        Unique { source, seen: Vec::new() }
    }
}

impl<S: Functor> Functor for Unique<S>
where
    S::Item: PartialEq + Clone,
{
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        loop {
            let value = self.source.shift()?;
            if !self.seen.contains(&value) {
                self.seen.push(value.clone());
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

/// Drops values equal to the one emitted immediately before
pub struct Dedup<S: Functor> {
    source: S,
    last: Option<S::Item>,
}

impl<S: Functor> Dedup<S> {
    pub(crate) fn new(source: S) -> Self {
        Dedup { source, last: None }
    }
}

impl<S: Functor> Functor for Dedup<S>
where
    S::Item: PartialEq + Clone,
{
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        loop {
            let value = self.source.shift()?;
            if self.last.as_ref() != Some(&value) {
                self.last = Some(value.clone());
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

/// Only the first value
pub struct First<S> {
    source: S,
    taken: bool,
}

impl<S> First<S> {
    pub(crate) fn new(source: S) -> Self {
        First { source, taken: false }
    }
}

impl<S: Functor> Functor for First<S> {
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        if self.taken {
            return None;
        }
        self.taken = true;
        self.source.shift()
    }

    fn status(&self) -> Status {
        if self.taken {
            Status::Done
        } else {
            self.source.status()
        }
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

/// Drains everything available on each pull and keeps only the newest value
pub struct Latest<S> {
    source: S,
}

impl<S> Latest<S> {
    pub(crate) fn new(source: S) -> Self {
        Latest { source }
    }
}

impl<S: Functor> Functor for Latest<S> {
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        let mut latest = None;
        while let Some(value) = self.source.shift() {
            latest = Some(value);
        }
        latest
    }

    fn status(&self) -> Status {
        self.source.status()
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

/// Runs a side effect on each value without changing it
pub struct Tap<S, F> {
    source: S,
    f: F,
}

impl<S, F> Tap<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Tap { source, f }
    }
}

impl<S, F> Functor for Tap<S, F>
where
    S: Functor,
    F: FnMut(&S::Item),
{
    type Item = S::Item;

    fn shift(&mut self) -> Option<S::Item> {
        let value = self.source.shift()?;
        (self.f)(&value);
        Some(value)
    }

    fn status(&self) -> Status {
        self.source.status()
    }

    fn observe(&self, listener: Box<dyn FnMut()>) -> bool {
        self.source.observe(listener)
    }
}

/// Adapts a functor to [`Iterator`]. Iteration ends at the first empty pull.
pub struct Iter<S> {
    source: S,
}

impl<S> Iter<S> {
    pub(crate) fn new(source: S) -> Self {
        Iter { source }
    }
}

impl<S: Functor> Iterator for Iter<S> {
    type Item = S::Item;

    fn next(&mut self) -> Option<S::Item> {
        self.source.shift()
    }
}
