//! Functor constructors: from_fn, from_iter, of, from_sparse, nothing

use std::fmt;
use std::marker::PhantomData;

use super::core::{Functor, Status};

/// Wraps a producer closure. One value is always fetched ahead so the functor
/// knows it is done as soon as the producer runs dry, not one pull later.
pub struct FromFn<T, F> {
    f: F,
    next: Option<T>,
}

/// Build a functor from a producer; the producer runs once immediately
pub fn from_fn<T, F>(mut f: F) -> FromFn<T, F>
where
    F: FnMut() -> Option<T>,
{
    let next = f();
    FromFn { f, next }
}

impl<T, F> Functor for FromFn<T, F>
where
    F: FnMut() -> Option<T>,
{
    type Item = T;

    fn shift(&mut self) -> Option<T> {
        let value = self.next.take()?;
        self.next = (self.f)();
        Some(value)
    }

    fn status(&self) -> Status {
        if self.next.is_some() {
            Status::Active
        } else {
            Status::Done
        }
    }
}

impl<T: fmt::Debug, F> fmt::Debug for FromFn<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").field("next", &self.next).finish()
    }
}

/// Functor over any iterator, with the same look-ahead as [`FromFn`]
#[derive(Debug, Clone)]
pub struct FromIter<I: Iterator> {
    iter: I,
    next: Option<I::Item>,
}

pub fn from_iter<I: IntoIterator>(values: I) -> FromIter<I::IntoIter> {
    let mut iter = values.into_iter();
    let next = iter.next();
    FromIter { iter, next }
}

/// Functor over a fixed list of values
pub fn of<T, I>(values: I) -> FromIter<I::IntoIter>
where
    I: IntoIterator<Item = T>,
{
    from_iter(values)
}

/// Functor over a sparse list, skipping the holes
pub fn from_sparse<T, I>(values: I) -> FromIter<std::iter::Flatten<I::IntoIter>>
where
    I: IntoIterator<Item = Option<T>>,
{
    from_iter(values.into_iter().flatten())
}

impl<I: Iterator> Functor for FromIter<I> {
    type Item = I::Item;

    fn shift(&mut self) -> Option<I::Item> {
        let value = self.next.take()?;
        self.next = self.iter.next();
        Some(value)
    }

    fn status(&self) -> Status {
        if self.next.is_some() {
            Status::Active
        } else {
            Status::Done
        }
    }
}

/// A functor that is born done
pub struct Nothing<T> {
    _phantom: PhantomData<fn() -> T>,
}

pub const fn nothing<T>() -> Nothing<T> {
    Nothing { _phantom: PhantomData }
}

impl<T> Clone for Nothing<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Nothing<T> {}

impl<T> Default for Nothing<T> {
    fn default() -> Self {
        nothing()
    }
}

impl<T> fmt::Debug for Nothing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nothing")
    }
}

impl<T> Functor for Nothing<T> {
    type Item = T;

    fn shift(&mut self) -> Option<T> {
        None
    }

    fn status(&self) -> Status {
        Status::Done
    }
}
