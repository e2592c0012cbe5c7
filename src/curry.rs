//! Arity-based partial application
//!
//! Rust closures already capture arguments, so the curried form here is the
//! dynamic one: a function over a slice of uniformly typed arguments that can
//! be fed a few at a time. Intermediate partials are memoised by argument value,
//! so `f(1)` called twice hands back the same partial.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::error::{StreamError, StreamResult};

/// Outcome of feeding arguments to a [`Curried`] function
pub enum Applied<A, R> {
    /// Not enough arguments yet
    Partial(Curried<A, R>),
    /// Exactly `arity` arguments were collected
    Done(R),
    /// More than `arity` arguments were given; the extras are handed back to be
    /// forwarded to the result when it is itself callable
    Over(R, Vec<A>),
}

impl<A, R> Applied<A, R> {
    /// The computed value, if the function was saturated
    pub fn value(self) -> Option<R> {
        match self {
            Applied::Done(value) | Applied::Over(value, _) => Some(value),
            Applied::Partial(_) => None,
        }
    }

    pub fn partial(self) -> Option<Curried<A, R>> {
        match self {
            Applied::Partial(curried) => Some(curried),
            _ => None,
        }
    }
}

impl<A, R> fmt::Debug for Applied<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Applied::Partial(c) => write!(f, "Partial({} remaining)", c.arity()),
            Applied::Done(_) => write!(f, "Done"),
            Applied::Over(_, rest) => write!(f, "Over({} extra)", rest.len()),
        }
    }
}

type Body<A, R> = Rc<dyn Fn(&[A]) -> R>;

struct Inner<A, R> {
    f: Body<A, R>,
    bound: Vec<A>,
    arity: usize,
    mutable: bool,
    partials: RefCell<HashMap<A, Curried<A, R>>>,
    results: RefCell<HashMap<A, R>>,
}

/// A function of `arity` arguments that accepts them in any number of calls
pub struct Curried<A, R> {
    inner: Rc<Inner<A, R>>,
}

impl<A, R> Clone for Curried<A, R> {
    fn clone(&self) -> Self {
        Curried { inner: Rc::clone(&self.inner) }
    }
}

/// Curry `f` over `arity` arguments.
///
/// With `mutable` set the final argument is never used as a cache key, which
/// is required whenever `f` has side effects or its last argument is mutated
/// between calls.
pub fn curry<A, R, F>(f: F, mutable: bool, arity: usize) -> StreamResult<Curried<A, R>>
where
    A: Eq + Hash + Clone + 'static,
    R: Clone + 'static,
    F: Fn(&[A]) -> R + 'static,
{
    if arity == 0 {
        return Err(StreamError::Arity { expected: 1, got: 0 });
    }
    Ok(Curried::with_bound(Rc::new(f), Vec::new(), arity, mutable))
}

impl<A, R> Curried<A, R> {
    /// Arguments still expected
    pub fn arity(&self) -> usize {
        self.inner.arity
    }
}

impl<A, R> Curried<A, R>
where
    A: Eq + Hash + Clone + 'static,
    R: Clone + 'static,
{
    fn with_bound(f: Body<A, R>, bound: Vec<A>, arity: usize, mutable: bool) -> Self {
        Curried {
            inner: Rc::new(Inner {
                f,
                bound,
                arity,
                mutable,
                partials: RefCell::new(HashMap::new()),
                results: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Feed one or more arguments
    pub fn call(&self, mut args: Vec<A>) -> StreamResult<Applied<A, R>> {
        let arity = self.inner.arity;
        let n = args.len();

        if n > 1 && n == arity {
            return Ok(Applied::Done(self.apply(&args)));
        }

        if n > arity {
            let rest = args.split_off(arity);
            return Ok(Applied::Over(self.apply(&args), rest));
        }

        let mut args = args.into_iter();
        let first = match args.next() {
            Some(first) => first,
            None => return Err(StreamError::Arity { expected: arity, got: 0 }),
        };
        let rest: Vec<A> = args.collect();

        match self.memo(first) {
            Applied::Partial(next) if !rest.is_empty() => next.call(rest),
            other => Ok(other),
        }
    }

    /// Feed a single argument
    pub fn call1(&self, arg: A) -> Applied<A, R> {
        self.memo(arg)
    }

    fn apply(&self, args: &[A]) -> R {
        if self.inner.bound.is_empty() {
            return (self.inner.f)(args);
        }
        let mut all = self.inner.bound.clone();
        all.extend_from_slice(args);
        (self.inner.f)(&all)
    }

    fn memo(&self, arg: A) -> Applied<A, R> {
        let inner = &self.inner;

        if inner.arity == 1 {
            if inner.mutable {
                return Applied::Done(self.apply(std::slice::from_ref(&arg)));
            }
            if let Some(value) = inner.results.borrow().get(&arg) {
                return Applied::Done(value.clone());
            }
            let value = self.apply(std::slice::from_ref(&arg));
            inner.results.borrow_mut().insert(arg, value.clone());
            return Applied::Done(value);
        }

        if let Some(partial) = inner.partials.borrow().get(&arg) {
            return Applied::Partial(partial.clone());
        }

        let mut bound = inner.bound.clone();
        bound.push(arg.clone());
        let partial = Curried::with_bound(Rc::clone(&inner.f), bound, inner.arity - 1, inner.mutable);
        inner.partials.borrow_mut().insert(arg, partial.clone());
        Applied::Partial(partial)
    }

    /// True when both handles are the same memoised partial
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// A one-argument function whose results are memoised by argument value
pub struct Cached<A, R> {
    f: Box<dyn Fn(&A) -> R>,
    map: RefCell<HashMap<A, R>>,
}

pub fn cache<A, R, F>(f: F) -> Cached<A, R>
where
    A: Eq + Hash + Clone,
    R: Clone,
    F: Fn(&A) -> R + 'static,
{
    Cached {
        f: Box::new(f),
        map: RefCell::new(HashMap::new()),
    }
}

impl<A, R> Cached<A, R>
where
    A: Eq + Hash + Clone,
    R: Clone,
{
    pub fn get(&self, arg: A) -> R {
        if let Some(value) = self.map.borrow().get(&arg) {
            return value.clone();
        }
        let value = (self.f)(&arg);
        self.map.borrow_mut().insert(arg, value.clone());
        value
    }

    /// Call with a dynamic argument list; anything other than one argument is an error
    pub fn call(&self, args: &[A]) -> StreamResult<R> {
        match args {
            [arg] => Ok(self.get(arg.clone())),
            _ => Err(StreamError::Arity { expected: 1, got: args.len() }),
        }
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

/// Wrap `f` so it runs at most once; later calls return `None`
pub fn once<A, R, F>(f: F) -> impl FnMut(A) -> Option<R>
where
    F: FnOnce(A) -> R,
{
    let mut f = Some(f);
    move |arg| f.take().map(|f| f(arg))
}

/// Swap the two arguments of `f`
pub fn flip<A, B, R, F>(f: F) -> impl Fn(B, A) -> R
where
    F: Fn(A, B) -> R,
{
    move |b, a| f(a, b)
}
