use std::rc::Rc;

/// A Pipe is a reusable function from `I` to `O` that can be composed with
/// other pipes. Cloning a pipe shares the underlying function.
pub struct Pipe<I, O> {
    f: Rc<dyn Fn(I) -> O + 'static>,
}

impl<I, O> Clone for Pipe<I, O> {
    fn clone(&self) -> Self {
        Pipe {
            f: Rc::clone(&self.f),
        }
    }
}

impl<I, O> Pipe<I, O> {
    /// Create a new pipe from a function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(I) -> O + 'static,
    {
        Pipe { f: Rc::new(f) }
    }

    /// Apply this pipe to a value
    pub fn apply(&self, input: I) -> O {
        (self.f)(input)
    }
}

impl<I: 'static, O: 'static> Pipe<I, O> {
    /// Run `self`, then `next`
    pub fn then<P: 'static>(self, next: Pipe<O, P>) -> Pipe<I, P> {
        Pipe::new(move |input| next.apply(self.apply(input)))
    }
}

/// Right-to-left composition: `compose(f2, f1)(x) == f2(f1(x))`
pub fn compose<A, B, C, F2, F1>(f2: F2, f1: F1) -> impl Fn(A) -> C
where
    F1: Fn(A) -> B,
    F2: Fn(B) -> C,
{
    move |a| f2(f1(a))
}

/// Left-to-right composition of same-typed steps, folded over the input
pub fn pipe<T: 'static>(fns: Vec<Box<dyn Fn(T) -> T>>) -> Pipe<T, T> {
    Pipe::new(move |value| fns.iter().fold(value, |acc, f| f(acc)))
}

/// Identity pipe that returns its input unchanged
pub fn identity<T: 'static>() -> Pipe<T, T> {
    Pipe::new(|input| input)
}
