use fnstream::curry::{cache, curry, flip, once, Applied, Curried};
use fnstream::StreamError;
use std::cell::Cell;
use std::rc::Rc;

fn sum3() -> Curried<i32, i32> {
    curry(|args: &[i32]| args.iter().sum(), false, 3).unwrap()
}

#[test]
fn test_partial_application_matches_full_call() {
    let f = sum3();

    let full = f.call(vec![1, 2, 3]).unwrap().value();
    let stepwise = f
        .call1(1)
        .partial()
        .unwrap()
        .call1(2)
        .partial()
        .unwrap()
        .call1(3)
        .value();
    let mixed = f
        .call(vec![1])
        .unwrap()
        .partial()
        .unwrap()
        .call(vec![2, 3])
        .unwrap()
        .value();

    assert_eq!(full, Some(6));
    assert_eq!(stepwise, Some(6));
    assert_eq!(mixed, Some(6));
}

#[test]
fn test_partials_report_remaining_arity() {
    let f = sum3();
    assert_eq!(f.arity(), 3);

    let g = f.call(vec![1, 2]).unwrap().partial().unwrap();
    assert_eq!(g.arity(), 1);
    assert_eq!(g.call1(10).value(), Some(13));
}

#[test]
fn test_partials_are_memoised_by_argument() {
    let f = sum3();
    let a = f.call1(1).partial().unwrap();
    let b = f.call1(1).partial().unwrap();
    let c = f.call1(2).partial().unwrap();

    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&c));
}

#[test]
fn test_final_results_are_cached_unless_mutable() {
    let calls = Rc::new(Cell::new(0));

    let counter = Rc::clone(&calls);
    let f = curry(
        move |args: &[i32]| {
            counter.set(counter.get() + 1);
            args[0] * args[1]
        },
        false,
        2,
    )
    .unwrap();
    let times3 = f.call1(3).partial().unwrap();
    assert_eq!(times3.call1(4).value(), Some(12));
    assert_eq!(times3.call1(4).value(), Some(12));
    assert_eq!(calls.get(), 1);

    calls.set(0);
    let counter = Rc::clone(&calls);
    let g = curry(
        move |args: &[i32]| {
            counter.set(counter.get() + 1);
            args[0] * args[1]
        },
        true,
        2,
    )
    .unwrap();
    let times3 = g.call1(3).partial().unwrap();
    times3.call1(4);
    times3.call1(4);
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_extra_arguments_are_handed_back() {
    let mul = curry(|args: &[i32]| args[0] * args[1], false, 2).unwrap();
    match mul.call(vec![2, 3, 4]).unwrap() {
        Applied::Over(value, rest) => {
            assert_eq!(value, 6);
            assert_eq!(rest, vec![4]);
        }
        other => panic!("expected extra arguments, got {:?}", other),
    }
}

#[test]
fn test_arity_errors() {
    let f = sum3();
    assert!(matches!(f.call(vec![]), Err(StreamError::Arity { expected: 3, got: 0 })));
    assert!(curry(|args: &[i32]| args.len(), false, 0).is_err());
}

#[test]
fn test_cache_memoises_single_argument_functions() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let square = cache(move |x: &i32| {
        counter.set(counter.get() + 1);
        x * x
    });

    assert_eq!(square.get(3), 9);
    assert_eq!(square.get(3), 9);
    assert_eq!(calls.get(), 1);
    assert_eq!(square.len(), 1);

    assert_eq!(square.call(&[4]), Ok(16));
    assert_eq!(square.call(&[1, 2]), Err(StreamError::Arity { expected: 1, got: 2 }));
}

#[test]
fn test_once_and_flip() {
    let mut inc = once(|x: i32| x + 1);
    assert_eq!(inc(1), Some(2));
    assert_eq!(inc(5), None);

    let sub = flip(|a: i32, b: i32| a - b);
    assert_eq!(sub(1, 10), 9);
}

#[test]
fn test_applied_debug_output() {
    let f = sum3();
    assert_eq!(format!("{:?}", f.call1(1)), "Partial(2 remaining)");
    assert_eq!(format!("{:?}", f.call(vec![1, 2, 3]).unwrap()), "Done");
    assert_eq!(format!("{:?}", f.call(vec![1, 2, 3, 4, 5]).unwrap()), "Over(2 extra)");
}
