use fnstream::{FunctorExt, RequestTimer, Scheduler, Status, Stream, Timer, VirtualScheduler};
use std::cell::RefCell;
use std::rc::Rc;

fn collector<T: 'static>() -> (Rc<RefCell<Vec<T>>>, impl FnMut(T) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |value| sink.borrow_mut().push(value))
}

fn setup(duration: f64) -> (Rc<VirtualScheduler>, Rc<dyn RequestTimer>) {
    let scheduler = Rc::new(VirtualScheduler::new());
    let timer: Rc<dyn RequestTimer> = Rc::new(Timer::new(duration, scheduler.clone()).unwrap());
    (scheduler, timer)
}

#[test]
fn test_throttled_stream_emits_latest_once_per_frame() {
    let (scheduler, timer) = setup(0.25);
    let (seen, sink) = collector();
    let stream = Stream::throttled(timer).each(sink);

    stream.push(1);
    stream.push(2);
    stream.push(3);
    assert!(seen.borrow().is_empty());

    scheduler.run_until_idle();
    assert_eq!(*seen.borrow(), vec![3]);

    stream.push(4);
    scheduler.advance(0.125);
    assert_eq!(*seen.borrow(), vec![3]);
    scheduler.advance(0.125);
    assert_eq!(*seen.borrow(), vec![3, 4]);
}

#[test]
fn test_throttle_combinator_over_a_stream() {
    let (scheduler, timer) = setup(0.25);
    let source: Stream<i32> = Stream::empty();
    let (seen, sink) = collector();
    let _throttled = source.clone().throttle(timer).each(sink);

    source.push(1);
    source.push(2);
    assert!(seen.borrow().is_empty());

    scheduler.run_until_idle();
    assert_eq!(*seen.borrow(), vec![2]);
}

#[test]
fn test_throttled_value_can_be_pulled_before_its_frame() {
    let (scheduler, timer) = setup(0.25);
    let stream: Stream<i32> = Stream::throttled(timer);

    stream.push(1);
    assert_eq!(stream.shift(), Some(1));
    assert_eq!(stream.shift(), None);

    // the frame still fires, but finds nothing left to announce
    scheduler.run_until_idle();
    assert_eq!(stream.shift(), None);
}

#[test]
fn test_stopping_a_throttled_stream_drops_the_pending_value() {
    let (scheduler, timer) = setup(0.25);
    let stream: Stream<i32> = Stream::throttled(timer);

    stream.push(9);
    stream.stop();
    assert_eq!(scheduler.pending(), 0);

    scheduler.advance(1.0);
    assert_eq!(stream.shift(), None);
    assert_eq!(stream.status(), Status::Done);
}

#[test]
fn test_choked_stream_waits_for_a_pause() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let stream: Stream<i32> = Stream::choked(0.5, scheduler.clone());

    stream.push(1);
    scheduler.advance(0.25);
    stream.push(2);
    scheduler.advance(0.25);
    assert_eq!(stream.shift(), None);

    scheduler.advance(0.5);
    assert_eq!(stream.shift(), Some(2));
    assert_eq!(stream.shift(), None);
}

#[test]
fn test_choke_combinator_over_a_functor_map() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let source: Stream<i32> = Stream::empty();
    let (seen, sink) = collector();
    let _choked = source.clone().map(|x| x * 10).choke(0.5, scheduler.clone()).each(sink);

    source.push(1);
    source.push(2);
    scheduler.advance(0.25);
    source.push(3);
    scheduler.advance(1.0);

    assert_eq!(*seen.borrow(), vec![30]);
}

#[test]
fn test_clock_ticks_every_frame_until_stopped() {
    let (scheduler, timer) = setup(0.25);
    let (ticks, sink) = collector();
    let clock = Stream::clock(timer).each(sink);

    scheduler.run_until_idle();
    scheduler.advance(0.25);
    scheduler.advance(0.25);
    assert_eq!(*ticks.borrow(), vec![0.0, 0.25, 0.5]);

    // the timestamp is only available while listeners are notified
    assert_eq!(clock.shift(), None);

    clock.stop();
    assert_eq!(clock.status(), Status::Done);
    scheduler.advance(1.0);
    assert_eq!(ticks.borrow().len(), 3);
    assert_eq!(scheduler.now(), 1.5);
}

#[test]
fn test_clock_is_lazy() {
    let (scheduler, timer) = setup(0.25);
    let _clock = Stream::clock(timer);
    assert_eq!(scheduler.pending(), 0);
}
