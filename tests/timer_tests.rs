use fnstream::{
    RequestTimer, Scheduler, Status, Stream, StreamError, StreamTimer, Throttle, Timer, TimerConfig,
    TokioScheduler, VirtualScheduler, Wait,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn recorder<T: 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(T) + Clone + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |value| sink.borrow_mut().push(value))
}

#[test]
fn test_virtual_scheduler_fires_in_deadline_order() {
    let scheduler = VirtualScheduler::new();
    let (seen, record) = recorder();

    let r = record.clone();
    scheduler.set_timeout(0.5, Box::new(move || r("late")));
    let r = record.clone();
    scheduler.set_timeout(0.25, Box::new(move || r("early")));
    let r = record.clone();
    let cancelled = scheduler.set_timeout(0.25, Box::new(move || r("cancelled")));
    scheduler.clear_timeout(cancelled);

    assert_eq!(scheduler.pending(), 2);
    assert_eq!(scheduler.advance(0.25), 1);
    assert_eq!(scheduler.now(), 0.25);
    assert_eq!(scheduler.advance(1.0), 1);
    assert_eq!(*seen.borrow(), vec!["early", "late"]);
}

#[test]
fn test_timer_first_request_fires_on_next_tick() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let timer = Timer::new(0.25, scheduler.clone()).unwrap();
    let (seen, record) = recorder();

    timer.request(Box::new(move |t| record(t)));
    assert!(seen.borrow().is_empty());

    scheduler.run_until_idle();
    assert_eq!(*seen.borrow(), vec![0.0]);
}

#[test]
fn test_timer_batches_requests_into_frames() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let timer = Timer::new(0.25, scheduler.clone()).unwrap();
    let (seen, record) = recorder();

    let r = record.clone();
    timer.request(Box::new(move |t| r(t)));
    scheduler.run_until_idle();

    // the next frame is a full duration after the previous one
    let r = record.clone();
    timer.request(Box::new(move |t| r(t)));
    let r = record.clone();
    timer.request(Box::new(move |t| r(t)));
    assert_eq!(timer.queued(), 2);

    scheduler.advance(0.125);
    assert_eq!(seen.borrow().len(), 1);

    scheduler.advance(0.125);
    assert_eq!(*seen.borrow(), vec![0.0, 0.25, 0.25]);
    assert_eq!(timer.queued(), 0);
}

#[test]
fn test_timer_cancel_withdraws_callback() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let timer = Timer::new(0.25, scheduler.clone()).unwrap();
    let (seen, record) = recorder::<f64>();

    let id = timer.request(Box::new(move |t| record(t)));
    timer.cancel(id);

    assert_eq!(scheduler.pending(), 0);
    scheduler.advance(1.0);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_timer_rejects_bad_durations() {
    let scheduler: Rc<dyn Scheduler> = Rc::new(VirtualScheduler::new());
    assert!(matches!(Timer::new(-1.0, scheduler.clone()), Err(StreamError::Config(_))));
    assert!(matches!(Timer::new(f64::NAN, scheduler.clone()), Err(StreamError::Config(_))));

    let frame = Timer::frame(scheduler.clone()).unwrap();
    assert_eq!(frame.duration(), 1.0 / 60.0);

    let configured = Timer::from_config(&TimerConfig::new().frame_duration(0.5), scheduler).unwrap();
    assert_eq!(configured.duration(), 0.5);
}

#[test]
fn test_stream_timer_runs_on_ticks() {
    let ticks: Stream<f64> = Stream::empty();
    let timer = StreamTimer::new(ticks.clone());
    let (seen, record) = recorder();

    // a callback that asks for another frame waits for the next tick
    let again = timer.clone();
    let r = record.clone();
    timer.request(Box::new(move |t| {
        r(t);
        let r = r.clone();
        again.request(Box::new(move |t| r(t)));
    }));

    ticks.push(1.0);
    assert_eq!(*seen.borrow(), vec![1.0]);
    assert_eq!(timer.now(), 1.0);

    ticks.push(2.0);
    assert_eq!(*seen.borrow(), vec![1.0, 2.0]);

    ticks.push(3.0);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn test_throttle_calls_once_per_frame_with_latest_args() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let timer: Rc<dyn RequestTimer> = Rc::new(Timer::new(0.25, scheduler.clone()).unwrap());
    let (seen, record) = recorder();

    let throttle = Throttle::new(record, timer);
    throttle.call(1);
    throttle.call(2);
    throttle.call(3);
    assert!(throttle.is_pending());
    assert!(seen.borrow().is_empty());

    scheduler.run_until_idle();
    assert_eq!(*seen.borrow(), vec![3]);
    assert!(!throttle.is_pending());
}

#[test]
fn test_throttle_cancel_can_flush_last_call() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let timer: Rc<dyn RequestTimer> = Rc::new(Timer::new(0.25, scheduler.clone()).unwrap());
    let (seen, record) = recorder();

    let throttle = Throttle::new(record, timer);
    throttle.call(4);
    throttle.cancel(true);
    assert_eq!(*seen.borrow(), vec![4]);

    throttle.call(5);
    scheduler.advance(1.0);
    assert_eq!(*seen.borrow(), vec![4]);
}

#[test]
fn test_throttle_cancel_drops_pending_call() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let timer: Rc<dyn RequestTimer> = Rc::new(Timer::new(0.25, scheduler.clone()).unwrap());
    let (seen, record) = recorder::<i32>();

    let throttle = Throttle::new(record, timer);
    throttle.call(4);
    throttle.cancel(false);
    scheduler.advance(1.0);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_wait_restarts_on_every_call() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let (seen, record) = recorder();
    let wait = Wait::new(record, 0.5, scheduler.clone());

    wait.call(1);
    scheduler.advance(0.25);
    wait.call(2);
    scheduler.advance(0.25);
    assert!(seen.borrow().is_empty());
    assert!(wait.is_pending());

    scheduler.advance(0.25);
    assert_eq!(*seen.borrow(), vec![2]);
    assert!(!wait.is_pending());
}

#[test]
fn test_wait_cancel() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let (seen, record) = recorder::<i32>();
    let wait = Wait::new(record, 0.5, scheduler.clone());

    wait.call(1);
    wait.cancel();
    wait.call(2);
    scheduler.advance(2.0);
    assert!(seen.borrow().is_empty());
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test]
async fn test_tokio_scheduler_drives_timers() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let scheduler = Rc::new(TokioScheduler::new());
            let timer: Rc<dyn RequestTimer> = Rc::new(Timer::new(0.01, scheduler.clone()).unwrap());

            let throttled = Stream::throttled(timer);
            throttled.push(1);
            throttled.push(2);

            let (seen, record) = recorder();
            let wait = Wait::new(record, 0.02, scheduler);
            wait.call("a");
            wait.call("b");

            tokio::time::sleep(Duration::from_millis(100)).await;

            assert_eq!(throttled.shift(), Some(2));
            assert_eq!(throttled.status(), Status::Active);
            assert_eq!(*seen.borrow(), vec!["b"]);
        })
        .await;
}
