use fnstream::{
    of, BufferConfig, FunctorExt, Stream, StreamConfig, StreamError, Timer, TimerConfig,
    VirtualScheduler,
};
use std::rc::Rc;

#[test]
fn test_error_messages() {
    assert_eq!(
        StreamError::CombineArity(1).to_string(),
        "combine requires at least 2 source streams, got 1"
    );
    assert_eq!(
        StreamError::Arity { expected: 2, got: 3 }.to_string(),
        "function called with 3 arguments, expected 2"
    );
    assert_eq!(StreamError::InvalidPath("a..b".into()).to_string(), "invalid path \"a..b\"");
    assert_eq!(StreamError::Custom("boom".into()).to_string(), "stream error: boom");
}

#[test]
fn test_errors_travel_as_items_until_caught() {
    let values: Vec<Result<i32, &str>> = vec![Ok(1), Err("x"), Ok(3)];

    let raw = of(values.clone()).to_vec();
    assert_eq!(raw, values);

    let recovered = of(values).catch(|_| -1).to_vec();
    assert_eq!(recovered, vec![1, -1, 3]);
}

#[test]
fn test_config_defaults() {
    let config = StreamConfig::default();
    assert_eq!(config.buffer.initial_capacity, 16);
    assert_eq!(config.timer.frame_duration, 1.0 / 60.0);
    assert_eq!(config.timer.choke_delay, 0.0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_json_fills_missing_fields() {
    let config = StreamConfig::from_json(r#"{"timer": {"frame_duration": 0.5}}"#).unwrap();
    assert_eq!(config.timer.frame_duration, 0.5);
    assert_eq!(config.timer.choke_delay, 0.0);
    assert_eq!(config.buffer, BufferConfig::default());
}

#[test]
fn test_config_rejects_invalid_values() {
    assert!(matches!(StreamConfig::from_json("not json"), Err(StreamError::Config(_))));
    assert!(matches!(
        StreamConfig::from_json(r#"{"timer": {"frame_duration": 0}}"#),
        Err(StreamError::Config(_))
    ));
    assert!(matches!(
        StreamConfig::from_json(r#"{"timer": {"choke_delay": -1.0}}"#),
        Err(StreamError::Config(_))
    ));
}

#[test]
fn test_config_builders_feed_streams_and_timers() {
    let config = StreamConfig::new()
        .buffer(BufferConfig::new().initial_capacity(4))
        .timer(TimerConfig::new().frame_duration(0.25).choke_delay(0.5));
    assert!(config.validate().is_ok());

    let stream: Stream<i32> = Stream::with_config(&config.buffer);
    stream.extend(vec![1, 2]);
    assert_eq!(stream.to_vec(), vec![1, 2]);

    let scheduler = Rc::new(VirtualScheduler::new());
    let timer = Timer::from_config(&config.timer, scheduler.clone()).unwrap();
    assert_eq!(timer.duration(), 0.25);

    let choked: Stream<i32> = Stream::choked_from_config(&config.timer, scheduler.clone());
    choked.push(7);
    scheduler.advance(0.25);
    assert_eq!(choked.shift(), None);
    scheduler.advance(0.25);
    assert_eq!(choked.shift(), Some(7));
}

#[test]
fn test_config_round_trips_through_json() {
    let config = StreamConfig::new().timer(TimerConfig::new().choke_delay(0.25));
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(StreamConfig::from_json(&json).unwrap(), config);
}
