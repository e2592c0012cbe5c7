//! Configuration types for streams and timers

use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// Buffer configuration for stream sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Capacity reserved up front by a `BufferSource`
    pub initial_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { initial_capacity: 16 }
    }
}

impl BufferConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

/// Timing defaults, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Interval of the frame timer used when no explicit duration is given
    pub frame_duration: f64,
    /// Silence required before a choked stream emits
    pub choke_delay: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            frame_duration: 1.0 / 60.0,
            choke_delay: 0.0,
        }
    }
}

impl TimerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame duration in seconds
    pub fn frame_duration(mut self, seconds: f64) -> Self {
        self.frame_duration = seconds;
        self
    }

    /// Set the default choke delay in seconds
    pub fn choke_delay(mut self, seconds: f64) -> Self {
        self.choke_delay = seconds;
        self
    }
}

/// Top level configuration, loadable from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub buffer: BufferConfig,
    pub timer: TimerConfig,
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(mut self, buffer: BufferConfig) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn timer(mut self, timer: TimerConfig) -> Self {
        self.timer = timer;
        self
    }

    /// Parse and validate a configuration from a JSON document
    pub fn from_json(json: &str) -> StreamResult<Self> {
        let config: StreamConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> StreamResult<()> {
        let frame = self.timer.frame_duration;
        if !frame.is_finite() || frame <= 0.0 {
            return Err(StreamError::Config(format!(
                "frame duration must be a positive number of seconds, got {}",
                frame
            )));
        }

        let choke = self.timer.choke_delay;
        if !choke.is_finite() || choke < 0.0 {
            return Err(StreamError::Config(format!(
                "choke delay cannot be negative, got {}",
                choke
            )));
        }

        Ok(())
    }
}
