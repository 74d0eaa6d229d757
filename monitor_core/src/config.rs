use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// What a producer experiences when a collection's command queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Wait for queue capacity. Only the submitting task is delayed.
    #[default]
    Block,
    /// Discard the command and count it as dropped.
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// Slots in each collection's command queue. Larger values tolerate
    /// higher producer burst rates at the cost of higher worst-case read
    /// staleness.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Raw samples buffered per point before they are folded.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    #[serde(with = "humantime_serde", default = "default_flush_interval")]
    pub flush_interval: Duration,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfigFile {
    pub monitor: MonitorConfig,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_flush_interval() -> Duration {
    DEFAULT_FLUSH_INTERVAL
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            default_namespace: default_namespace(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl MonitorConfig {
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_namespace.is_empty() {
            return Err(MonitorError::InvalidConfig(
                "Default namespace cannot be empty".to_string(),
            ));
        }

        if self.queue_capacity == 0 {
            return Err(MonitorError::InvalidConfig(
                "Queue capacity must be > 0".to_string(),
            ));
        }

        if self.buffer_capacity == 0 {
            return Err(MonitorError::InvalidConfig(
                "Buffer capacity must be > 0".to_string(),
            ));
        }

        if self.flush_interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "Flush interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct MonitorConfigBuilder {
    default_namespace: Option<String>,
    queue_capacity: Option<usize>,
    buffer_capacity: Option<usize>,
    flush_interval: Option<Duration>,
    overflow: Option<OverflowPolicy>,
}

impl MonitorConfigBuilder {
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = Some(policy);
        self
    }

    pub fn build(self) -> MonitorConfig {
        let defaults = MonitorConfig::default();
        MonitorConfig {
            default_namespace: self.default_namespace.unwrap_or(defaults.default_namespace),
            queue_capacity: self.queue_capacity.unwrap_or(defaults.queue_capacity),
            buffer_capacity: self.buffer_capacity.unwrap_or(defaults.buffer_capacity),
            flush_interval: self.flush_interval.unwrap_or(defaults.flush_interval),
            overflow: self.overflow.unwrap_or(defaults.overflow),
        }
    }
}

/// Human readable durations ("1m", "250ms") for serde.
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => serializer.serialize_some(&humantime::format_duration(*d).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s: Option<String> = Option::deserialize(deserializer)?;
            s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert_eq!(config.default_namespace, "default");
        assert_eq!(config.queue_capacity, 128);
        assert_eq!(config.buffer_capacity, 1024);
        assert_eq!(config.flush_interval, Duration::from_secs(60));
        assert_eq!(config.overflow, OverflowPolicy::Block);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = MonitorConfig::builder()
            .default_namespace("svc")
            .queue_capacity(16)
            .flush_interval(Duration::from_secs(5))
            .overflow(OverflowPolicy::Drop)
            .build();

        assert_eq!(config.default_namespace, "svc");
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(config.flush_interval, Duration::from_secs(5));
        assert_eq!(config.overflow, OverflowPolicy::Drop);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config = MonitorConfig::builder().queue_capacity(0).build();
        assert!(matches!(config.validate(), Err(MonitorError::InvalidConfig(_))));

        let config = MonitorConfig::builder().buffer_capacity(0).build();
        assert!(config.validate().is_err());

        let config = MonitorConfig::builder().flush_interval(Duration::ZERO).build();
        assert!(config.validate().is_err());

        let config = MonitorConfig::builder().default_namespace("").build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_humantime_round_trip() {
        let config = MonitorConfig::builder()
            .flush_interval(Duration::from_millis(1500))
            .build();

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"flush_interval\":\"1s 500ms\""));

        let parsed: MonitorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
