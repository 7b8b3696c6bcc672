//! Agent configuration
//!
//! ## Options
//!
//! | Option            | JSON key            | Default | Meaning                              |
//! |-------------------|---------------------|---------|--------------------------------------|
//! | `window_size`     | `windowSize`        | 5       | Values in the statistical baseline   |
//! | `threshold_k`     | `thresholdK`        | 2.0     | Sigma multiplier                     |
//! | `buffer_capacity` | `bufferCapacity`    | 1000    | Offline buffer bound (events)        |
//! | `delivery_timeout`| `deliveryTimeoutMs` | 2000 ms | Upper bound on one delivery attempt  |
//! | `poll_interval`   | `pollIntervalMs`    | 10 ms   | Idle wait when the source has no data|
//! | `min_value`       | `minValue`          | -10.0   | Lower bound of accepted samples      |
//! | `max_value`       | `maxValue`          | 10.0    | Upper bound of accepted samples      |
//! | `device_id`       | `deviceId`          | required| Device tag on every event            |
//! | `patient_id`      | `patientId`         | required| Pseudonymous patient tag             |
//!
//! ## Example
//!
//! ```rust
//! use vitalguard_core::AgentConfig;
//!
//! let config = AgentConfig::new("dev_01", "patient_100")
//!     .window_size(10)
//!     .threshold_k(3.0)
//!     .buffer_capacity(500)
//!     .delivery_timeout_ms(1500);
//!
//! assert!(config.validate().is_ok());
//!
//! let from_json = AgentConfig::from_json_str(
//!     r#"{"deviceId": "dev_01", "patientId": "patient_100", "windowSize": 10}"#,
//! )?;
//! assert_eq!(from_json.window_size, 10);
//! assert_eq!(from_json.buffer_capacity, 1000);
//! # Ok::<(), vitalguard_core::ConfigError>(())
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::detector::DEFAULT_THRESHOLD_K;
use crate::errors::ConfigError;
use crate::preprocess::{DEFAULT_MAX_VALUE, DEFAULT_MIN_VALUE};

/// Default number of values in the baseline window
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Default bound on a single delivery attempt
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Default idle wait when a source has nothing ready
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for one [`EdgeAgent`](crate::EdgeAgent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Device tag attached to every event
    pub device_id: String,
    /// Pseudonymous patient tag attached to every event
    pub patient_id: String,
    /// Number of recent values in the statistical baseline
    pub window_size: usize,
    /// Sigma multiplier for the k-sigma rule
    pub threshold_k: f64,
    /// Maximum number of undelivered events kept while offline
    pub buffer_capacity: usize,
    /// Upper bound on one delivery attempt
    #[serde(rename = "deliveryTimeoutMs", with = "duration_ms")]
    pub delivery_timeout: Duration,
    /// Idle wait when the reading source has no data ready
    #[serde(rename = "pollIntervalMs", with = "duration_ms")]
    pub poll_interval: Duration,
    /// Lower bound of accepted sample values
    pub min_value: f64,
    /// Upper bound of accepted sample values
    pub max_value: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            patient_id: String::new(),
            window_size: DEFAULT_WINDOW_SIZE,
            threshold_k: DEFAULT_THRESHOLD_K,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
        }
    }
}

impl AgentConfig {
    /// Create configuration with default tuning for the given tags
    pub fn new(device_id: impl Into<String>, patient_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            patient_id: patient_id.into(),
            ..Self::default()
        }
    }

    /// Parse configuration from a JSON document; missing keys take defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set baseline window size
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set sigma multiplier
    pub fn threshold_k(mut self, k: f64) -> Self {
        self.threshold_k = k;
        self
    }

    /// Set offline buffer capacity
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set delivery timeout in milliseconds
    pub fn delivery_timeout_ms(mut self, ms: u64) -> Self {
        self.delivery_timeout = Duration::from_millis(ms);
        self
    }

    /// Set idle poll interval in milliseconds
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval = Duration::from_millis(ms);
        self
    }

    /// Set accepted sample range
    pub fn value_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    /// Check that the configuration describes a working agent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.trim().is_empty() {
            return Err(ConfigError::MissingId("device id"));
        }
        if self.patient_id.trim().is_empty() {
            return Err(ConfigError::MissingId("patient id"));
        }
        if self.window_size < 2 {
            return Err(ConfigError::WindowTooSmall(self.window_size));
        }
        if !self.threshold_k.is_finite() || self.threshold_k < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold_k));
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.delivery_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if !self.min_value.is_finite()
            || !self.max_value.is_finite()
            || self.min_value > self.max_value
        {
            return Err(ConfigError::InvalidRange {
                min: self.min_value,
                max: self.max_value,
            });
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
