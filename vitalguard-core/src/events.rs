//! Reading and Event Types for the Detection Pipeline
//!
//! ## Overview
//!
//! Three record types move through the agent:
//!
//! ```text
//! RawReading ──preprocess──→ Reading ──detect──→ AnomalyEvent ──→ sink / buffer
//!  (source)                  (clean)             (anomalies only)
//! ```
//!
//! - [`RawReading`]: what a data source hands over. The value may be text
//!   straight out of a CSV cell or a number from a driver.
//! - [`Reading`]: a reading whose value passed preprocessing.
//! - [`AnomalyEvent`]: the record sent to the remote collector. It is the
//!   unit stored in the offline buffer and handed to a
//!   [`DeliverySink`](crate::DeliverySink).
//!
//! ## Wire Format
//!
//! `AnomalyEvent` serializes to the JSON document the collector expects:
//!
//! ```json
//! {
//!   "eventId": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
//!   "deviceId": "dev_01",
//!   "patientId": "patient_100",
//!   "sensorType": "ECG",
//!   "measuredValue": 2.31,
//!   "deviationScore": 1.87,
//!   "timestamp": "2024-03-01T12:00:00Z"
//! }
//! ```

use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unvalidated sample value as produced by a data source
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Already numeric (sensor drivers, in-memory replays)
    Number(f64),
    /// Textual cell that still needs coercion (CSV replays)
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<f32> for RawValue {
    fn from(value: f32) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(v) => write!(f, "{}", v),
            RawValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Sample handed over by a data source, before preprocessing
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// Sensor channel label, e.g. "ECG"
    pub sensor_type: String,
    /// Unvalidated value
    pub raw: RawValue,
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
}

impl RawReading {
    /// Create a raw reading
    pub fn new(
        sensor_type: impl Into<String>,
        raw: impl Into<RawValue>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sensor_type: sensor_type.into(),
            raw: raw.into(),
            timestamp,
        }
    }

    /// Create a raw reading stamped with the current time
    pub fn now(sensor_type: impl Into<String>, raw: impl Into<RawValue>) -> Self {
        Self::new(sensor_type, raw, Utc::now())
    }
}

/// Sensor reading with a validated value
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Sensor channel label
    pub sensor_type: String,
    /// Clean value
    pub value: f64,
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
}

/// Record emitted for an anomalous reading
///
/// Immutable once built; the field names match the collector's JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyEvent {
    event_id: Uuid,
    device_id: String,
    patient_id: String,
    sensor_type: String,
    measured_value: f64,
    deviation_score: f64,
    timestamp: String,
}

impl AnomalyEvent {
    /// Build an event for `reading` with a fresh random id
    ///
    /// The deviation score is rounded to two decimals and the timestamp is
    /// rendered as ISO-8601 UTC with second precision.
    pub fn new(device_id: &str, patient_id: &str, reading: &Reading, deviation: f64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            device_id: device_id.to_owned(),
            patient_id: patient_id.to_owned(),
            sensor_type: reading.sensor_type.clone(),
            measured_value: reading.value,
            deviation_score: round_score(deviation),
            timestamp: reading
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Unique event identifier
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Device that detected the anomaly
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Pseudonymous patient tag
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// Sensor channel label
    pub fn sensor_type(&self) -> &str {
        &self.sensor_type
    }

    /// The reading's clean value
    pub fn measured_value(&self) -> f64 {
        self.measured_value
    }

    /// Distance from the window mean, rounded to 2 decimals
    pub fn deviation_score(&self) -> f64 {
        self.deviation_score
    }

    /// ISO-8601 UTC timestamp of the reading
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Serialize to the collector's JSON format
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Round to two decimals from the exact binary value
///
/// Scaling by 100 first would round twice (2.675 is stored just below
/// 2.675 but `2.675 * 100.0` lands on 267.5).
fn round_score(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}
