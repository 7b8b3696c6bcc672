//! Delivery Transports for VitalGuard
//!
//! ## Overview
//!
//! The core pipeline hands anomaly events to a [`DeliverySink`]; this crate
//! provides the transports that carry them off the device. The agent itself
//! never sees a socket: it only learns whether each attempt was accepted,
//! and everything else (offline buffering, replay order) stays in the core.
//!
//! ## Transports
//!
//! ### HTTP/HTTPS (`http` feature, default)
//!
//! **When to use:**
//! - A REST collector already exists
//! - Firewall-friendly environments
//! - Development against a local collector
//!
//! **Characteristics:**
//! - One JSON POST per event
//! - Only `200 OK` and `201 Created` count as accepted
//! - Every attempt is bounded by the configured timeout
//! - No transport-level retries; the agent's offline buffer owns redelivery
//!
//! ## Sink Contract
//!
//! ```text
//! EdgeAgent ──send(&event)──→ HttpSink ──POST json──→ collector
//!     ↑                                                   │
//!     └──────── Ok(()) / Err(DeliveryError) ←─────────────┘
//! ```
//!
//! | Collector response        | Result                               |
//! |---------------------------|--------------------------------------|
//! | 200, 201                  | `Ok(())`                             |
//! | any other status          | `Err(DeliveryError::Rejected)`       |
//! | no answer within timeout  | `Err(DeliveryError::Timeout)`        |
//! | connection/DNS failure    | `Err(DeliveryError::Transport)`      |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vitalguard_connectors::http::{HttpConfig, HttpSink};
//! use vitalguard_core::{AgentConfig, EdgeAgent, RawReading};
//!
//! let sink = HttpSink::new(
//!     HttpConfig::new("http://localhost:3000/alert")
//!         .timeout_ms(2000)
//!         .bearer_token("device-token"),
//! )?;
//!
//! let mut agent = EdgeAgent::new(AgentConfig::new("dev_01", "patient_100"), sink)?;
//! agent.process(RawReading::now("ECG", -0.145));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Security Considerations
//!
//! - Use `https://` endpoints outside a lab network
//! - Never hard-code credentials; load tokens from the environment
//! - Events carry a pseudonymous patient id only

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{AuthMethod, HttpConfig, HttpSink};

pub use vitalguard_core::{DeliveryError, DeliverySink};

use thiserror::Error;

/// Errors raised while setting up a connector
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// Connector configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Delivery statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Events accepted by the collector
    pub messages_sent: u64,
    /// Attempts that failed for any reason
    pub messages_failed: u64,
    /// Payload bytes of accepted events
    pub bytes_sent: u64,
    /// Status code of the last response, if one arrived
    pub last_status: Option<u16>,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    /// Total delivery attempts
    pub fn attempts(&self) -> u64 {
        self.messages_sent + self.messages_failed
    }
}
