//! Error Types for the Detection and Delivery Pipeline
//!
//! ## Design Philosophy
//!
//! Almost nothing that goes wrong while a reading moves through the pipeline
//! is fatal. The error taxonomy reflects that:
//!
//! | Condition          | Handling                                         |
//! |--------------------|--------------------------------------------------|
//! | Malformed sample   | `Preprocessor` yields `None`, reading is skipped |
//! | Insufficient window| Detector reports "normal" (cold start)           |
//! | Delivery failure   | `DeliveryError`, agent goes offline and buffers  |
//! | Buffer overflow    | Newest event dropped, logged and counted         |
//!
//! Only two conditions are surfaced to the caller as hard errors:
//! an invalid [`AgentConfig`](crate::AgentConfig) (`ConfigError`) and a
//! broken reading source (`StreamError`, see [`crate::stream`]).
//!
//! ## Delivery Errors
//!
//! `DeliveryError` is what a [`DeliverySink`](crate::DeliverySink) reports
//! when the remote collector did not accept an event. The agent never
//! propagates it; it only logs the reason and switches to offline mode:
//!
//! ```rust
//! use vitalguard_core::DeliveryError;
//!
//! fn describe(err: &DeliveryError) -> &'static str {
//!     match err {
//!         DeliveryError::Timeout => "collector too slow",
//!         DeliveryError::Rejected { .. } => "collector refused the event",
//!         DeliveryError::Transport(_) => "link down",
//!         DeliveryError::Serialization(_) => "event could not be encoded",
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Not enough observations in the window to compute a statistic
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Insufficient data: need {required}, have {available}")]
pub struct InsufficientData {
    /// Minimum number of samples needed
    pub required: usize,
    /// Actual number of samples available
    pub available: usize,
}

/// Invalid agent configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Window too small for a sample standard deviation
    #[error("window size must be at least 2, got {0}")]
    WindowTooSmall(usize),

    /// Sigma multiplier is negative, NaN or infinite
    #[error("threshold k must be a finite non-negative number, got {0}")]
    InvalidThreshold(f64),

    /// Offline buffer cannot hold anything
    #[error("buffer capacity must be greater than zero")]
    ZeroCapacity,

    /// Delivery attempts must be bounded by a non-zero timeout
    #[error("delivery timeout must be greater than zero")]
    ZeroTimeout,

    /// Device or patient tag is empty
    #[error("{0} must not be empty")]
    MissingId(&'static str),

    /// Accepted value range is inverted or not finite
    #[error("invalid value range [{min}, {max}]")]
    InvalidRange {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Configuration document could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Reasons a delivery attempt failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// No answer within the delivery timeout
    #[error("delivery timed out")]
    Timeout,

    /// Network or connection level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Collector answered with a status other than 200/201
    #[error("collector rejected event with status {status}")]
    Rejected {
        /// HTTP-style status code returned by the collector
        status: u16,
    },

    /// Event could not be encoded for the wire
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(err: serde_json::Error) -> Self {
        DeliveryError::Serialization(err.to_string())
    }
}
