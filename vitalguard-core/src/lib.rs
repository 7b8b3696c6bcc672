//! Core pipeline for VitalGuard
//!
//! Flags anomalous physiological readings against a rolling baseline and
//! forwards them to a remote collector over an unreliable link.
//! Designed for a single sensor channel per agent instance.
//!
//! Key constraints:
//! - One reading is fully processed before the next is accepted
//! - Anomaly order and delivery order always match reading order
//! - Network loss degrades delivery latency, never pipeline liveness
//!
//! ```no_run
//! use vitalguard_core::{AgentConfig, EdgeAgent, RawReading, ScriptedSink};
//!
//! let config = AgentConfig::new("dev_01", "patient_100");
//! let mut agent = EdgeAgent::new(config, ScriptedSink::always_accept())?;
//!
//! for value in [0.1, 0.2, 0.1, 0.2, 0.1, 9.5] {
//!     let outcome = agent.process(RawReading::now("ECG", value));
//!     println!("{:?}", outcome);
//! }
//! # Ok::<(), vitalguard_core::ConfigError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod buffer;
pub mod config;
pub mod detector;
pub mod errors;
pub mod events;
pub mod preprocess;
pub mod sink;
pub mod stream;
pub mod time;
pub mod window;

// Public API
pub use agent::{
    AgentStats, DeliveryOutcome, EdgeAgent, FlushReport, LinkState, ReadingOutcome, RunSummary,
    ShutdownHandle, StopReason,
};
pub use buffer::{BufferStats, OfflineBuffer};
pub use config::AgentConfig;
pub use detector::{Detection, Detector};
pub use errors::{ConfigError, DeliveryError, InsufficientData};
pub use events::{AnomalyEvent, RawReading, RawValue, Reading};
pub use preprocess::Preprocessor;
pub use sink::{DeliverySink, ScriptedSink};
pub use stream::{MemoryStream, Stream, StreamError};
pub use window::WindowStats;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
