//! Edge Agent: Detection Pipeline and Delivery State Machine
//!
//! ## Overview
//!
//! `EdgeAgent` owns everything one sensor channel needs: the preprocessor,
//! the baseline window, the detector, the offline buffer and the delivery
//! sink. Readings go through it strictly one at a time:
//!
//! ```text
//! RawReading → preprocess → detect (prior window) → observe → [anomaly?]
//!                  │                                              │
//!               Rejected                              attempt_deliver(event)
//!                                                      │              │
//!                                                   Ok(..)          Err(..)
//!                                                      │              │
//!                                       flush if was OFFLINE   OFFLINE + buffer
//! ```
//!
//! ## Delivery State Machine
//!
//! ```text
//!              send failed
//!   ┌────────┐ ──────────────────────→ ┌─────────┐
//!   │ ONLINE │                         │ OFFLINE │ ←─┐ send failed
//!   └────────┘ ←────────────────────── └─────────┘ ──┘ (buffer or drop)
//!        send succeeded, then flush buffer
//!        (a flush failure lands back in OFFLINE)
//! ```
//!
//! Every new anomaly is sent straight away, whatever the current state.
//! While offline that attempt doubles as the link probe: there is no
//! separate retry timer and no backoff.
//!
//! ## Ordering Guarantees
//!
//! - Buffered events are replayed oldest first and the flush stops at the
//!   first failure, so no buffered event is ever delivered ahead of an
//!   older one.
//! - The event whose successful send ends an outage is delivered before
//!   the backlog it unblocks.
//! - When the buffer is full the newest event is dropped.
//!
//! ## Accounting
//!
//! Every detected anomaly ends up in exactly one of three counters:
//!
//! ```text
//! stats.anomalies == stats.delivered + stats.buffered + stats.dropped
//! ```
//!
//! `stats.flushed` counts buffered events that later made it out.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::buffer::OfflineBuffer;
use crate::config::AgentConfig;
use crate::detector::Detector;
use crate::errors::ConfigError;
use crate::events::{AnomalyEvent, RawReading, Reading};
use crate::preprocess::Preprocessor;
use crate::sink::DeliverySink;
use crate::stream::{Stream, StreamError};
use crate::window::WindowStats;

/// Link state of the delivery state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Last delivery attempt succeeded
    Online,
    /// Last delivery attempt failed; new failures are buffered
    Offline,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Online => write!(f, "ONLINE"),
            LinkState::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// What happened to a newly detected anomaly event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by the collector; `flushed` buffered events followed it
    Delivered {
        /// Buffered events delivered by the recovery flush
        flushed: usize,
    },
    /// Delivery failed and the event is waiting in the offline buffer
    Buffered {
        /// Buffer length after the push
        queued: usize,
    },
    /// Delivery failed and the buffer was full
    Dropped,
}

/// Result of processing one reading
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingOutcome {
    /// Sample was malformed or out of range and was skipped
    Rejected,
    /// Value is within the baseline (or the window is still filling)
    Normal {
        /// Clean value
        value: f64,
    },
    /// Value crossed the k-sigma threshold
    Anomaly {
        /// Id of the emitted event
        event_id: Uuid,
        /// Clean value
        value: f64,
        /// Distance from the window mean
        deviation: f64,
        /// Fate of the event
        delivery: DeliveryOutcome,
    },
}

impl ReadingOutcome {
    /// Check if the reading was flagged
    pub fn is_anomaly(&self) -> bool {
        matches!(self, ReadingOutcome::Anomaly { .. })
    }

    /// Delivery outcome, for anomalies
    pub fn delivery(&self) -> Option<DeliveryOutcome> {
        match self {
            ReadingOutcome::Anomaly { delivery, .. } => Some(*delivery),
            _ => None,
        }
    }
}

/// Result of one buffer flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Buffered events delivered in this flush
    pub delivered: usize,
    /// Events still waiting afterwards
    pub remaining: usize,
    /// Whether the flush stopped on a failed send
    pub interrupted: bool,
}

/// Pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    /// Readings handed to the agent
    pub readings: u64,
    /// Readings dropped by preprocessing
    pub rejected: u64,
    /// Readings classified as normal
    pub normal: u64,
    /// Readings classified as anomalous
    pub anomalies: u64,
    /// New events accepted on their first attempt
    pub delivered: u64,
    /// New events placed in the offline buffer
    pub buffered: u64,
    /// New events lost to a full buffer
    pub dropped: u64,
    /// Buffered events delivered by a flush
    pub flushed: u64,
    /// Flushes started
    pub flush_runs: u64,
    /// ONLINE → OFFLINE transitions
    pub went_offline: u64,
    /// OFFLINE → ONLINE transitions
    pub went_online: u64,
}

/// Cloneable stop flag for [`EdgeAgent::run`]
///
/// Setting it stops the agent from pulling further readings. The reading in
/// progress, including any flush it triggered, always completes.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Create an untriggered handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether shutdown was requested
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Why [`EdgeAgent::run`] returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The source ran out of readings
    EndOfStream,
    /// The shutdown handle was triggered
    Shutdown,
    /// The source failed and cannot continue
    SourceFailed(String),
}

/// Summary returned by [`EdgeAgent::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Readings pulled from the source during this run
    pub processed: u64,
    /// Why the run ended
    pub reason: StopReason,
    /// Link state at the end of the run
    pub state: LinkState,
    /// Events still waiting in the offline buffer
    pub pending: usize,
    /// Agent counters at the end of the run
    pub stats: AgentStats,
}

/// Single-channel anomaly detection and delivery agent
pub struct EdgeAgent<S> {
    config: AgentConfig,
    preprocessor: Preprocessor,
    detector: Detector,
    window: WindowStats,
    buffer: OfflineBuffer,
    state: LinkState,
    sink: S,
    stats: AgentStats,
}

impl<S: DeliverySink> EdgeAgent<S> {
    /// Create an agent delivering through `sink`
    ///
    /// Fails if the configuration does not validate.
    pub fn new(config: AgentConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            preprocessor: Preprocessor::with_range(config.min_value, config.max_value),
            detector: Detector::new(config.threshold_k),
            window: WindowStats::new(config.window_size),
            buffer: OfflineBuffer::new(config.buffer_capacity),
            state: LinkState::Online,
            sink,
            stats: AgentStats::default(),
            config,
        })
    }

    /// Run one reading through the whole pipeline
    pub fn process(&mut self, raw: RawReading) -> ReadingOutcome {
        self.stats.readings += 1;

        let value = match self.preprocessor.preprocess(&raw.raw) {
            Some(value) => value,
            None => {
                self.stats.rejected += 1;
                debug!("Dropped sample {} from {}", raw.raw, raw.sensor_type);
                return ReadingOutcome::Rejected;
            }
        };

        let reading = Reading {
            sensor_type: raw.sensor_type,
            value,
            timestamp: raw.timestamp,
        };

        // Compare against the prior window, then fold the value in
        let detection = self.detector.detect(value, &self.window);
        self.window.observe(value);

        if !detection.is_anomaly {
            self.stats.normal += 1;
            debug!("Status: normal | {} {:.2}", reading.sensor_type, value);
            return ReadingOutcome::Normal { value };
        }

        self.stats.anomalies += 1;
        warn!(
            "Anomaly detected: {} {:.2} (deviation {:.2})",
            reading.sensor_type, value, detection.deviation
        );

        let event = AnomalyEvent::new(
            &self.config.device_id,
            &self.config.patient_id,
            &reading,
            detection.deviation,
        );
        let event_id = event.event_id();
        let delivery = self.attempt_deliver(event);

        ReadingOutcome::Anomaly {
            event_id,
            value,
            deviation: detection.deviation,
            delivery,
        }
    }

    /// Replay buffered events oldest first until empty or a send fails
    ///
    /// A failed send leaves the agent `Offline` with the failed event still
    /// at the front. Delivering anything proves the link, so a flush that
    /// empties the buffer leaves the agent `Online`.
    pub fn flush_buffer(&mut self) -> FlushReport {
        self.stats.flush_runs += 1;
        let mut delivered = 0;

        while let Some(front) = self.buffer.front() {
            match self.sink.send(front) {
                Ok(()) => {
                    if let Some(event) = self.buffer.pop_front() {
                        info!("Synced event {}", event.event_id());
                    }
                    delivered += 1;
                    self.stats.flushed += 1;
                }
                Err(err) => {
                    warn!(
                        "Sync failed ({}), {} events still buffered",
                        err,
                        self.buffer.len()
                    );
                    self.transition(LinkState::Offline);
                    return FlushReport {
                        delivered,
                        remaining: self.buffer.len(),
                        interrupted: true,
                    };
                }
            }
        }

        if delivered > 0 {
            self.transition(LinkState::Online);
        }

        FlushReport {
            delivered,
            remaining: 0,
            interrupted: false,
        }
    }

    /// Pull readings from `stream` until it ends, fails, or `shutdown` fires
    pub fn run<St, E>(&mut self, stream: &mut St, shutdown: &ShutdownHandle) -> RunSummary
    where
        St: Stream<Item = RawReading, Error = StreamError<E>>,
        E: fmt::Display,
    {
        let mut processed = 0;

        let reason = loop {
            if shutdown.is_triggered() {
                info!("Shutdown requested, no further readings accepted");
                break StopReason::Shutdown;
            }

            match stream.poll_next() {
                Ok(raw) => {
                    self.process(raw);
                    processed += 1;
                }
                Err(nb::Error::WouldBlock) => std::thread::sleep(self.config.poll_interval),
                Err(nb::Error::Other(StreamError::EndOfStream)) => break StopReason::EndOfStream,
                Err(nb::Error::Other(StreamError::Format(msg))) => {
                    warn!("Skipping unreadable sample: {}", msg);
                }
                Err(nb::Error::Other(StreamError::Transport(e))) => {
                    error!("Reading source failed: {}", e);
                    break StopReason::SourceFailed(e.to_string());
                }
            }
        };

        info!(
            "Run finished ({:?}): {} readings, {} anomalies, {} pending, link {}",
            reason,
            processed,
            self.stats.anomalies,
            self.buffer.len(),
            self.state
        );

        RunSummary {
            processed,
            reason,
            state: self.state,
            pending: self.buffer.len(),
            stats: self.stats,
        }
    }

    /// Current link state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Check if the last delivery attempt succeeded
    pub fn is_online(&self) -> bool {
        self.state == LinkState::Online
    }

    /// Pipeline counters
    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Offline buffer contents
    pub fn buffer(&self) -> &OfflineBuffer {
        &self.buffer
    }

    /// Current baseline window
    pub fn window(&self) -> &WindowStats {
        &self.window
    }

    /// Active configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Delivery sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Delivery sink, mutably
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the agent, returning its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn attempt_deliver(&mut self, event: AnomalyEvent) -> DeliveryOutcome {
        match self.sink.send(&event) {
            Ok(()) => {
                self.stats.delivered += 1;
                info!("Event {} delivered", event.event_id());

                let mut flushed = 0;
                if self.state == LinkState::Offline {
                    self.transition(LinkState::Online);
                    info!("Connection restored, syncing {} buffered events", self.buffer.len());
                    flushed = self.flush_buffer().delivered;
                }
                DeliveryOutcome::Delivered { flushed }
            }
            Err(err) => {
                self.transition(LinkState::Offline);

                match self.buffer.push(event) {
                    Ok(()) => {
                        self.stats.buffered += 1;
                        warn!(
                            "Delivery failed ({}), event buffered, queue size {}",
                            err,
                            self.buffer.len()
                        );
                        DeliveryOutcome::Buffered {
                            queued: self.buffer.len(),
                        }
                    }
                    Err(dropped) => {
                        self.stats.dropped += 1;
                        error!(
                            "Delivery failed ({}) and buffer is full ({} events), dropping event {}",
                            err,
                            self.buffer.capacity(),
                            dropped.event_id()
                        );
                        DeliveryOutcome::Dropped
                    }
                }
            }
        }
    }

    fn transition(&mut self, next: LinkState) {
        if self.state == next {
            return;
        }

        match next {
            LinkState::Offline => {
                self.stats.went_offline += 1;
                warn!("Link {} -> {}", self.state, next);
            }
            LinkState::Online => {
                self.stats.went_online += 1;
                info!("Link {} -> {}", self.state, next);
            }
        }
        self.state = next;
    }
}

impl<S> fmt::Debug for EdgeAgent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeAgent")
            .field("device_id", &self.config.device_id)
            .field("state", &self.state)
            .field("window", &self.window.len())
            .field("buffered", &self.buffer.len())
            .field("stats", &self.stats)
            .finish()
    }
}
