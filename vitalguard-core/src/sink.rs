//! Delivery sinks
//!
//! A [`DeliverySink`] is anything that can try to hand one
//! [`AnomalyEvent`] to the remote collector and report whether the
//! collector accepted it. The agent only ever needs that one bit (plus a
//! reason for the log), so the trait stays tiny and synchronous.
//!
//! Implementations must bound every attempt in time. A sink that can stall
//! stalls the whole pipeline, so a timeout is reported as
//! [`DeliveryError::Timeout`] like any other failure. The agent does not
//! enforce `AgentConfig::delivery_timeout` itself; sinks take it at
//! construction (see `HttpConfig::for_agent` in `vitalguard-connectors`).
//!
//! Two implementations are expected:
//! - a network client (`HttpSink` in `vitalguard-connectors`)
//! - [`ScriptedSink`], a deterministic fake for tests and simulations

use std::collections::VecDeque;

use crate::errors::DeliveryError;
use crate::events::AnomalyEvent;

/// Capability to deliver one event to the remote collector
pub trait DeliverySink {
    /// Attempt delivery of `event`
    ///
    /// `Ok(())` means the collector accepted it. Any `Err` is a failed
    /// attempt; the caller keeps ownership of the event and decides whether
    /// to buffer it.
    fn send(&mut self, event: &AnomalyEvent) -> Result<(), DeliveryError>;
}

impl<S: DeliverySink + ?Sized> DeliverySink for &mut S {
    fn send(&mut self, event: &AnomalyEvent) -> Result<(), DeliveryError> {
        (**self).send(event)
    }
}

impl<S: DeliverySink + ?Sized> DeliverySink for Box<S> {
    fn send(&mut self, event: &AnomalyEvent) -> Result<(), DeliveryError> {
        (**self).send(event)
    }
}

/// Deterministic sink whose outcomes are scripted per attempt
///
/// Each call to `send` consumes the next scripted outcome (`true` accepts,
/// `false` fails). Once the script runs out, the fallback outcome applies.
/// Accepted events are recorded in delivery order.
///
/// ```rust
/// use vitalguard_core::ScriptedSink;
///
/// // Fail twice, then accept everything
/// let sink = ScriptedSink::new([false, false]).with_fallback(true);
/// assert_eq!(sink.attempts(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedSink {
    script: VecDeque<bool>,
    fallback: bool,
    attempts: usize,
    delivered: Vec<AnomalyEvent>,
}

impl ScriptedSink {
    /// Sink following `script`, failing once it is exhausted
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: false,
            attempts: 0,
            delivered: Vec::new(),
        }
    }

    /// Sink that accepts every event
    pub fn always_accept() -> Self {
        Self::new([false; 0]).with_fallback(true)
    }

    /// Sink that fails every attempt
    pub fn always_fail() -> Self {
        Self::new([false; 0])
    }

    /// Outcome used once the script is exhausted
    pub fn with_fallback(mut self, accept: bool) -> Self {
        self.fallback = accept;
        self
    }

    /// Append outcomes to the script
    pub fn push_outcomes(&mut self, outcomes: impl IntoIterator<Item = bool>) {
        self.script.extend(outcomes);
    }

    /// Change the fallback outcome in place
    pub fn set_fallback(&mut self, accept: bool) {
        self.fallback = accept;
    }

    /// Total delivery attempts seen
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Accepted events in delivery order
    pub fn delivered(&self) -> &[AnomalyEvent] {
        &self.delivered
    }
}

impl DeliverySink for ScriptedSink {
    fn send(&mut self, event: &AnomalyEvent) -> Result<(), DeliveryError> {
        self.attempts += 1;
        let accept = self.script.pop_front().unwrap_or(self.fallback);

        if accept {
            self.delivered.push(event.clone());
            Ok(())
        } else {
            Err(DeliveryError::Transport("scripted failure".into()))
        }
    }
}
