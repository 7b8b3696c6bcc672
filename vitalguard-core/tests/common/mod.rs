//! Shared fixtures for agent integration tests
//!
//! Provides:
//! - A quiet ECG-like baseline generator
//! - Helpers to drive an agent through a value sequence
//! - Accounting assertions shared by scenario and property tests

#![allow(dead_code)]

use vitalguard_core::{
    AgentConfig, DeliverySink, EdgeAgent, RawReading, ReadingOutcome, ScriptedSink,
};

pub const DEVICE: &str = "dev_01";
pub const PATIENT: &str = "patient_100";

/// Default tuning: window 5, k = 2, capacity 1000
pub fn config() -> AgentConfig {
    AgentConfig::new(DEVICE, PATIENT)
}

pub fn agent_with(config: AgentConfig, sink: ScriptedSink) -> EdgeAgent<ScriptedSink> {
    EdgeAgent::new(config, sink).expect("valid test config")
}

/// Small deterministic wobble around `level`, never far enough to trigger k = 2
pub fn baseline(level: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| level + if i % 2 == 0 { 0.01 } else { -0.01 })
        .collect()
}

/// Feed values through the agent and collect outcomes
pub fn feed<S: DeliverySink>(agent: &mut EdgeAgent<S>, values: &[f64]) -> Vec<ReadingOutcome> {
    values
        .iter()
        .map(|&v| agent.process(RawReading::now("ECG", v)))
        .collect()
}

/// Every anomaly ends up delivered, buffered or dropped
pub fn assert_accounting<S: DeliverySink>(agent: &EdgeAgent<S>) {
    let stats = agent.stats();
    assert_eq!(
        stats.anomalies,
        stats.delivered + stats.buffered + stats.dropped,
        "anomaly accounting broken: {:?}",
        stats
    );
    assert_eq!(
        stats.readings,
        stats.rejected + stats.normal + stats.anomalies,
        "reading accounting broken: {:?}",
        stats
    );
    assert_eq!(
        agent.buffer().len() as u64,
        stats.buffered - stats.flushed,
        "buffer length does not match counters: {:?}",
        stats
    );
    assert!(agent.buffer().len() <= agent.config().buffer_capacity);
}
