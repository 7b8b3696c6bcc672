//! Property tests for delivery accounting and ordering
//!
//! Random reading sequences run against random link scripts; after every
//! reading the agent must keep its counters balanced, its buffer bounded
//! and its replay order strictly FIFO.

mod common;

use std::collections::HashSet;

use common::{agent_with, assert_accounting, config};
use proptest::prelude::*;
use uuid::Uuid;
use vitalguard_core::{DeliveryOutcome, RawReading, RawValue, ReadingOutcome, ScriptedSink};

fn raw_value() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        8 => (-12.0f64..12.0).prop_map(RawValue::Number),
        1 => Just(RawValue::Text("abc".into())),
        1 => (-9.0f64..9.0).prop_map(|v| RawValue::Text(format!("{:.3}", v))),
    ]
}

proptest! {
    #[test]
    fn counters_stay_balanced(
        values in prop::collection::vec(raw_value(), 0..200),
        script in prop::collection::vec(any::<bool>(), 0..200),
        window in 2usize..8,
        k in 0.0f64..3.0,
        capacity in 1usize..10,
    ) {
        let cfg = config().window_size(window).threshold_k(k).buffer_capacity(capacity);
        let mut agent = agent_with(cfg, ScriptedSink::new(script));

        for value in values {
            let outcome = agent.process(RawReading::now("ECG", value));
            assert_accounting(&agent);

            if let Some(DeliveryOutcome::Dropped) = outcome.delivery() {
                // Only a full buffer drops
                prop_assert_eq!(agent.buffer().len(), capacity);
            }
        }
    }

    #[test]
    fn buffered_events_replay_fifo(
        values in prop::collection::vec(-9.0f64..9.0, 5..150),
        script in prop::collection::vec(any::<bool>(), 0..150),
        capacity in 1usize..20,
    ) {
        // k = 0 makes nearly every post-warmup reading an anomaly
        let cfg = config().threshold_k(0.0).buffer_capacity(capacity);
        let mut agent = agent_with(cfg, ScriptedSink::new(script).with_fallback(true));

        let mut buffered_order: Vec<Uuid> = Vec::new();
        for value in values {
            if let ReadingOutcome::Anomaly { event_id, delivery: DeliveryOutcome::Buffered { .. }, .. } =
                agent.process(RawReading::now("ECG", value))
            {
                buffered_order.push(event_id);
            }
        }

        let buffered: HashSet<Uuid> = buffered_order.iter().copied().collect();
        let replayed: Vec<Uuid> = agent
            .sink()
            .delivered()
            .iter()
            .map(|e| e.event_id())
            .filter(|id| buffered.contains(id))
            .collect();
        let pending: Vec<Uuid> = agent.buffer().iter().map(|e| e.event_id()).collect();

        // Replayed events are an in-order prefix, the buffer holds the rest
        prop_assert_eq!(&replayed[..], &buffered_order[..replayed.len()]);
        prop_assert_eq!(&pending[..], &buffered_order[replayed.len()..]);
    }

    #[test]
    fn every_attempt_consumes_one_script_step(
        values in prop::collection::vec(-9.0f64..9.0, 0..100),
        script in prop::collection::vec(any::<bool>(), 0..100),
    ) {
        let mut agent = agent_with(config().threshold_k(0.5), ScriptedSink::new(script));
        for value in values {
            agent.process(RawReading::now("ECG", value));
        }

        let stats = *agent.stats();
        let successes = (stats.delivered + stats.flushed) as usize;
        prop_assert_eq!(agent.sink().delivered().len(), successes);
        prop_assert!(agent.sink().attempts() >= successes);
        prop_assert!(agent.sink().attempts() as u64 >= stats.anomalies);
    }
}
