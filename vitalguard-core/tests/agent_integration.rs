//! End-to-end scenarios for the edge agent
//!
//! Drives full agents through scripted link conditions and checks the
//! detection results, delivery ordering and accounting a collector would see.

mod common;

use std::io::Write;

use common::{agent_with, assert_accounting, baseline, config, feed, DEVICE, PATIENT};
use tempfile::NamedTempFile;
use uuid::Uuid;
use vitalguard_core::stream::CsvReplayStream;
use vitalguard_core::time::FixedClock;
use vitalguard_core::{
    DeliveryOutcome, LinkState, MemoryStream, RawReading, ReadingOutcome, ScriptedSink,
    ShutdownHandle, StopReason, Stream,
};

fn anomaly_ids(outcomes: &[ReadingOutcome]) -> Vec<Uuid> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            ReadingOutcome::Anomaly { event_id, .. } => Some(*event_id),
            _ => None,
        })
        .collect()
}

#[test]
fn spike_over_flat_baseline_is_flagged() {
    let mut agent = agent_with(config(), ScriptedSink::always_accept());
    let outcomes = feed(&mut agent, &[1.0, 1.0, 1.0, 1.0, 1.0, 10.0]);

    match &outcomes[5] {
        ReadingOutcome::Anomaly {
            value,
            deviation,
            delivery,
            ..
        } => {
            assert_eq!(*value, 10.0);
            assert_eq!(*deviation, 9.0);
            assert_eq!(*delivery, DeliveryOutcome::Delivered { flushed: 0 });
        }
        other => panic!("expected anomaly, got {:?}", other),
    }

    let event = &agent.sink().delivered()[0];
    assert_eq!(event.device_id(), DEVICE);
    assert_eq!(event.patient_id(), PATIENT);
    assert_eq!(event.sensor_type(), "ECG");
    assert_eq!(event.measured_value(), 10.0);
    assert_eq!(event.deviation_score(), 9.0);
}

#[test]
fn value_equal_to_flat_baseline_is_normal() {
    let mut agent = agent_with(config(), ScriptedSink::always_accept());
    let outcomes = feed(&mut agent, &[3.0; 6]);

    assert_eq!(outcomes[5], ReadingOutcome::Normal { value: 3.0 });
    assert_eq!(agent.sink().attempts(), 0);
}

#[test]
fn ramp_baseline_uses_sample_deviation() {
    // Widen the range so the ramp can overshoot the default bounds
    let wide = config().value_range(-20.0, 20.0);
    let ramp = [0.0, 2.0, 4.0, 6.0, 8.0];

    let mut flagged = agent_with(wide.clone(), ScriptedSink::always_accept());
    feed(&mut flagged, &ramp);
    match flagged.process(RawReading::now("ECG", 11.0)) {
        ReadingOutcome::Anomaly { deviation, .. } => assert_eq!(deviation, 7.0),
        other => panic!("expected anomaly, got {:?}", other),
    }

    let mut quiet = agent_with(wide, ScriptedSink::always_accept());
    feed(&mut quiet, &ramp);
    assert_eq!(
        quiet.process(RawReading::now("ECG", 9.0)),
        ReadingOutcome::Normal { value: 9.0 }
    );
}

#[test]
fn malformed_and_out_of_range_samples_are_skipped() {
    let mut agent = agent_with(config(), ScriptedSink::always_accept());
    feed(&mut agent, &baseline(0.5, 5));
    let window: Vec<f64> = agent.window().iter().collect();

    assert_eq!(agent.process(RawReading::now("ECG", "abc")), ReadingOutcome::Rejected);
    assert_eq!(agent.process(RawReading::now("ECG", 15.0)), ReadingOutcome::Rejected);
    assert_eq!(agent.process(RawReading::now("ECG", f64::NAN)), ReadingOutcome::Rejected);

    assert_eq!(agent.window().iter().collect::<Vec<_>>(), window);
    assert_eq!(agent.stats().rejected, 3);
    assert_eq!(agent.sink().attempts(), 0);
    assert_accounting(&agent);
}

#[test]
fn outage_then_recovery_replays_in_order() {
    // Three spikes fail, the fourth goes through and unblocks the backlog
    let sink = ScriptedSink::new([false, false, false]).with_fallback(true);
    let mut agent = agent_with(config().threshold_k(0.0), sink);

    let warmup = feed(&mut agent, &[0.0; 5]);
    assert!(anomaly_ids(&warmup).is_empty());

    let outage = feed(&mut agent, &[1.0, 2.0, 3.0]);
    assert_eq!(agent.state(), LinkState::Offline);
    assert_eq!(agent.buffer().len(), 3);

    let recovery = feed(&mut agent, &[4.0]);
    assert_eq!(
        recovery[0].delivery(),
        Some(DeliveryOutcome::Delivered { flushed: 3 })
    );
    assert_eq!(agent.state(), LinkState::Online);

    let mut expected = anomaly_ids(&recovery);
    expected.extend(anomaly_ids(&outage));
    let delivered: Vec<Uuid> = agent.sink().delivered().iter().map(|e| e.event_id()).collect();
    assert_eq!(delivered, expected);

    let stats = agent.stats();
    assert_eq!((stats.went_offline, stats.went_online), (1, 1));
    assert_accounting(&agent);
}

#[test]
fn flush_stops_at_first_failure() {
    // 2 failures, recovery send ok, first replay ok, second replay fails
    let sink = ScriptedSink::new([false, false, true, true, false]);
    let mut agent = agent_with(config().threshold_k(0.0), sink);
    feed(&mut agent, &[0.0; 5]);

    let outage = anomaly_ids(&feed(&mut agent, &[1.0, 2.0]));
    let recovery = feed(&mut agent, &[3.0]);

    assert_eq!(
        recovery[0].delivery(),
        Some(DeliveryOutcome::Delivered { flushed: 1 })
    );
    assert_eq!(agent.state(), LinkState::Offline);
    assert_eq!(agent.stats().flush_runs, 1);

    let pending: Vec<Uuid> = agent.buffer().iter().map(|e| e.event_id()).collect();
    assert_eq!(pending, vec![outage[1]]);
    assert_accounting(&agent);

    // Next success drains what is left
    agent.sink_mut().set_fallback(true);
    feed(&mut agent, &[4.0]);
    assert!(agent.buffer().is_empty());
    assert!(agent.is_online());
    assert_accounting(&agent);
}

#[test]
fn sustained_outage_drops_newest() {
    let mut agent = agent_with(
        config().threshold_k(0.0).buffer_capacity(3),
        ScriptedSink::always_fail(),
    );
    feed(&mut agent, &[0.0; 5]);

    let outcomes = feed(&mut agent, &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let ids = anomaly_ids(&outcomes);
    let fates: Vec<_> = outcomes.iter().filter_map(|o| o.delivery()).collect();

    assert_eq!(
        fates,
        vec![
            DeliveryOutcome::Buffered { queued: 1 },
            DeliveryOutcome::Buffered { queued: 2 },
            DeliveryOutcome::Buffered { queued: 3 },
            DeliveryOutcome::Dropped,
            DeliveryOutcome::Dropped,
        ]
    );
    let kept: Vec<Uuid> = agent.buffer().iter().map(|e| e.event_id()).collect();
    assert_eq!(kept, ids[..3].to_vec());
    assert_eq!(agent.stats().dropped, 2);
    assert_eq!(agent.sink().attempts(), 5);
    assert_accounting(&agent);
}

#[test]
fn run_honours_shutdown_between_readings() {
    let mut agent = agent_with(config(), ScriptedSink::always_accept());
    let clock = FixedClock::from_unix_secs(1_709_294_400);
    let mut stream = MemoryStream::from_values("ECG", baseline(0.2, 20), &clock);

    // Drain part of the stream, then stop
    for _ in 0..4 {
        agent.process(stream.poll_next().unwrap());
    }

    let shutdown = ShutdownHandle::new();
    shutdown.trigger();
    let summary = agent.run(&mut stream, &shutdown);

    assert_eq!(summary.reason, StopReason::Shutdown);
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.stats.readings, 4);
    assert_eq!(stream.position(), 4);
}

#[test]
fn csv_replay_through_agent() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "'sample #','MLII','V5'").unwrap();
    for (i, v) in baseline(-0.145, 10).iter().enumerate() {
        writeln!(file, "{},{},-0.065", i, v).unwrap();
    }
    writeln!(file, "10,garbage,-0.065").unwrap();
    writeln!(file, "11,25.0,-0.065").unwrap();
    writeln!(file, "12,3.5,-0.065").unwrap();
    file.flush().unwrap();

    let mut stream = CsvReplayStream::from_path(file.path())
        .unwrap()
        .with_sensor_type("ECG");
    let mut agent = agent_with(config(), ScriptedSink::always_accept());

    let summary = agent.run(&mut stream, &ShutdownHandle::new());

    assert_eq!(summary.reason, StopReason::EndOfStream);
    assert_eq!(summary.processed, 13);
    assert_eq!(summary.stats.rejected, 2);
    assert_eq!(summary.stats.anomalies, 1);
    assert_eq!(agent.sink().delivered()[0].measured_value(), 3.5);
    assert_eq!(stream.stats().readings_emitted, 13);
    assert_accounting(&agent);
}

#[test]
fn corrupted_csv_row_is_rejected_not_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"'sample #','MLII'\n0,0.1\n1,0.2\n2,\xff\xfe\n3,0.1\n4,0.2\n5,0.1\n")
        .unwrap();
    file.flush().unwrap();

    let mut stream = CsvReplayStream::from_path(file.path()).unwrap();
    let mut agent = agent_with(config(), ScriptedSink::always_accept());

    let summary = agent.run(&mut stream, &ShutdownHandle::new());

    assert_eq!(summary.reason, StopReason::EndOfStream);
    assert_eq!(summary.processed, 6);
    assert_eq!(summary.stats.rejected, 1);
    assert_eq!(agent.window().len(), 5);
    assert_accounting(&agent);
}
