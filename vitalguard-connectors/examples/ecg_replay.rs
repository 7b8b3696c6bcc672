//! ECG Replay Against a Collector
//!
//! Replays the MLII column of a recorded MIT-BIH export through an
//! `EdgeAgent` wired to an `HttpSink`, one sample per interval, as if the
//! recording were a live bedside feed.
//!
//! ## What You'll Learn
//!
//! - Wiring a CSV source, the agent and the HTTP transport together
//! - Pacing a finite recording with `WouldBlock`
//! - Stopping a run cleanly with a `ShutdownHandle`
//!
//! ## Data Flow
//!
//! ```text
//! 100_ekg.csv → CsvReplayStream → Paced → EdgeAgent → HttpSink → collector
//!                                             │
//!                                       OfflineBuffer (while the collector is down)
//! ```
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run -p vitalguard-connectors --example ecg_replay -- data/100_ekg.csv
//! ```
//!
//! Environment:
//!
//! | Variable                 | Default                        |
//! |--------------------------|--------------------------------|
//! | `VITALGUARD_ENDPOINT`    | `http://localhost:3000/alert`  |
//! | `VITALGUARD_CONFIG`      | built-in (`dev_01`, `patient_100`) |
//! | `VITALGUARD_INTERVAL_MS` | `1000`                         |
//! | `VITALGUARD_RUN_SECS`    | unlimited                      |
//! | `RUST_LOG`               | `info`                         |

use std::env;
use std::error::Error;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use vitalguard_connectors::http::{HttpConfig, HttpSink};
use vitalguard_core::stream::{CsvReplayStream, Stream};
use vitalguard_core::{AgentConfig, EdgeAgent, ShutdownHandle};

const DEFAULT_ENDPOINT: &str = "http://localhost:3000/alert";
const DEFAULT_CSV: &str = "data/100_ekg.csv";

/// Releases one item per interval, reporting `WouldBlock` in between
struct Paced<S> {
    inner: S,
    interval: Duration,
    next_due: Instant,
}

impl<S> Paced<S> {
    fn new(inner: S, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            next_due: Instant::now(),
        }
    }
}

impl<S: Stream> Stream for Paced<S> {
    type Item = S::Item;
    type Error = S::Error;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        let now = Instant::now();
        if now < self.next_due {
            return Err(nb::Error::WouldBlock);
        }
        self.next_due = now + self.interval;
        self.inner.poll_next()
    }
}

fn env_u64(name: &str) -> Result<Option<u64>, Box<dyn Error>> {
    match env::var(name) {
        Ok(raw) => Ok(Some(raw.trim().parse()?)),
        Err(_) => Ok(None),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let csv_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CSV.to_string());
    let endpoint = env::var("VITALGUARD_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let config = match env::var("VITALGUARD_CONFIG") {
        Ok(path) => AgentConfig::from_json_str(&fs::read_to_string(path)?)?,
        Err(_) => AgentConfig::new("dev_01", "patient_100"),
    };
    let interval = Duration::from_millis(env_u64("VITALGUARD_INTERVAL_MS")?.unwrap_or(1000));
    let run_for = env_u64("VITALGUARD_RUN_SECS")?.map(Duration::from_secs);

    println!("VitalGuard ECG Replay");
    println!("=====================\n");
    println!("Recording: {}", csv_path);
    println!("Collector: {}", endpoint);
    println!(
        "Device {} / patient {}, window {}, k = {}\n",
        config.device_id, config.patient_id, config.window_size, config.threshold_k
    );

    let sink = HttpSink::new(HttpConfig::for_agent(endpoint, &config))?;
    let mut agent = EdgeAgent::new(config, sink)?;

    let source = CsvReplayStream::from_path(&csv_path)?
        .with_sensor_type("ECG")
        .with_column(1);
    let mut stream = Paced::new(source, interval);

    let shutdown = ShutdownHandle::new();
    if let Some(limit) = run_for {
        let timer = shutdown.clone();
        thread::spawn(move || {
            thread::sleep(limit);
            timer.trigger();
        });
    }

    let summary = agent.run(&mut stream, &shutdown);
    let stats = summary.stats;

    println!("\nRun Summary");
    println!("-----------");
    println!("Stopped:        {:?}", summary.reason);
    println!("Readings:       {}", summary.processed);
    println!("Rejected:       {}", stats.rejected);
    println!("Anomalies:      {}", stats.anomalies);
    println!("  delivered:    {}", stats.delivered);
    println!("  buffered:     {}", stats.buffered);
    println!("  dropped:      {}", stats.dropped);
    println!("Replayed:       {}", stats.flushed);
    println!("Still pending:  {}", summary.pending);
    println!("Link:           {}", summary.state);

    let http = agent.sink().stats();
    println!(
        "HTTP:           {} sent, {} failed, {} bytes",
        http.messages_sent, http.messages_failed, http.bytes_sent
    );

    Ok(())
}
