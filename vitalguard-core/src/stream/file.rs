//! CSV replay of recorded signals
//!
//! Replays one column of a recorded CSV file (for example the MLII lead of
//! an MIT-BIH ECG export) as a stream of raw readings. Cells are passed
//! through as text: deciding whether a cell is a usable number is the
//! preprocessor's job, so a garbled cell becomes a dropped sample rather
//! than a stream error.
//!
//! ## Format
//!
//! ```csv
//! 'sample #','MLII','V5'
//! 0,-0.145,-0.065
//! 1,-0.145,-0.065
//! ```
//!
//! With the defaults (`column = 1`, one header line) the stream yields
//! `-0.145`, `-0.145`, ... Readings are stamped by the configured clock at
//! the moment they are pulled, mirroring a live feed.
//!
//! Lines are decoded lossily: bytes that are not UTF-8 become U+FFFD, so a
//! corrupted row reaches the preprocessor as text instead of ending the
//! replay.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::{Stream, StreamError};
use crate::events::{RawReading, RawValue};
use crate::time::{Clock, SystemClock};

/// Statistics for CSV replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CsvStreamStats {
    /// Total lines read, headers included
    pub lines_read: usize,
    /// Readings yielded
    pub readings_emitted: usize,
    /// Data lines without the selected column
    pub short_lines: usize,
    /// Blank lines skipped
    pub blank_lines: usize,
}

/// CSV-backed reading stream
///
/// ```rust,no_run
/// use vitalguard_core::stream::{CsvReplayStream, Stream};
///
/// let mut stream = CsvReplayStream::from_path("data/100_ekg.csv")?
///     .with_sensor_type("ECG")
///     .with_column(1);
///
/// while let Ok(_reading) = stream.poll_next() {
///     // Process reading
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct CsvReplayStream<R, C = SystemClock> {
    reader: R,
    clock: C,
    sensor_type: String,
    column: usize,
    delimiter: char,
    skip_lines: usize,
    bytes: Vec<u8>,
    line: String,
    eof: bool,
    stats: CsvStreamStats,
}

impl CsvReplayStream<BufReader<File>> {
    /// Open a CSV file for replay
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> CsvReplayStream<R> {
    /// Replay from any buffered reader, stamping with the system clock
    pub fn new(reader: R) -> Self {
        Self::with_clock(reader, SystemClock)
    }
}

impl<R: BufRead, C: Clock> CsvReplayStream<R, C> {
    /// Replay from any buffered reader, stamping with `clock`
    pub fn with_clock(reader: R, clock: C) -> Self {
        Self {
            reader,
            clock,
            sensor_type: "ECG".into(),
            column: 1,
            delimiter: ',',
            skip_lines: 1,
            bytes: Vec::new(),
            line: String::new(),
            eof: false,
            stats: CsvStreamStats::default(),
        }
    }

    /// Sensor channel label attached to every reading
    pub fn with_sensor_type(mut self, sensor_type: impl Into<String>) -> Self {
        self.sensor_type = sensor_type.into();
        self
    }

    /// Zero-based index of the column to replay
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    /// Field separator
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Skip first N lines (headers)
    pub fn with_skip_lines(mut self, lines: usize) -> Self {
        self.skip_lines = lines;
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &CsvStreamStats {
        &self.stats
    }

    fn read_line(&mut self) -> io::Result<bool> {
        self.bytes.clear();
        let n = self.reader.read_until(b'\n', &mut self.bytes)?;
        if n == 0 {
            self.eof = true;
            return Ok(false);
        }
        self.line = String::from_utf8_lossy(&self.bytes).into_owned();
        self.stats.lines_read += 1;
        Ok(true)
    }
}

impl<R: BufRead, C: Clock> Stream for CsvReplayStream<R, C> {
    type Item = RawReading;
    type Error = StreamError<io::Error>;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        loop {
            if self.eof {
                return Err(nb::Error::Other(StreamError::EndOfStream));
            }

            if !self
                .read_line()
                .map_err(|e| nb::Error::Other(StreamError::Transport(e)))?
            {
                continue;
            }

            if self.stats.lines_read <= self.skip_lines {
                continue;
            }

            let line = self.line.trim_end_matches(&['\r', '\n'][..]);
            if line.trim().is_empty() {
                self.stats.blank_lines += 1;
                continue;
            }

            let cell = match line.split(self.delimiter).nth(self.column) {
                Some(cell) => cell.trim().trim_matches(|c: char| c == '"' || c == '\''),
                None => {
                    // Row exists but the signal is missing; let preprocessing drop it
                    self.stats.short_lines += 1;
                    ""
                }
            };

            let raw = RawValue::Text(cell.to_owned());
            self.stats.readings_emitted += 1;
            return Ok(RawReading::new(self.sensor_type.as_str(), raw, self.clock.now()));
        }
    }
}
