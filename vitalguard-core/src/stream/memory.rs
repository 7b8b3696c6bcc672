//! Memory-based streams for testing and replay
//!
//! This module provides an in-memory source that is useful for:
//! - Unit testing
//! - Replaying previously captured readings
//! - Simulating sensor inputs

use core::convert::Infallible;
use std::collections::VecDeque;

use super::{Stream, StreamError};
use crate::events::{RawReading, RawValue};
use crate::time::Clock;

/// Memory-based stream for testing and replay
///
/// ## Example
///
/// ```rust
/// use vitalguard_core::stream::{MemoryStream, Stream};
/// use vitalguard_core::time::FixedClock;
/// use vitalguard_core::RawValue;
///
/// let clock = FixedClock::from_unix_secs(1_700_000_000);
/// let values = [RawValue::from(0.1), 0.2.into(), "abc".into()];
/// let mut stream = MemoryStream::from_values("ECG", values, &clock);
///
/// while let Ok(_reading) = stream.poll_next() {
///     // Process reading
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    readings: VecDeque<RawReading>,
    position: usize,
}

impl MemoryStream {
    /// Create a stream yielding `readings` in order
    pub fn new(readings: impl IntoIterator<Item = RawReading>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            position: 0,
        }
    }

    /// Create a stream of raw values for one sensor, stamped by `clock`
    pub fn from_values<C, V>(
        sensor_type: &str,
        values: impl IntoIterator<Item = V>,
        clock: &C,
    ) -> Self
    where
        C: Clock + ?Sized,
        V: Into<RawValue>,
    {
        Self::new(
            values
                .into_iter()
                .map(|v| RawReading::new(sensor_type, v, clock.now())),
        )
    }

    /// Append a reading to the end of the stream
    pub fn push(&mut self, reading: RawReading) {
        self.readings.push_back(reading);
    }

    /// Number of readings already yielded
    pub fn position(&self) -> usize {
        self.position
    }

    /// Check if stream is exhausted
    pub fn is_exhausted(&self) -> bool {
        self.readings.is_empty()
    }
}

impl Stream for MemoryStream {
    type Item = RawReading;
    type Error = StreamError<Infallible>;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        match self.readings.pop_front() {
            Some(reading) => {
                self.position += 1;
                Ok(reading)
            }
            None => Err(nb::Error::Other(StreamError::EndOfStream)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.readings.len(), Some(self.readings.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;

    #[test]
    fn test_memory_stream() {
        let clock = FixedClock::from_unix_secs(1_000);
        let mut stream = MemoryStream::from_values("ECG", [1.0, 2.0, 3.0], &clock);

        assert_eq!(stream.size_hint(), (3, Some(3)));

        let first = stream.poll_next().unwrap();
        assert_eq!(first.raw, RawValue::Number(1.0));
        assert_eq!(first.sensor_type, "ECG");
        assert_eq!(first.timestamp, clock.now());

        stream.poll_next().unwrap();
        stream.poll_next().unwrap();
        assert_eq!(stream.position(), 3);
        assert!(stream.is_exhausted());

        assert!(matches!(
            stream.poll_next(),
            Err(nb::Error::Other(StreamError::EndOfStream))
        ));
    }

    #[test]
    fn test_push_extends_stream() {
        let mut stream = MemoryStream::default();
        assert!(stream.is_exhausted());

        stream.push(RawReading::now("SpO2", "97"));
        let reading = stream.poll_next().unwrap();
        assert_eq!(reading.raw, RawValue::Text("97".into()));
    }
}
