//! Reading sources
//!
//! This module provides the pull-based source abstraction the agent consumes
//! readings from, plus two concrete sources:
//! - `memory` - In-memory streams for tests and synthetic replays
//! - `file` - CSV replay of recorded signals (requires `stream-file`)
//!
//! ## Pull Model
//!
//! Sources follow the `nb` convention: `poll_next` either yields an item,
//! reports `WouldBlock` when nothing is ready yet (a live sensor between
//! samples), or fails with a [`StreamError`]. End of data is the
//! `EndOfStream` error, so finite replays and infinite live feeds share one
//! interface.
//!
//! ```rust
//! use vitalguard_core::stream::{MemoryStream, Stream, StreamError};
//! use vitalguard_core::RawReading;
//!
//! let mut stream = MemoryStream::new(vec![RawReading::now("ECG", 0.4)]);
//! loop {
//!     match stream.poll_next() {
//!         Ok(reading) => println!("{:?}", reading.raw),
//!         Err(nb::Error::WouldBlock) => continue,
//!         Err(nb::Error::Other(StreamError::EndOfStream)) => break,
//!         Err(nb::Error::Other(e)) => panic!("source failed: {}", e),
//!     }
//! }
//! ```

use core::fmt;

pub mod memory;

#[cfg(feature = "stream-file")]
pub mod file;

pub use memory::MemoryStream;

#[cfg(feature = "stream-file")]
pub use file::{CsvReplayStream, CsvStreamStats};

/// Errors that can occur while pulling readings
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError<E> {
    /// Transport-level error (e.g., I/O error)
    Transport(E),
    /// Data format error
    Format(&'static str),
    /// End of stream reached
    EndOfStream,
}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Format(msg) => write!(f, "Format error: {}", msg),
            Self::EndOfStream => write!(f, "End of stream"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for StreamError<E> {}

/// Core stream trait for reading sources
///
/// Implementations should be lazy: a reading is produced only when polled.
pub trait Stream {
    /// Type of item produced
    type Item;

    /// Error type for this stream
    type Error;

    /// Poll for the next item
    ///
    /// Returns:
    /// - `Ok(item)` when an item is available
    /// - `Err(nb::Error::WouldBlock)` when no data is ready yet
    /// - `Err(nb::Error::Other(e))` on error or end of stream
    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error>;

    /// Bounds on the remaining number of items
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

impl<S: Stream + ?Sized> Stream for &mut S {
    type Item = S::Item;
    type Error = S::Error;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        (**self).poll_next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (**self).size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_error_display() {
        let err: StreamError<std::io::Error> = StreamError::EndOfStream;
        assert_eq!(err.to_string(), "End of stream");

        let err: StreamError<&str> = StreamError::Transport("disk gone");
        assert_eq!(err.to_string(), "Transport error: disk gone");

        let err: StreamError<&str> = StreamError::Format("bad line");
        assert_eq!(err.to_string(), "Format error: bad line");
    }
}
