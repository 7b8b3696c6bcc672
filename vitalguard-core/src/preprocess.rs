//! Raw sample preprocessing
//!
//! Coerces a raw sample to a number and range-checks it. Anything that
//! fails either step is sensor noise: the caller gets `None` and the
//! reading is skipped. There is no error path, malformed samples are
//! expected from real sensors and are not worth reporting individually.

use crate::events::RawValue;

/// Default lower bound of the accepted signal range
pub const DEFAULT_MIN_VALUE: f64 = -10.0;

/// Default upper bound of the accepted signal range
pub const DEFAULT_MAX_VALUE: f64 = 10.0;

/// Validates and normalizes raw sensor samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessor {
    min_value: f64,
    max_value: f64,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
        }
    }
}

impl Preprocessor {
    /// Create a preprocessor accepting `[min, max]`
    pub fn with_range(min: f64, max: f64) -> Self {
        // Sanity check: can't have min > max
        let (min, max) = if min > max { (max, min) } else { (min, max) };

        Self {
            min_value: min,
            max_value: max,
        }
    }

    /// Accepted range as `(min, max)`
    pub fn range(&self) -> (f64, f64) {
        (self.min_value, self.max_value)
    }

    /// Coerce and range-check a raw sample
    ///
    /// Returns `None` when the value is not numeric, not finite, or outside
    /// the accepted range. Bounds are inclusive.
    pub fn preprocess(&self, raw: &RawValue) -> Option<f64> {
        let value = match raw {
            RawValue::Number(v) => *v,
            RawValue::Text(text) => text.trim().parse::<f64>().ok()?,
        };

        if !value.is_finite() {
            return None;
        }

        if value < self.min_value || value > self.max_value {
            return None;
        }

        Some(value)
    }
}
