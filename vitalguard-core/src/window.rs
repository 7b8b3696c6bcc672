//! Sliding Window Baseline for Anomaly Detection
//!
//! ## Overview
//!
//! `WindowStats` keeps the most recent `window_size` clean values of one
//! sensor channel and computes the sample mean and sample standard deviation
//! over them on demand. It is the statistical baseline the
//! [`Detector`](crate::Detector) compares each new value against.
//!
//! ## Ordering Contract
//!
//! A new value is compared against the window *before* it is folded in:
//!
//! ```text
//! detect(v, &window)     // baseline = previous N values
//! window.observe(v)      // v joins the baseline for the next reading
//! ```
//!
//! A spike therefore can never inflate the very statistics used to judge it.
//!
//! ## Eviction
//!
//! ```text
//! window_size = 3
//!
//! observe(1)  →  [1]
//! observe(2)  →  [1, 2]
//! observe(3)  →  [1, 2, 3]      ready()
//! observe(4)  →  [2, 3, 4]      oldest evicted
//! ```
//!
//! The window size is a runtime setting, so storage is a `VecDeque` sized
//! once at construction; `observe` never reallocates after that.

use std::collections::VecDeque;

use crate::errors::InsufficientData;

/// Bounded history of recent clean values
#[derive(Debug, Clone)]
pub struct WindowStats {
    values: VecDeque<f64>,
    window_size: usize,
}

impl WindowStats {
    /// Create an empty window holding at most `window_size` values
    pub fn new(window_size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Append a clean value, evicting the oldest once full
    pub fn observe(&mut self, value: f64) {
        if self.window_size == 0 {
            return;
        }
        if self.values.len() == self.window_size {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// True once `window_size` values have been observed
    pub fn ready(&self) -> bool {
        self.window_size > 0 && self.values.len() >= self.window_size
    }

    /// Sample mean of the current window
    pub fn mean(&self) -> Result<f64, InsufficientData> {
        self.require_samples()?;
        Ok(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Sample standard deviation (n − 1 denominator) of the current window
    pub fn stddev(&self) -> Result<f64, InsufficientData> {
        let mean = self.mean()?;
        let sum_sq: f64 = self.values.iter().map(|v| (v - mean).powi(2)).sum();
        Ok((sum_sq / (self.values.len() - 1) as f64).sqrt())
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no values have been observed
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum number of values held
    pub fn capacity(&self) -> usize {
        self.window_size
    }

    /// Iterate over values from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Forget all observed values
    pub fn clear(&mut self) {
        self.values.clear();
    }

    fn require_samples(&self) -> Result<(), InsufficientData> {
        if self.values.len() < 2 {
            return Err(InsufficientData {
                required: 2,
                available: self.values.len(),
            });
        }
        Ok(())
    }
}
