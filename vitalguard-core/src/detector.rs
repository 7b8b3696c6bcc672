//! k-sigma anomaly detector
//!
//! A value is anomalous when its distance from the window mean exceeds `k`
//! times the window's sample standard deviation:
//!
//! ```text
//! deviation  = |value - mean(window)|
//! is_anomaly = deviation > k * stddev(window)
//! ```
//!
//! Until the window is full the detector reports every value as normal
//! (cold start). A constant window has `stddev == 0`, so any non-zero
//! deviation is anomalous; the comparison needs no special case since
//! nothing is divided.

use crate::window::WindowStats;

/// Default sigma multiplier
pub const DEFAULT_THRESHOLD_K: f64 = 2.0;

/// Result of classifying one value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Whether the value crossed the k-sigma threshold
    pub is_anomaly: bool,
    /// Absolute distance from the window mean (0.0 during cold start)
    pub deviation: f64,
}

impl Detection {
    /// Verdict used while the window is still filling
    pub const fn cold_start() -> Self {
        Self {
            is_anomaly: false,
            deviation: 0.0,
        }
    }

    /// Split into `(is_anomaly, deviation)`
    pub fn into_parts(self) -> (bool, f64) {
        (self.is_anomaly, self.deviation)
    }
}

/// Classifies values against a rolling baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detector {
    threshold_k: f64,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_K)
    }
}

impl Detector {
    /// Create a detector with sigma multiplier `threshold_k`
    pub fn new(threshold_k: f64) -> Self {
        Self { threshold_k }
    }

    /// Configured sigma multiplier
    pub fn threshold_k(&self) -> f64 {
        self.threshold_k
    }

    /// Classify `value` against the window's current contents
    pub fn detect(&self, value: f64, window: &WindowStats) -> Detection {
        if !window.ready() {
            return Detection::cold_start();
        }

        let (mu, sigma) = match (window.mean(), window.stddev()) {
            (Ok(mu), Ok(sigma)) => (mu, sigma),
            _ => return Detection::cold_start(),
        };

        let deviation = (value - mu).abs();
        Detection {
            is_anomaly: deviation > self.threshold_k * sigma,
            deviation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(values: &[f64]) -> WindowStats {
        let mut window = WindowStats::new(values.len());
        for &v in values {
            window.observe(v);
        }
        window
    }

    #[test]
    fn cold_start_is_never_anomalous() {
        let detector = Detector::default();
        let mut window = WindowStats::new(5);
        for v in [0.0, 0.0, 0.0, 0.0] {
            window.observe(v);
        }

        let detection = detector.detect(9.9, &window);
        assert_eq!(detection.into_parts(), (false, 0.0));
    }

    #[test]
    fn constant_window_equal_value() {
        let detector = Detector::default();
        let window = window_of(&[1.0; 5]);

        let detection = detector.detect(1.0, &window);
        assert!(!detection.is_anomaly);
        assert_eq!(detection.deviation, 0.0);
    }

    #[test]
    fn constant_window_any_deviation() {
        let detector = Detector::default();
        let window = window_of(&[1.0; 5]);

        let detection = detector.detect(10.0, &window);
        assert!(detection.is_anomaly);
        assert_eq!(detection.deviation, 9.0);
    }

    #[test]
    fn spread_window_threshold() {
        let detector = Detector::new(2.0);
        let window = window_of(&[0.0, 2.0, 4.0, 6.0, 8.0]);

        // 2 * sqrt(10) ≈ 6.32
        let high = detector.detect(11.0, &window);
        assert!(high.is_anomaly);
        assert_eq!(high.deviation, 7.0);

        let mild = detector.detect(9.0, &window);
        assert!(!mild.is_anomaly);
        assert_eq!(mild.deviation, 5.0);

        let below = detector.detect(-3.0, &window);
        assert!(below.is_anomaly);
    }

    #[test]
    fn larger_k_is_more_tolerant() {
        let window = window_of(&[0.0, 2.0, 4.0, 6.0, 8.0]);

        assert!(Detector::new(2.0).detect(11.0, &window).is_anomaly);
        assert!(!Detector::new(3.0).detect(11.0, &window).is_anomaly);
    }
}
