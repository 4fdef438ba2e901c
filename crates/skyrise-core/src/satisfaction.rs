//! Building-wide trip satisfaction.

use serde::{Deserialize, Serialize};

/// Running mean of per-trip satisfaction samples
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SatisfactionTracker {
    sum: f64,
    count: u64,
}

impl SatisfactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one trip outcome. Samples are clamped to 0..=1.
    pub fn record(&mut self, sample: f32) {
        let sample = if sample.is_nan() { 0.0 } else { sample.clamp(0.0, 1.0) };
        self.sum += sample as f64;
        self.count += 1;
    }

    /// Mean satisfaction; 1.0 before any trip has completed
    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            1.0
        } else {
            (self.sum / self.count as f64) as f32
        }
    }

    pub fn trips(&self) -> u64 {
        self.count
    }
}
