//! Latency statistics
//!
//! Samples are milliseconds. Percentiles use the nearest-rank method: sort,
//! then take the element at `ceil(p * n) - 1`, with no interpolation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of the measured iterations of one query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Completed measured iterations
    pub samples: u32,
}

impl TimingStats {
    /// Reduce raw samples, `None` when there are none
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let sum: f64 = sorted.iter().sum();
        Some(Self {
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
            mean_ms: sum / sorted.len() as f64,
            p50_ms: nearest_rank(&sorted, 50),
            p95_ms: nearest_rank(&sorted, 95),
            p99_ms: nearest_rank(&sorted, 99),
            samples: sorted.len() as u32,
        })
    }

    pub fn from_durations(samples: &[Duration]) -> Option<Self> {
        let ms: Vec<f64> = samples.iter().map(|d| duration_ms(*d)).collect();
        Self::from_samples(&ms)
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice
///
/// The rank `ceil(percent * n / 100)` is computed in integers so that
/// boundaries like `0.95 * 100` land exactly.
pub fn nearest_rank(sorted: &[f64], percent: u32) -> f64 {
    debug_assert!(!sorted.is_empty());
    debug_assert!((1..=100).contains(&percent));
    let n = sorted.len();
    let rank = (percent as usize * n).div_ceil(100).max(1);
    sorted[rank - 1]
}

pub fn duration_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}
