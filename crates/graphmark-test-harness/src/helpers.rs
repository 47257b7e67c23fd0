//! Helper functions for harness tests

use async_trait::async_trait;
use graphmark::datasets::ScaleConfig;
use graphmark::probe::ResourceProbe;
use graphmark::{GraphmarkResult, MeasurementSettings, ResourceUsage};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A few dozen records per kind; loads in a handful of batches
pub fn tiny_scale() -> ScaleConfig {
    ScaleConfig {
        users: 20,
        items: 10,
        events: 30,
        owns_edges: 25,
        triggered_edges: 30,
        related_to_edges: 15,
    }
}

/// Settings with small iteration counts
pub fn fast_settings(warmup: u32, measured: u32) -> MeasurementSettings {
    MeasurementSettings {
        warmup_iterations: warmup,
        measured_iterations: measured,
        ..MeasurementSettings::default()
    }
}

pub fn batch_size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).expect("batch size must be non-zero")
}

/// Probe whose reported disk usage grows by `step` per snapshot
#[derive(Clone)]
pub struct FixedProbe {
    pub ram_bytes: u64,
    step: u64,
    pub snapshots: Arc<AtomicU64>,
}

impl FixedProbe {
    pub fn new(ram_bytes: u64, step: u64) -> Self {
        Self {
            ram_bytes,
            step,
            snapshots: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl ResourceProbe for FixedProbe {
    async fn snapshot(&self) -> GraphmarkResult<ResourceUsage> {
        let n = self.snapshots.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ResourceUsage {
            disk_bytes: n * self.step,
            ram_bytes: self.ram_bytes,
        })
    }
}
