//! Benchmark results
//!
//! [`BenchmarkResult`] is the persisted artifact of one run and the only
//! contract between measurement and reporting. It is stored as pretty JSON
//! and reads back to identical values.

use crate::datasets::{ScaleConfig, ScaleTier};
use crate::error::{GraphmarkError, GraphmarkResult};
use crate::queries::Category;
use crate::stats::TimingStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default results file path
pub const RESULTS_FILE: &str = "graphmark_results.json";

/// Measurements of one query on one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub name: String,
    pub category: Category,
    /// Absent when every measured iteration failed
    pub timing: Option<TimingStats>,
    /// Failed measured iterations, excluded from `timing`
    #[serde(default)]
    pub errors: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Footprint of a backend's persisted state at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub disk_bytes: u64,
    pub ram_bytes: u64,
}

/// Outcome of the load phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub nodes: u64,
    pub edges: u64,
    pub batches: u64,
    pub duration_ms: f64,
}

/// Everything measured for one backend in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseResult {
    pub database: String,
    pub version: String,
    pub load: LoadResult,
    pub resources_before: Option<ResourceUsage>,
    pub resources_after: Option<ResourceUsage>,
    /// Reconnect plus first query, in milliseconds
    pub cold_start_ms: Option<f64>,
    pub queries: Vec<QueryResult>,
}

impl DatabaseResult {
    pub fn query(&self, name: &str) -> Option<&QueryResult> {
        self.queries.iter().find(|q| q.name == name)
    }
}

/// A backend that could not be measured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub database: String,
    pub error: String,
}

/// Persisted artifact of one full benchmark execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub timestamp: DateTime<Utc>,
    /// Git commit hash (if available)
    #[serde(default)]
    pub commit: Option<String>,
    /// Scale tier name, or `custom`
    pub scale: String,
    pub scale_config: ScaleConfig,
    pub total_nodes: u64,
    pub total_edges: u64,
    pub databases: Vec<DatabaseResult>,
    #[serde(default)]
    pub failures: Vec<BackendFailure>,
}

impl BenchmarkResult {
    pub fn new(scale: Option<ScaleTier>, scale_config: ScaleConfig) -> Self {
        Self {
            timestamp: Utc::now(),
            commit: get_git_commit(),
            scale: scale.map_or_else(|| "custom".to_string(), |t| t.as_str().to_string()),
            scale_config,
            total_nodes: scale_config.total_nodes(),
            total_edges: scale_config.total_edges(),
            databases: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn database(&self, name: &str) -> Option<&DatabaseResult> {
        self.databases.iter().find(|d| d.database == name)
    }

    /// Load a snapshot; missing or malformed files are analysis errors
    pub fn load_from<P: AsRef<Path>>(path: P) -> GraphmarkResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GraphmarkError::analysis(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            GraphmarkError::analysis(format!("malformed snapshot {}: {}", path.display(), e))
        })
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> GraphmarkResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print a per-backend table of the run
    pub fn print_summary(&self) {
        println!("\n=== Benchmark Results ===");
        println!("Timestamp: {}", self.timestamp);
        if let Some(commit) = &self.commit {
            println!("Commit: {}", commit);
        }
        println!(
            "Scale: {} ({} nodes, {} edges)",
            self.scale, self.total_nodes, self.total_edges
        );

        for db in &self.databases {
            println!("\n--- {} {} ---", db.database, db.version);
            println!(
                "Load: {} nodes, {} edges in {:.1}ms ({} batches)",
                db.load.nodes, db.load.edges, db.load.duration_ms, db.load.batches
            );
            if let Some(cold) = db.cold_start_ms {
                println!("Cold start: {:.2}ms", cold);
            }
            if let (Some(before), Some(after)) = (db.resources_before, db.resources_after) {
                println!(
                    "Disk: {} → {} bytes, RAM: {} → {} bytes",
                    before.disk_bytes, after.disk_bytes, before.ram_bytes, after.ram_bytes
                );
            }

            println!(
                "{:<28} {:<12} {:>10} {:>10} {:>10} {:>8}",
                "Query", "Category", "p50", "p95", "p99", "Errors"
            );
            println!("{}", "-".repeat(82));
            for q in &db.queries {
                match &q.timing {
                    Some(t) => println!(
                        "{:<28} {:<12} {:>8.3}ms {:>8.3}ms {:>8.3}ms {:>8}",
                        q.name, q.category, t.p50_ms, t.p95_ms, t.p99_ms, q.errors
                    ),
                    None => println!(
                        "{:<28} {:<12} {:>10} {:>10} {:>10} {:>8}",
                        q.name, q.category, "-", "-", "-", q.errors
                    ),
                }
            }
        }

        if !self.failures.is_empty() {
            println!("\n\x1b[31m⚠️  Backends not measured:\x1b[0m");
            for failure in &self.failures {
                println!("  - {}: {}", failure.database, failure.error);
            }
        }
    }
}

/// Get the current git commit hash
fn get_git_commit() -> Option<String> {
    std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
}
