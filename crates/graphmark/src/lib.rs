//! graphmark: reproducible graph database benchmarks
//!
//! Loads the same synthetic graph into every backend, runs the same
//! parameterized Cypher catalog against each one, and compares the resulting
//! latency distributions across backends or across runs.
//!
//! ## Running Benchmarks
//!
//! ### Prerequisites
//!
//! 1. Start a Neo4j instance (Docker recommended):
//!    ```bash
//!    docker run -d \
//!      --name neo4j-bench \
//!      -p 7687:7687 \
//!      -p 7474:7474 \
//!      -e NEO4J_AUTH=neo4j/benchmarkpassword \
//!      neo4j:5
//!    ```
//!
//! 2. Run a benchmark and save the results:
//!    ```bash
//!    GRAPHMARK_SCALE=micro GRAPHMARK_OUTPUT=run.json cargo run --release -p graphmark
//!    ```
//!
//! 3. Compare two runs:
//!    ```bash
//!    cargo run --release -p graphmark -- compare baseline.json run.json neo4j
//!    ```
//!
//! ## Query Categories
//!
//! - **Lookup**: node by id, label + property filter
//! - **Pattern**: one and two hop patterns around a user
//! - **Aggregation**: counts and averages grouped by property
//! - **Traversal**: variable length RELATED_TO paths
//! - **Write**: node/edge creation and property updates

pub mod analysis;
pub mod config;
pub mod datasets;
pub mod error;
pub mod harness;
pub mod http_runner;
pub mod neo4j_runner;
pub mod probe;
pub mod queries;
pub mod results;
pub mod rng;
pub mod runner;
pub mod stats;

pub use error::{GraphmarkError, GraphmarkResult};
pub use harness::{Backend, BenchmarkHarness, MeasurementSettings};
pub use results::{BenchmarkResult, DatabaseResult, QueryResult, ResourceUsage};
pub use runner::{GraphRunner, ParamValue, QueryOutput, QueryParams};

use std::time::{Duration, Instant};

/// Timer utility for benchmarking
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
