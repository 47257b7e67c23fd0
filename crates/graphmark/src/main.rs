//! graphmark binary
//!
//! ```text
//! graphmark [run]                               benchmark the configured backends
//! graphmark compare <baseline> <target> [db]    diff two saved runs (db: neo4j)
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Log level (default: info)
//! - `GRAPHMARK_SCALE` - `micro`, `quick` or `full` (default: quick)
//! - `GRAPHMARK_WARMUP` / `GRAPHMARK_ITERATIONS` - Per-query iteration counts
//! - `GRAPHMARK_BATCH_SIZE` - Records per load statement
//! - `GRAPHMARK_INCLUDE_WRITES` - Run the write category (default: true)
//! - `GRAPHMARK_QUERY_TIMEOUT_MS` - Per-execution deadline
//! - `GRAPHMARK_BACKENDS` - Comma-separated `neo4j`, `http`
//! - `GRAPHMARK_NEO4J_URI` / `_USER` / `_PASSWORD`
//! - `GRAPHMARK_HTTP_URL` / `GRAPHMARK_HTTP_COLLECTION`
//! - `GRAPHMARK_DATA_DIR` / `GRAPHMARK_BACKEND_PID` - Resource probe targets
//! - `GRAPHMARK_OUTPUT` - Result file (default: graphmark_results.json)

use graphmark::analysis::compare_files;
use graphmark::config::BenchConfig;
use graphmark::{BenchmarkHarness, GraphmarkResult};
use std::env;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: graphmark [run] | graphmark compare <baseline.json> <target.json> [database]";

async fn run() -> GraphmarkResult<()> {
    let config = BenchConfig::from_env()?;
    let harness = BenchmarkHarness::for_tier(config.scale, config.batch_size, config.settings)?;

    info!(
        scale = %config.scale,
        backends = ?config.backends,
        queries = harness.catalog().len(),
        "Starting benchmark run"
    );

    let result = harness.run(config.build_backends()).await;
    result.save_to(&config.output)?;
    result.print_summary();

    info!(path = %config.output.display(), "Results saved");
    Ok(())
}

fn compare(baseline: &str, target: &str, database: &str) -> GraphmarkResult<()> {
    let comparison = compare_files(baseline, target, database)?;
    comparison.print_summary();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let outcome = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["run"] => run().await,
        ["compare", baseline, target] => compare(baseline, target, "neo4j"),
        ["compare", baseline, target, database] => compare(baseline, target, database),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "graphmark failed");
            ExitCode::FAILURE
        }
    }
}
