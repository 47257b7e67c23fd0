//! Benchmark configuration
//!
//! Everything is read from `GRAPHMARK_*` environment variables; anything
//! unset keeps its default. Unparseable values are rejected rather than
//! silently replaced.

use crate::datasets::ScaleTier;
use crate::error::{GraphmarkError, GraphmarkResult};
use crate::harness::{Backend, MeasurementSettings, DEFAULT_BATCH_SIZE};
use crate::http_runner::HttpRunner;
use crate::neo4j_runner::Neo4jRunner;
use crate::probe::PathProbe;
use crate::results::RESULTS_FILE;
use crate::runner::BackendKind;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Benchmark configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub scale: ScaleTier,
    pub settings: MeasurementSettings,
    pub batch_size: NonZeroUsize,
    pub backends: Vec<BackendKind>,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub http_url: String,
    pub http_collection: String,
    /// Directory measured by the resource probe
    pub data_dir: Option<PathBuf>,
    /// Backend process whose resident memory is sampled
    pub backend_pid: Option<u32>,
    pub output: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            scale: ScaleTier::Quick,
            settings: MeasurementSettings::default(),
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            backends: vec![BackendKind::Neo4j],
            neo4j_uri: "bolt://localhost:7687".to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password: "benchmarkpassword".to_string(),
            http_url: "http://localhost:6333".to_string(),
            http_collection: "graphmark".to_string(),
            data_dir: None,
            backend_pid: None,
            output: PathBuf::from(RESULTS_FILE),
        }
    }
}

fn parse<T>(name: &'static str, raw: &str) -> GraphmarkResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| GraphmarkError::Config {
        name,
        message: format!("'{}': {}", raw, e),
    })
}

fn parse_bool(name: &'static str, raw: &str) -> GraphmarkResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(GraphmarkError::Config {
            name,
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

impl BenchConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> GraphmarkResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> GraphmarkResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("GRAPHMARK_SCALE") {
            config.scale = parse("GRAPHMARK_SCALE", &v)?;
        }
        if let Some(v) = lookup("GRAPHMARK_WARMUP") {
            config.settings.warmup_iterations = parse("GRAPHMARK_WARMUP", &v)?;
        }
        if let Some(v) = lookup("GRAPHMARK_ITERATIONS") {
            let n: u32 = parse("GRAPHMARK_ITERATIONS", &v)?;
            if n == 0 {
                return Err(GraphmarkError::Config {
                    name: "GRAPHMARK_ITERATIONS",
                    message: "must be at least 1".to_string(),
                });
            }
            config.settings.measured_iterations = n;
        }
        if let Some(v) = lookup("GRAPHMARK_BATCH_SIZE") {
            config.batch_size = parse("GRAPHMARK_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("GRAPHMARK_INCLUDE_WRITES") {
            config.settings.include_writes = parse_bool("GRAPHMARK_INCLUDE_WRITES", &v)?;
        }
        if let Some(v) = lookup("GRAPHMARK_QUERY_TIMEOUT_MS") {
            let ms: u64 = parse("GRAPHMARK_QUERY_TIMEOUT_MS", &v)?;
            config.settings.query_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(v) = lookup("GRAPHMARK_BACKENDS") {
            let backends = v
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| parse::<BackendKind>("GRAPHMARK_BACKENDS", s))
                .collect::<GraphmarkResult<Vec<_>>>()?;
            if backends.is_empty() {
                return Err(GraphmarkError::Config {
                    name: "GRAPHMARK_BACKENDS",
                    message: "no backends selected".to_string(),
                });
            }
            config.backends = backends;
        }

        if let Some(v) = lookup("GRAPHMARK_NEO4J_URI") {
            config.neo4j_uri = v;
        }
        if let Some(v) = lookup("GRAPHMARK_NEO4J_USER") {
            config.neo4j_user = v;
        }
        if let Some(v) = lookup("GRAPHMARK_NEO4J_PASSWORD") {
            config.neo4j_password = v;
        }
        if let Some(v) = lookup("GRAPHMARK_HTTP_URL") {
            config.http_url = v;
        }
        if let Some(v) = lookup("GRAPHMARK_HTTP_COLLECTION") {
            config.http_collection = v;
        }
        config.data_dir = lookup("GRAPHMARK_DATA_DIR").map(PathBuf::from);
        if let Some(v) = lookup("GRAPHMARK_BACKEND_PID") {
            config.backend_pid = Some(parse("GRAPHMARK_BACKEND_PID", &v)?);
        }
        if let Some(v) = lookup("GRAPHMARK_OUTPUT") {
            config.output = PathBuf::from(v);
        }

        Ok(config)
    }

    /// Instantiate the selected runners, each with a probe if a data
    /// directory was configured
    pub fn build_backends(&self) -> Vec<Backend> {
        self.backends
            .iter()
            .map(|kind| {
                let backend = match kind {
                    BackendKind::Neo4j => Backend::new(Box::new(Neo4jRunner::new(
                        &self.neo4j_uri,
                        &self.neo4j_user,
                        &self.neo4j_password,
                    ))),
                    BackendKind::Http => Backend::new(Box::new(HttpRunner::new(
                        &self.http_url,
                        &self.http_collection,
                    ))),
                };
                match &self.data_dir {
                    Some(dir) => {
                        let probe = PathProbe::new(dir);
                        let probe = match self.backend_pid {
                            Some(pid) => probe.with_pid(pid),
                            None => probe,
                        };
                        backend.with_probe(Box::new(probe))
                    }
                    None => backend,
                }
            })
            .collect()
    }
}
