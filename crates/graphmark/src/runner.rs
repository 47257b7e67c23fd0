//! Backend runner abstraction
//!
//! [`GraphRunner`] is the only thing the harness knows about a database.
//! Each backend implements it once, translating the common Cypher text and
//! flat parameter map into its own protocol.
//!
//! # Implementations
//!
//! - [`Neo4jRunner`](crate::neo4j_runner::Neo4jRunner): Bolt protocol via `neo4rs`
//! - [`HttpRunner`](crate::http_runner::HttpRunner): Cypher over HTTP/JSON
//!
//! Calls may block the calling task for their whole duration; callers must not
//! assume any method returns early.

use crate::error::GraphmarkResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Sentinel returned when a backend cannot report its version
pub const UNKNOWN_VERSION: &str = "unknown";

/// Scalar query parameter
///
/// `Rows` is only used by load statements, where one batch of records is
/// passed as a list of flat maps (`UNWIND $rows AS row ...`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Rows(Vec<Row>),
}

/// One flat record passed inside [`ParamValue::Rows`]
pub type Row = BTreeMap<String, ParamValue>;

/// Named parameters of one statement, ordered by name
pub type QueryParams = BTreeMap<String, ParamValue>;

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Row>> for ParamValue {
    fn from(rows: Vec<Row>) -> Self {
        Self::Rows(rows)
    }
}

/// Build a parameter map from `(name, value)` pairs
pub fn params<const N: usize>(pairs: [(&str, ParamValue); N]) -> QueryParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Result of one statement, drained on the backend side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOutput {
    /// Number of rows the backend returned
    pub rows: usize,
}

/// Tag selecting a runner implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Neo4j,
    Http,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Neo4j => "neo4j",
            BackendKind::Http => "http",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neo4j" => Ok(BackendKind::Neo4j),
            "http" => Ok(BackendKind::Http),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Capability contract every backend adapter satisfies
#[async_trait]
pub trait GraphRunner: Send {
    /// Stable identifier used in results (e.g. `neo4j`)
    fn name(&self) -> &str;

    /// Open backend access
    ///
    /// Fails with `GraphmarkError::Connection` when the backend is
    /// unreachable or rejects the credentials.
    async fn connect(&mut self) -> GraphmarkResult<()>;

    /// Run one statement and drain its result
    ///
    /// Fails with `GraphmarkError::Execution`. Writes are visible to later
    /// calls on the same connection.
    async fn execute(
        &mut self,
        query: &str,
        params: &QueryParams,
    ) -> GraphmarkResult<QueryOutput>;

    /// Remove all data
    ///
    /// Callers treat this as best-effort, see [`clear_best_effort`].
    async fn clear(&mut self) -> GraphmarkResult<()>;

    /// Release all resources; safe to call when not connected
    async fn disconnect(&mut self);

    /// Backend version, or [`UNKNOWN_VERSION`]
    async fn version(&mut self) -> String;
}

/// Clear a backend, logging instead of propagating failures
pub async fn clear_best_effort(runner: &mut dyn GraphRunner) {
    if let Err(e) = runner.clear().await {
        warn!(backend = runner.name(), error = %e, "Clear failed, continuing");
    }
}
