//! Timing harness
//!
//! Drives one backend at a time through connect → load → probe → cold start
//! → catalog pass → probe → clear → disconnect. Backends are never
//! interleaved, and queries run sequentially in catalog order.
//!
//! A failed measured iteration is counted in [`QueryResult::errors`] and left
//! out of the statistics; the remaining samples are kept.

use crate::datasets::{batched, DatasetGenerator, GraphRecord, ScaleConfig, ScaleTier};
use crate::error::{GraphmarkError, GraphmarkResult};
use crate::probe::ResourceProbe;
use crate::queries::{load, QueryCatalog, QueryDefinition};
use crate::results::{
    BackendFailure, BenchmarkResult, DatabaseResult, LoadResult, QueryResult, ResourceUsage,
};
use crate::rng::DeterministicRng;
use crate::runner::{clear_best_effort, params, GraphRunner, ParamValue, QueryParams, Row};
use crate::stats::{duration_ms, TimingStats};
use crate::Timer;
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default number of discarded warmup iterations per query
pub const DEFAULT_WARMUP_ITERATIONS: u32 = 10;

/// Default number of measured iterations per query
pub const DEFAULT_MEASURED_ITERATIONS: u32 = 100;

/// Default number of records per load statement
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Iteration counts and limits for a catalog pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSettings {
    pub warmup_iterations: u32,
    pub measured_iterations: u32,
    /// Run write-category queries after the read queries
    pub include_writes: bool,
    /// Per-execution deadline; a timeout counts as an execution error
    pub query_timeout: Option<Duration>,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
            measured_iterations: DEFAULT_MEASURED_ITERATIONS,
            include_writes: true,
            query_timeout: None,
        }
    }
}

/// A backend under test and its optional external probe
pub struct Backend {
    pub runner: Box<dyn GraphRunner>,
    pub probe: Option<Box<dyn ResourceProbe>>,
}

impl Backend {
    pub fn new(runner: Box<dyn GraphRunner>) -> Self {
        Self {
            runner,
            probe: None,
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn ResourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }
}

/// Benchmark orchestrator for one scale and one set of settings
#[derive(Debug)]
pub struct BenchmarkHarness {
    tier: Option<ScaleTier>,
    scale: ScaleConfig,
    batch_size: NonZeroUsize,
    settings: MeasurementSettings,
    catalog: QueryCatalog,
}

impl BenchmarkHarness {
    /// Validates `scale` up front; nothing touches a backend if it is invalid
    pub fn new(
        scale: ScaleConfig,
        batch_size: NonZeroUsize,
        settings: MeasurementSettings,
    ) -> GraphmarkResult<Self> {
        scale.validate()?;
        Ok(Self {
            tier: None,
            scale,
            batch_size,
            settings,
            catalog: QueryCatalog::new(&scale),
        })
    }

    /// Harness for a named tier
    pub fn for_tier(
        tier: ScaleTier,
        batch_size: NonZeroUsize,
        settings: MeasurementSettings,
    ) -> GraphmarkResult<Self> {
        let mut harness = Self::new(tier.config(), batch_size, settings)?;
        harness.tier = Some(tier);
        Ok(harness)
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &MeasurementSettings {
        &self.settings
    }

    /// Measure every backend in order
    ///
    /// A backend that fails to connect or load is recorded in
    /// `BenchmarkResult::failures` and the run moves on.
    pub async fn run(&self, backends: Vec<Backend>) -> BenchmarkResult {
        let mut result = BenchmarkResult::new(self.tier, self.scale);
        let mut query_rng = DeterministicRng::queries();

        for mut backend in backends {
            let name = backend.runner.name().to_string();
            match self.run_backend(&mut backend, &mut query_rng).await {
                Ok(db) => result.databases.push(db),
                Err(e) => {
                    error!(backend = %name, error = %e, "Backend not measured");
                    result.failures.push(BackendFailure {
                        database: name,
                        error: e.to_string(),
                    });
                }
            }
        }

        result
    }

    /// Full lifecycle of one backend
    ///
    /// `query_rng` is reset before the catalog pass, so every backend sees the
    /// same parameter sequence.
    pub async fn run_backend(
        &self,
        backend: &mut Backend,
        query_rng: &mut DeterministicRng,
    ) -> GraphmarkResult<DatabaseResult> {
        let runner = backend.runner.as_mut();
        let probe = backend.probe.as_deref();

        info!(backend = runner.name(), "Connecting");
        runner.connect().await?;

        let outcome = self.measure_connected(runner, probe, query_rng).await;

        clear_best_effort(runner).await;
        runner.disconnect().await;
        outcome
    }

    async fn measure_connected(
        &self,
        runner: &mut dyn GraphRunner,
        probe: Option<&dyn ResourceProbe>,
        query_rng: &mut DeterministicRng,
    ) -> GraphmarkResult<DatabaseResult> {
        let version = runner.version().await;
        info!(backend = runner.name(), %version, "Connected");

        clear_best_effort(runner).await;
        let load = load_dataset(runner, &self.scale, self.batch_size).await?;

        let resources_before = snapshot(probe, runner.name()).await;

        query_rng.reset();
        let cold_start_ms = self.measure_cold_start(runner, query_rng).await?;

        query_rng.reset();
        let queries: Vec<&QueryDefinition> = if self.settings.include_writes {
            self.catalog.iter().collect()
        } else {
            self.catalog.read_only().collect()
        };
        let queries = run_catalog(runner, queries, query_rng, &self.settings).await;

        let resources_after = snapshot(probe, runner.name()).await;

        Ok(DatabaseResult {
            database: runner.name().to_string(),
            version,
            load,
            resources_before,
            resources_after,
            cold_start_ms,
            queries,
        })
    }

    /// Reconnect and time the first read query
    ///
    /// A failed reconnect is fatal for the backend; a failed first query only
    /// leaves the cold start unmeasured.
    async fn measure_cold_start(
        &self,
        runner: &mut dyn GraphRunner,
        query_rng: &mut DeterministicRng,
    ) -> GraphmarkResult<Option<f64>> {
        let Some(first) = self.catalog.read_only().next() else {
            return Ok(None);
        };

        runner.disconnect().await;
        let timer = Timer::start();
        runner.connect().await?;
        let params = first.params(query_rng);
        match runner.execute(first.template, &params).await {
            Ok(_) => {
                let ms = duration_ms(timer.elapsed());
                debug!(backend = runner.name(), cold_start_ms = ms, "Cold start measured");
                Ok(Some(ms))
            }
            Err(e) => {
                warn!(backend = runner.name(), error = %e, "Cold start query failed");
                Ok(None)
            }
        }
    }
}

async fn snapshot(probe: Option<&dyn ResourceProbe>, backend: &str) -> Option<ResourceUsage> {
    match probe?.snapshot().await {
        Ok(usage) => Some(usage),
        Err(e) => {
            warn!(backend, error = %e, "Resource probe failed");
            None
        }
    }
}

/// Generate the dataset for `scale` and load it batch by batch
///
/// Index statements are best-effort; a failed data batch aborts the load.
pub async fn load_dataset(
    runner: &mut dyn GraphRunner,
    scale: &ScaleConfig,
    batch_size: NonZeroUsize,
) -> GraphmarkResult<LoadResult> {
    let timer = Timer::start();
    let mut result = LoadResult::default();

    for statement in load::SCHEMA {
        if let Err(e) = runner.execute(statement, &QueryParams::new()).await {
            warn!(backend = runner.name(), statement, error = %e, "Schema statement failed");
        }
    }

    let mut gen = DatasetGenerator::default();
    let batches = &mut result.batches;

    let mut nodes = 0;
    nodes += load_records(
        runner,
        "users",
        load::USERS,
        gen.users(scale.users),
        batch_size,
        batches,
    )
    .await?;
    nodes += load_records(
        runner,
        "items",
        load::ITEMS,
        gen.items(scale.items),
        batch_size,
        batches,
    )
    .await?;
    nodes += load_records(
        runner,
        "events",
        load::EVENTS,
        gen.events(scale.events),
        batch_size,
        batches,
    )
    .await?;

    let mut edges = 0;
    let owns = gen.owns(scale.users, scale.items, scale.owns_edges)?;
    edges += load_records(runner, "owns", load::OWNS, owns, batch_size, batches).await?;
    let triggered = gen.triggered(scale.users, scale.events, scale.triggered_edges)?;
    edges += load_records(
        runner,
        "triggered",
        load::TRIGGERED,
        triggered,
        batch_size,
        batches,
    )
    .await?;
    let related = gen.related_to(scale.items, scale.related_to_edges)?;
    edges += load_records(
        runner,
        "related_to",
        load::RELATED_TO,
        related,
        batch_size,
        batches,
    )
    .await?;

    result.nodes = nodes;
    result.edges = edges;
    result.duration_ms = duration_ms(timer.elapsed());

    info!(
        backend = runner.name(),
        nodes = result.nodes,
        edges = result.edges,
        batches = result.batches,
        duration_ms = result.duration_ms,
        "Dataset loaded"
    );
    Ok(result)
}

async fn load_records<I>(
    runner: &mut dyn GraphRunner,
    kind: &str,
    statement: &str,
    records: I,
    batch_size: NonZeroUsize,
    batches: &mut u64,
) -> GraphmarkResult<u64>
where
    I: IntoIterator,
    I::Item: GraphRecord,
{
    let mut loaded = 0u64;
    for batch in batched(records, batch_size) {
        let rows: Vec<Row> = batch.iter().map(GraphRecord::to_row).collect();
        let count = rows.len() as u64;
        let params = params([("rows", ParamValue::Rows(rows))]);
        runner.execute(statement, &params).await.map_err(|e| {
            GraphmarkError::execution(format!("loading {} after {} records: {}", kind, loaded, e))
        })?;
        loaded += count;
        *batches += 1;
    }
    debug!(backend = runner.name(), kind, loaded, "Loaded records");
    Ok(loaded)
}

/// Run each query in order: warmup, then measured iterations
pub async fn run_catalog<'a>(
    runner: &mut dyn GraphRunner,
    queries: impl IntoIterator<Item = &'a QueryDefinition>,
    rng: &mut DeterministicRng,
    settings: &MeasurementSettings,
) -> Vec<QueryResult> {
    let mut results = Vec::new();
    for query in queries {
        results.push(measure_query(runner, query, rng, settings).await);
    }
    results
}

/// Warm up and measure a single query
pub async fn measure_query(
    runner: &mut dyn GraphRunner,
    query: &QueryDefinition,
    rng: &mut DeterministicRng,
    settings: &MeasurementSettings,
) -> QueryResult {
    for _ in 0..settings.warmup_iterations {
        let params = query.params(rng);
        if let Err(e) = timed_execute(runner, query.template, &params, settings.query_timeout).await
        {
            debug!(
                backend = runner.name(),
                query = query.name,
                error = %e,
                "Warmup iteration failed"
            );
        }
    }

    let mut samples = Vec::with_capacity(settings.measured_iterations as usize);
    let mut errors = 0u32;
    let mut last_error = None;

    for _ in 0..settings.measured_iterations {
        let params = query.params(rng);
        match timed_execute(runner, query.template, &params, settings.query_timeout).await {
            Ok(elapsed) => samples.push(elapsed),
            Err(e) => {
                errors += 1;
                last_error = Some(e.to_string());
            }
        }
    }

    let timing = TimingStats::from_durations(&samples);
    if errors > 0 {
        warn!(
            backend = runner.name(),
            query = query.name,
            errors,
            last_error = last_error.as_deref().unwrap_or_default(),
            "Measured iterations failed"
        );
    }
    if let Some(t) = &timing {
        debug!(
            backend = runner.name(),
            query = query.name,
            p50_ms = t.p50_ms,
            p99_ms = t.p99_ms,
            samples = t.samples,
            "Query measured"
        );
    }

    QueryResult {
        name: query.name.to_string(),
        category: query.category,
        timing,
        errors,
        last_error,
    }
}

async fn timed_execute(
    runner: &mut dyn GraphRunner,
    query: &str,
    params: &QueryParams,
    timeout: Option<Duration>,
) -> GraphmarkResult<Duration> {
    let timer = Timer::start();
    match timeout {
        Some(limit) => tokio::time::timeout(limit, runner.execute(query, params))
            .await
            .map_err(|_| GraphmarkError::execution(format!("timed out after {:?}", limit)))??,
        None => runner.execute(query, params).await?,
    };
    Ok(timer.elapsed())
}
