//! Runner with configurable failure injection

use crate::mock_runner::MockRunner;
use crate::shared_state::CallLog;
use async_trait::async_trait;
use graphmark::{GraphRunner, GraphmarkError, GraphmarkResult, QueryOutput, QueryParams};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Runner that delegates to [`MockRunner`] but can inject failures
///
/// Set `*_fail_at` to a call count to fail that call and every later one.
/// Set to 0 to disable failure (default). Use `clear_failures()` to reset.
pub struct FailingRunner {
    inner: MockRunner,
    /// Fail connect from this call number on (0 = never)
    pub connect_fail_at: Arc<AtomicU64>,
    /// Fail execute from this call number on (0 = never)
    pub execute_fail_at: Arc<AtomicU64>,
    /// Fail clear from this call number on (0 = never)
    pub clear_fail_at: Arc<AtomicU64>,
    connect_count: Arc<AtomicU64>,
    execute_count: Arc<AtomicU64>,
    clear_count: Arc<AtomicU64>,
    /// Fail every nth execution whose text contains the fragment
    every_nth: Option<(String, u64)>,
    matching_count: Arc<AtomicU64>,
}

impl FailingRunner {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            inner: MockRunner::new(name, log),
            connect_fail_at: Arc::new(AtomicU64::new(0)),
            execute_fail_at: Arc::new(AtomicU64::new(0)),
            clear_fail_at: Arc::new(AtomicU64::new(0)),
            connect_count: Arc::new(AtomicU64::new(0)),
            execute_count: Arc::new(AtomicU64::new(0)),
            clear_count: Arc::new(AtomicU64::new(0)),
            every_nth: None,
            matching_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fail the nth, 2nth, ... execution of queries containing `fragment`
    pub fn fail_every_nth(mut self, fragment: &str, n: u64) -> Self {
        self.every_nth = Some((fragment.to_string(), n));
        self
    }

    pub fn clear_failures(&self) {
        self.connect_fail_at.store(0, Ordering::SeqCst);
        self.execute_fail_at.store(0, Ordering::SeqCst);
        self.clear_fail_at.store(0, Ordering::SeqCst);
    }

    fn should_fail(counter: &AtomicU64, fail_at: &AtomicU64) -> bool {
        let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
        let target = fail_at.load(Ordering::SeqCst);
        target != 0 && count >= target
    }

    fn matches_nth(&self, query: &str) -> bool {
        match &self.every_nth {
            Some((fragment, n)) if *n > 0 && query.contains(fragment.as_str()) => {
                let count = self.matching_count.fetch_add(1, Ordering::SeqCst) + 1;
                count % n == 0
            }
            _ => false,
        }
    }
}

#[async_trait]
impl GraphRunner for FailingRunner {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn connect(&mut self) -> GraphmarkResult<()> {
        if Self::should_fail(&self.connect_count, &self.connect_fail_at) {
            return Err(GraphmarkError::connection(
                self.inner.name(),
                "Injected connect failure",
            ));
        }
        self.inner.connect().await
    }

    async fn execute(
        &mut self,
        query: &str,
        params: &QueryParams,
    ) -> GraphmarkResult<QueryOutput> {
        if Self::should_fail(&self.execute_count, &self.execute_fail_at) || self.matches_nth(query)
        {
            return Err(GraphmarkError::execution("Injected execute failure"));
        }
        self.inner.execute(query, params).await
    }

    async fn clear(&mut self) -> GraphmarkResult<()> {
        if Self::should_fail(&self.clear_count, &self.clear_fail_at) {
            return Err(GraphmarkError::execution("Injected clear failure"));
        }
        self.inner.clear().await
    }

    async fn disconnect(&mut self) {
        self.inner.disconnect().await
    }

    async fn version(&mut self) -> String {
        self.inner.version().await
    }
}
