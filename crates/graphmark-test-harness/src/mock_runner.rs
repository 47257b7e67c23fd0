//! In-memory runner that accepts everything

use crate::shared_state::{Call, CallLog};
use async_trait::async_trait;
use graphmark::{GraphRunner, GraphmarkError, GraphmarkResult, QueryOutput, QueryParams};
use std::time::Duration;

/// Runner that records calls and always succeeds
///
/// Executing while disconnected is an error, as with a real driver.
pub struct MockRunner {
    name: String,
    log: CallLog,
    connected: bool,
    latency: Option<Duration>,
}

impl MockRunner {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            connected: false,
            latency: None,
        }
    }

    /// Sleep for `latency` on every execute
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl GraphRunner for MockRunner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&mut self) -> GraphmarkResult<()> {
        self.log.record(Call::Connect);
        self.connected = true;
        Ok(())
    }

    async fn execute(
        &mut self,
        query: &str,
        params: &QueryParams,
    ) -> GraphmarkResult<QueryOutput> {
        self.log.record(Call::Execute {
            query: query.to_string(),
            params: params.clone(),
        });
        if !self.connected {
            return Err(GraphmarkError::execution("mock runner is not connected"));
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(QueryOutput { rows: 1 })
    }

    async fn clear(&mut self) -> GraphmarkResult<()> {
        self.log.record(Call::Clear);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.log.record(Call::Disconnect);
        self.connected = false;
    }

    async fn version(&mut self) -> String {
        self.log.record(Call::Version);
        "mock-1.0".to_string()
    }
}
