//! Neo4j runner over Bolt

use crate::error::{GraphmarkError, GraphmarkResult};
use crate::runner::{GraphRunner, ParamValue, QueryOutput, QueryParams, UNKNOWN_VERSION};
use async_trait::async_trait;
use neo4rs::{query, BoltList, BoltMap, BoltString, BoltType, Graph, Query};
use tracing::debug;

const NAME: &str = "neo4j";

/// Neo4j benchmark runner
pub struct Neo4jRunner {
    uri: String,
    user: String,
    password: String,
    graph: Option<Graph>,
}

impl Neo4jRunner {
    pub fn new(
        uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            graph: None,
        }
    }

    fn graph(&self) -> GraphmarkResult<&Graph> {
        self.graph
            .as_ref()
            .ok_or_else(|| GraphmarkError::execution("neo4j runner is not connected"))
    }

    /// Run a statement and count its rows
    async fn drain(graph: &Graph, q: Query) -> Result<usize, neo4rs::Error> {
        let mut stream = graph.execute(q).await?;
        let mut rows = 0;
        while stream.next().await?.is_some() {
            rows += 1;
        }
        Ok(rows)
    }
}

fn to_bolt(value: &ParamValue) -> BoltType {
    match value {
        ParamValue::Int(v) => BoltType::from(*v),
        ParamValue::Float(v) => BoltType::from(*v),
        ParamValue::Str(v) => BoltType::from(v.as_str()),
        ParamValue::Bool(v) => BoltType::from(*v),
        ParamValue::Rows(rows) => {
            let mut list = BoltList::new();
            for row in rows {
                let mut map = BoltMap::new();
                for (key, v) in row {
                    map.put(BoltString::from(key.as_str()), to_bolt(v));
                }
                list.push(BoltType::Map(map));
            }
            BoltType::List(list)
        }
    }
}

fn build_query(text: &str, params: &QueryParams) -> Query {
    params
        .iter()
        .fold(query(text), |q, (key, value)| q.param(key, to_bolt(value)))
}

#[async_trait]
impl GraphRunner for Neo4jRunner {
    fn name(&self) -> &str {
        NAME
    }

    async fn connect(&mut self) -> GraphmarkResult<()> {
        let graph = Graph::new(&self.uri, &self.user, &self.password)
            .await
            .map_err(|e| GraphmarkError::connection(NAME, e.to_string()))?;

        // The driver connects lazily; force a round trip so bad credentials
        // surface here rather than on the first measured query
        Self::drain(&graph, query("RETURN 1"))
            .await
            .map_err(|e| GraphmarkError::connection(NAME, e.to_string()))?;

        debug!(uri = %self.uri, "Connected to Neo4j");
        self.graph = Some(graph);
        Ok(())
    }

    async fn execute(
        &mut self,
        text: &str,
        params: &QueryParams,
    ) -> GraphmarkResult<QueryOutput> {
        let graph = self.graph()?;
        let rows = Self::drain(graph, build_query(text, params))
            .await
            .map_err(|e| GraphmarkError::execution(e.to_string()))?;
        Ok(QueryOutput { rows })
    }

    async fn clear(&mut self) -> GraphmarkResult<()> {
        let graph = self.graph()?;
        graph
            .run(query("MATCH (n) DETACH DELETE n"))
            .await
            .map_err(|e| GraphmarkError::execution(e.to_string()))
    }

    async fn disconnect(&mut self) {
        // Dropping the last handle closes the pool
        self.graph = None;
    }

    async fn version(&mut self) -> String {
        let Ok(graph) = self.graph() else {
            return UNKNOWN_VERSION.to_string();
        };
        let q = query("CALL dbms.components() YIELD versions RETURN versions[0] AS version");
        let row = match graph.execute(q).await {
            Ok(mut stream) => stream.next().await.ok().flatten(),
            Err(_) => None,
        };
        row.and_then(|r| r.get::<String>("version").ok())
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{params, Row};

    #[test]
    fn test_rows_become_list_of_maps() {
        let mut row = Row::new();
        row.insert("id".to_string(), ParamValue::Int(7));
        row.insert("name".to_string(), ParamValue::from("Ada"));

        match to_bolt(&ParamValue::Rows(vec![row.clone(), row])) {
            BoltType::List(list) => {
                assert_eq!(list.len(), 2);
                assert!(matches!(list.value[0], BoltType::Map(_)));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_scalars_convert() {
        assert!(matches!(to_bolt(&ParamValue::Int(1)), BoltType::Integer(_)));
        assert!(matches!(to_bolt(&ParamValue::Float(1.5)), BoltType::Float(_)));
        assert!(matches!(to_bolt(&ParamValue::Bool(true)), BoltType::Boolean(_)));
        assert!(matches!(to_bolt(&ParamValue::from("x")), BoltType::String(_)));
        let _ = build_query("RETURN $id", &params([("id", ParamValue::Int(1))]));
    }

    #[tokio::test]
    async fn test_execute_without_connect_is_execution_error() {
        let mut runner = Neo4jRunner::new("127.0.0.1:7687", "neo4j", "password");
        let err = runner.execute("RETURN 1", &QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, GraphmarkError::Execution { .. }));
        assert_eq!(runner.version().await, UNKNOWN_VERSION);
        runner.disconnect().await;
    }

    #[tokio::test]
    #[ignore = "requires a running Neo4j instance"]
    async fn test_live_roundtrip() {
        let uri = std::env::var("GRAPHMARK_NEO4J_URI").unwrap_or_else(|_| "127.0.0.1:7687".into());
        let mut runner = Neo4jRunner::new(uri, "neo4j", "benchmarkpassword");
        runner.connect().await.unwrap();
        runner.clear().await.unwrap();
        let out = runner
            .execute("UNWIND range(1, 3) AS x RETURN x", &QueryParams::new())
            .await
            .unwrap();
        assert_eq!(out.rows, 3);
        assert_ne!(runner.version().await, UNKNOWN_VERSION);
        runner.disconnect().await;
    }
}
