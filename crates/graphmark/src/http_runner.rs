//! Cypher-over-HTTP runner
//!
//! Talks to a server exposing a LatticeDB-style collection API:
//!
//! | Method | Path | Use |
//! |--------|------|-----|
//! | `GET` | `/collections/{name}` | existence check on connect |
//! | `PUT` | `/collections/{name}` | create |
//! | `DELETE` | `/collections/{name}` | clear |
//! | `POST` | `/collections/{name}/graph/query` | execute |
//!
//! Both this runner and the Bolt runner pay network latency, which keeps the
//! comparison fair.

use crate::error::{GraphmarkError, GraphmarkResult};
use crate::runner::{GraphRunner, QueryOutput, QueryParams, UNKNOWN_VERSION};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const NAME: &str = "http";

/// HTTP request body for Cypher queries
#[derive(Serialize)]
struct CypherRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "no_params")]
    parameters: &'a QueryParams,
}

fn no_params(params: &&QueryParams) -> bool {
    params.is_empty()
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    result: Option<T>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct CypherResponse {
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

/// Collection creation request; the graph API ignores the vector settings
/// but the server requires them
#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Deserialize)]
struct ServerInfo {
    version: Option<String>,
}

/// Cypher-over-HTTP benchmark runner
pub struct HttpRunner {
    client: Client,
    base_url: String,
    collection: String,
    connected: bool,
}

impl HttpRunner {
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            connected: false,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn create_collection(&self) -> Result<(), reqwest::Error> {
        let request = CreateCollectionRequest {
            vectors: VectorParams {
                size: 4,
                distance: "Cosine",
            },
        };
        self.client
            .put(self.collection_url())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Row count of a query response body, or the server's error message
fn parse_response(body: &str) -> GraphmarkResult<QueryOutput> {
    let response: ApiResponse<CypherResponse> = serde_json::from_str(body)
        .map_err(|e| GraphmarkError::execution(format!("invalid response: {}", e)))?;
    match response.result {
        Some(result) => Ok(QueryOutput {
            rows: result.rows.len(),
        }),
        None => Err(GraphmarkError::execution(response.error.unwrap_or_else(
            || format!("query failed with status '{}'", response.status),
        ))),
    }
}

#[async_trait]
impl GraphRunner for HttpRunner {
    fn name(&self) -> &str {
        NAME
    }

    async fn connect(&mut self) -> GraphmarkResult<()> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(|e| GraphmarkError::connection(NAME, e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                debug!(collection = %self.collection, "Creating collection");
                self.create_collection()
                    .await
                    .map_err(|e| GraphmarkError::connection(NAME, e.to_string()))?;
            }
            status => {
                return Err(GraphmarkError::connection(
                    NAME,
                    format!("unexpected status {}", status),
                ))
            }
        }

        self.connected = true;
        Ok(())
    }

    async fn execute(
        &mut self,
        query: &str,
        params: &QueryParams,
    ) -> GraphmarkResult<QueryOutput> {
        if !self.connected {
            return Err(GraphmarkError::execution("http runner is not connected"));
        }
        let url = format!("{}/graph/query", self.collection_url());
        let request = CypherRequest {
            query,
            parameters: params,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GraphmarkError::execution(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GraphmarkError::execution(e.to_string()))?;

        if !status.is_success() {
            return Err(GraphmarkError::execution(format!("HTTP {}: {}", status, body)));
        }
        parse_response(&body)
    }

    async fn clear(&mut self) -> GraphmarkResult<()> {
        // Recreating the collection is the only bulk delete the API offers
        match self.client.delete(self.collection_url()).send().await {
            Ok(response) if !response.status().is_success() => {
                debug!(
                    collection = %self.collection,
                    status = %response.status(),
                    "Delete before re-create rejected"
                );
            }
            Ok(_) => {}
            Err(e) => {
                debug!(collection = %self.collection, error = %e, "Delete before re-create failed");
            }
        }
        self.create_collection()
            .await
            .map_err(|e| GraphmarkError::execution(e.to_string()))
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }

    async fn version(&mut self) -> String {
        let info = match self.client.get(&self.base_url).send().await {
            Ok(response) => response.json::<ServerInfo>().await.ok(),
            Err(_) => None,
        };
        info.and_then(|i| i.version)
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{params, ParamValue};

    #[test]
    fn test_parse_rows() {
        let body = r#"{"result": {"columns": ["x"], "rows": [[1], [2], [3]]}, "status": "ok"}"#;
        assert_eq!(parse_response(body).unwrap().rows, 3);
    }

    #[test]
    fn test_parse_failure_carries_server_message() {
        let body = r#"{"result": null, "status": "error", "error": "syntax error at MATC"}"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn test_request_body_shape() {
        let p = params([("id", ParamValue::Int(4))]);
        let body = serde_json::to_value(CypherRequest {
            query: "MATCH (u:User {id: $id}) RETURN u",
            parameters: &p,
        })
        .unwrap();
        assert_eq!(body["parameters"]["id"], 4);

        let empty = QueryParams::new();
        let body = serde_json::to_value(CypherRequest {
            query: "RETURN 1",
            parameters: &empty,
        })
        .unwrap();
        assert!(body.get("parameters").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        // Bind then drop to get a port nobody listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut runner = HttpRunner::new(format!("http://127.0.0.1:{}/", port), "bench");
        let err = runner.connect().await.unwrap_err();
        assert!(matches!(err, GraphmarkError::Connection { .. }));
        assert_eq!(runner.version().await, UNKNOWN_VERSION);
    }

    #[tokio::test]
    async fn test_clear_against_unreachable_server_is_execution_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut runner = HttpRunner::new(format!("http://127.0.0.1:{}", port), "bench");
        // The failed delete is only logged; the re-create decides the outcome
        let err = runner.clear().await.unwrap_err();
        assert!(matches!(err, GraphmarkError::Execution { .. }));
    }
}
