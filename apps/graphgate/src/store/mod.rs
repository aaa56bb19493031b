//! # Graph Store Client
//!
//! Stateless protocol adapter between logical graph operations and a SPARQL
//! 1.1 triple store (Graph Store HTTP Protocol + SPARQL Protocol).
//!
//! ## Endpoints
//!
//! - `GET  /$/ping` - health check
//! - `GET  /$/stats/<ds>` - request counters (basic auth)
//! - `GET  /<ds>/sparql?query=...` - graph listing
//! - `GET  /<ds>/query?query=...&default-graph-uri=...` - SELECT/ASK/CONSTRUCT
//! - `GET|POST|PUT /<ds>/data?graph=<uri>` - read, merge, replace a named graph
//! - `POST /<ds>/update` - SPARQL UPDATE (graph drop)
//!
//! Every call opens a fresh connection; nothing is retried.

mod types;

pub use types::{GraphFetch, GraphListing, GraphSummary, RequestCounters, StoreStatistics};

use crate::config::{StoreConfig, TimeoutConfig};
use graphgate_core::formats::{RdfFormat, convert};
use graphgate_core::primitives::{
    CONSTRUCT_TRANSFER_MEDIA_TYPE, LIST_GRAPHS_QUERY, STORE_NATIVE_MEDIA_TYPE,
    drop_graph_update,
};
use graphgate_core::{ContentType, GatewayError};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value as JsonValue;
use types::{AdminStats, SparqlJsonResults};

/// HTTP client for one dataset of one triple store.
#[derive(Clone)]
pub struct GraphStoreClient {
    http: reqwest::Client,
    base_url: String,
    dataset: String,
    admin_user: String,
    admin_key: String,
}

impl GraphStoreClient {
    /// Build a client from resolved configuration.
    pub fn new(store: &StoreConfig, timeouts: &TimeoutConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .timeout(timeouts.read())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: store.base_url(),
            dataset: store.dataset.clone(),
            admin_user: store.admin_user.clone(),
            admin_key: store.admin_key.clone(),
        })
    }

    /// Dataset name this client is bound to.
    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    fn dataset_request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.dataset, endpoint);
        self.http.request(method, url)
    }

    fn admin_request(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/$/{}", self.base_url, endpoint);
        self.http.get(url)
    }

    /// Send a request, mapping transport failures to `StoreUnavailable`.
    async fn send(&self, req: RequestBuilder) -> Result<Response, GatewayError> {
        req.send().await.map_err(|e| {
            tracing::error!("Graph store at {} unreachable: {}", self.base_url, e);
            GatewayError::StoreUnavailable(format!("{}: {e}", self.base_url))
        })
    }

    /// Turn a non-success status into `StoreRejected` carrying the store's body.
    async fn require_success(resp: Response) -> Result<Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::error!("Graph store rejected request ({}): {}", status, body);
        Err(GatewayError::StoreRejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_text(resp: Response) -> Result<String, GatewayError> {
        resp.text()
            .await
            .map_err(|e| GatewayError::StoreUnavailable(format!("reading response body: {e}")))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, GatewayError> {
        let status = resp.status().as_u16();
        let body = Self::read_text(resp).await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::StoreRejected {
            status,
            body: format!("unexpected response ({e}): {body}"),
        })
    }

    // =========================================================================
    // ADMINISTRATIVE
    // =========================================================================

    /// GET /$/ping
    pub async fn health(&self) -> Result<(), GatewayError> {
        let resp = self.send(self.admin_request("ping")).await?;
        let resp = Self::require_success(resp).await?;
        tracing::info!("Graph store ping answered {}", resp.status());
        Ok(())
    }

    /// List every named graph with its triple count.
    pub async fn list_graphs(&self) -> Result<GraphListing, GatewayError> {
        let req = self
            .dataset_request(Method::GET, "sparql")
            .query(&[("query", LIST_GRAPHS_QUERY)])
            .header(ACCEPT, ContentType::SparqlResultsJson.media_type());
        let resp = Self::require_success(self.send(req).await?).await?;
        let results: SparqlJsonResults = Self::read_json(resp).await?;

        let mut graphs = Vec::with_capacity(results.results.bindings.len());
        for binding in results.results.bindings {
            let (Some(graph), Some(count)) = (binding.get("g"), binding.get("count")) else {
                continue;
            };
            let triple_count = count.value.parse().map_err(|_| GatewayError::StoreRejected {
                status: StatusCode::OK.as_u16(),
                body: format!("non-numeric triple count '{}'", count.value),
            })?;
            graphs.push(GraphSummary {
                graph_uri: graph.value.clone(),
                triple_count,
            });
        }

        tracing::info!(
            "Constructed list of named graphs from /{} dataset",
            self.dataset
        );
        Ok(GraphListing::new(graphs))
    }

    /// Request counters of the dataset plus its total triple count.
    pub async fn statistics(&self) -> Result<StoreStatistics, GatewayError> {
        let req = self
            .admin_request(&format!("stats/{}", self.dataset))
            .basic_auth(&self.admin_user, Some(&self.admin_key));
        let resp = Self::require_success(self.send(req).await?).await?;
        let stats: AdminStats = Self::read_json(resp).await?;

        let dataset = format!("/{}", self.dataset);
        let counters = stats
            .datasets
            .get(&dataset)
            .ok_or_else(|| GatewayError::StoreRejected {
                status: StatusCode::OK.as_u16(),
                body: format!("statistics do not cover dataset {dataset}"),
            })?;
        let requests = RequestCounters {
            total_requests: counters.requests,
            failed_requests: counters.requests_bad,
        };

        let total_triples = self.list_graphs().await?.total_triples();
        tracing::info!("Constructed statistics for dataset {}", dataset);
        Ok(StoreStatistics {
            dataset,
            requests,
            total_triples,
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Fetch a named graph's serialized contents (Turtle).
    pub async fn retrieve_graph(&self, graph_uri: &str) -> Result<GraphFetch, GatewayError> {
        let req = self
            .dataset_request(Method::GET, "data")
            .query(&[("graph", graph_uri)])
            .header(ACCEPT, STORE_NATIVE_MEDIA_TYPE);
        let resp = self.send(req).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            tracing::info!("Named graph {} does not exist", graph_uri);
            return Ok(GraphFetch::NotFound);
        }
        let resp = Self::require_success(resp).await?;
        let body = Self::read_text(resp).await?;
        tracing::info!("Retrieved named graph {}", graph_uri);
        Ok(GraphFetch::Found(body))
    }

    fn query_request(&self, source_graphs: &[String], query: &str, accept: &str) -> RequestBuilder {
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(source_graphs.len() + 1);
        params.push(("query", query));
        for graph in source_graphs {
            params.push(("default-graph-uri", graph));
        }
        self.dataset_request(Method::GET, "query")
            .query(&params)
            .header(ACCEPT, accept)
    }

    /// Run a SELECT/ASK query; the result comes back in `content_type`.
    pub async fn sparql_query(
        &self,
        source_graphs: &[String],
        query: &str,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let results_type = ContentType::sparql_results(content_type)?;
        let req = self.query_request(source_graphs, query, results_type.media_type());
        let resp = Self::require_success(self.send(req).await?).await?;
        let body = Self::read_text(resp).await?;
        tracing::info!("Executed SPARQL query on named graphs {:?}", source_graphs);
        Ok(body)
    }

    /// Run a CONSTRUCT query and serialize the resulting graph as `content_type`.
    pub async fn sparql_construct(
        &self,
        source_graphs: &[String],
        query: &str,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let (_, target_format) = ContentType::rdf_graph(content_type)?;
        let req = self.query_request(source_graphs, query, CONSTRUCT_TRANSFER_MEDIA_TYPE);
        let resp = Self::require_success(self.send(req).await?).await?;
        let body = Self::read_text(resp).await?;
        let serialized = convert(&body, RdfFormat::NTriples, target_format)?;
        tracing::info!(
            "Executed SPARQL construct on named graphs {:?}",
            source_graphs
        );
        Ok(serialized)
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    async fn write_graph(
        &self,
        method: Method,
        graph_uri: &str,
        data: String,
        content_type: &str,
    ) -> Result<JsonValue, GatewayError> {
        let req = self
            .dataset_request(method, "data")
            .query(&[("graph", graph_uri)])
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, "no-cache")
            .body(data);
        let resp = Self::require_success(self.send(req).await?).await?;
        let body = Self::read_text(resp).await?;
        Ok(serde_json::from_str(&body).unwrap_or(JsonValue::String(body)))
    }

    /// POST data to be merged into the named graph.
    pub async fn add_graph_data(
        &self,
        graph_uri: &str,
        data: String,
        content_type: &str,
    ) -> Result<JsonValue, GatewayError> {
        let summary = self
            .write_graph(Method::POST, graph_uri, data, content_type)
            .await?;
        tracing::info!("Updated named graph {}", graph_uri);
        Ok(summary)
    }

    /// PUT data, replacing the named graph's prior contents.
    pub async fn replace_graph_data(
        &self,
        graph_uri: &str,
        data: String,
        content_type: &str,
    ) -> Result<JsonValue, GatewayError> {
        let summary = self
            .write_graph(Method::PUT, graph_uri, data, content_type)
            .await?;
        tracing::info!("Replaced named graph {}", graph_uri);
        Ok(summary)
    }

    /// Drop a named graph. Dropping an absent graph succeeds.
    pub async fn drop_graph(&self, graph_uri: &str) -> Result<(), GatewayError> {
        let update = drop_graph_update(graph_uri)?;
        let req = self
            .dataset_request(Method::POST, "update")
            .header(CACHE_CONTROL, "no-cache")
            .form(&[("update", update.as_str())]);
        Self::require_success(self.send(req).await?).await?;
        tracing::info!("Deleted named graph {}", graph_uri);
        Ok(())
    }
}
