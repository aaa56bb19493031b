//! # Graph Store Response Types
//!
//! Normalized shapes of what the triple store reports back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// GRAPH LISTING
// =============================================================================

/// One named graph and the number of triples it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    #[serde(rename = "graphURI")]
    pub graph_uri: String,
    pub triple_count: u64,
}

/// Every named graph of the dataset, in the order the store reported them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphListing {
    pub graphs_count: usize,
    pub graphs: Vec<GraphSummary>,
}

impl GraphListing {
    #[must_use]
    pub fn new(graphs: Vec<GraphSummary>) -> Self {
        Self {
            graphs_count: graphs.len(),
            graphs,
        }
    }

    /// Sum of triple counts over all graphs.
    #[must_use]
    pub fn total_triples(&self) -> u64 {
        self.graphs
            .iter()
            .fold(0u64, |acc, g| acc.saturating_add(g.triple_count))
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Request counters of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCounters {
    pub total_requests: u64,
    pub failed_requests: u64,
}

/// Store-level statistics of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatistics {
    /// Dataset path, e.g. `/ds`.
    pub dataset: String,
    pub requests: RequestCounters,
    pub total_triples: u64,
}

// =============================================================================
// RETRIEVE OUTCOME
// =============================================================================

/// Result of fetching a named graph.
///
/// Absence is a value, not an error: a missing graph and a failing store are
/// different outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphFetch {
    /// The serialized graph as the store returned it.
    Found(String),
    /// The store holds no graph under that URI.
    NotFound,
}

// =============================================================================
// WIRE SHAPES (store → gateway)
// =============================================================================

/// `application/sparql-results+json` body.
#[derive(Debug, Deserialize)]
pub(crate) struct SparqlJsonResults {
    pub results: SparqlJsonBindings,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SparqlJsonBindings {
    pub bindings: Vec<HashMap<String, SparqlJsonTerm>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SparqlJsonTerm {
    pub value: String,
}

/// Per-dataset counters of the administrative statistics endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct DatasetCounters {
    #[serde(rename = "Requests")]
    pub requests: u64,
    #[serde(rename = "RequestsBad")]
    pub requests_bad: u64,
}

/// Administrative statistics body: `{"datasets": {"/ds": {...}}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct AdminStats {
    pub datasets: HashMap<String, DatasetCounters>,
}
