//! # Fixed Constants
//!
//! Identity, vocabulary and protocol constants of the Graph Manager gateway.
//! These are compiled into the binary and are immutable at runtime.

use crate::GatewayError;
use oxrdf::NamedNode;

// =============================================================================
// AGENT IDENTITY
// =============================================================================

/// Agent identifier stamped on every provenance message and response envelope.
pub const AGENT_ID: &str = "GraphManager";

/// Agent role stamped on every provenance message and response envelope.
pub const AGENT_ROLE: &str = "storage";

// =============================================================================
// PROVENANCE VOCABULARY
// =============================================================================

/// Activity type of every provenance record.
pub const ACTIVITY_TYPE: &str = "ServiceExecution";

/// Activity title of every provenance record.
pub const ACTIVITY_TITLE: &str = "Graph Manager Operations.";

/// Prefix of the index-qualified provenance input keys (`inputGraphs_0`, ...).
pub const INPUT_KEY_PREFIX: &str = "inputGraphs";

/// Role of every provenance input entry.
pub const INPUT_ROLE: &str = "tempDataset";

/// Key of the single provenance output entry.
pub const OUTPUT_KEY: &str = "outputGraph";

/// Role of the single provenance output entry.
pub const OUTPUT_ROLE: &str = "Dataset";

/// Placeholder recorded instead of inline source data.
///
/// Inline payload bytes never appear in provenance.
pub const REDACTED_DATA: &str = "attx:tempDataset";

/// Timestamp layout of `startTime` / `endTime`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// =============================================================================
// STORE PROTOCOL
// =============================================================================

/// Aggregate query listing every named graph with its triple count.
pub const LIST_GRAPHS_QUERY: &str =
    "SELECT ?g (COUNT(*) AS ?count) WHERE { GRAPH ?g {?s ?p ?o} } GROUP BY ?g";

/// Serialization the store returns for `GET /data`.
pub const STORE_NATIVE_MEDIA_TYPE: &str = "text/turtle";

/// Serialization requested from the store for CONSTRUCT results.
pub const CONSTRUCT_TRANSFER_MEDIA_TYPE: &str = "application/n-triples";

/// Build the SPARQL update that drops a named graph.
///
/// `SILENT` keeps the drop idempotent for graphs the store does not hold.
/// The URI must be an absolute IRI; anything else could close the IRI early
/// and smuggle further update operations into the request.
pub fn drop_graph_update(graph_uri: &str) -> Result<String, GatewayError> {
    let graph = NamedNode::new(graph_uri).map_err(|e| {
        GatewayError::InvalidRequest(format!("invalid graph URI {graph_uri:?}: {e}"))
    })?;
    Ok(format!("DROP SILENT GRAPH <{}>", graph.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_update_wraps_uri() {
        assert_eq!(
            drop_graph_update("http://example.org/g1").expect("valid IRI"),
            "DROP SILENT GRAPH <http://example.org/g1>"
        );
    }

    #[test]
    fn drop_update_rejects_iri_breakout() {
        let err = drop_graph_update("http://example.org/g> ; DROP ALL ; DROP SILENT GRAPH <http://x");
        assert!(matches!(err, Err(GatewayError::InvalidRequest(_))));
        assert!(matches!(
            drop_graph_update("not a uri"),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn list_query_groups_by_graph() {
        assert!(LIST_GRAPHS_QUERY.contains("GROUP BY ?g"));
        assert!(LIST_GRAPHS_QUERY.contains("COUNT(*) AS ?count"));
    }
}
