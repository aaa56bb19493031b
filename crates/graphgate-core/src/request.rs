//! # Operation Requests
//!
//! Typed form of an inbound operation message. Callers (the HTTP layer or the
//! RPC channel) hand over a JSON message of the shape
//!
//! ```json
//! {
//!   "provenance": { "context": { "activityID": "1", "workflowID": "w", "stepID": "s" } },
//!   "payload": {
//!     "graphManagerInput": {
//!       "activity": "add",
//!       "targetGraph": "http://example.org/g1",
//!       "sourceData": [ { "inputType": "Data", "input": "...", "contentType": "text/turtle" } ]
//!     }
//!   }
//! }
//! ```
//!
//! and receive an [`OperationRequest`] whose [`Operation`] variant only holds
//! the fields that operation kind needs. Checking the per-kind required fields
//! happens here; everything else about the message is assumed validated.

use crate::{GatewayError, InputType, OperationKind, OutputType};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// =============================================================================
// PROVENANCE CONTEXT
// =============================================================================

/// Correlation identifiers copied verbatim into every outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceContext {
    #[serde(rename = "activityID", deserialize_with = "id_string")]
    pub activity_id: String,
    #[serde(rename = "workflowID", deserialize_with = "id_string")]
    pub workflow_id: String,
    #[serde(
        rename = "stepID",
        default,
        deserialize_with = "optional_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub step_id: Option<String>,
}

impl ProvenanceContext {
    /// Create a context without a step identifier.
    #[must_use]
    pub fn new(activity_id: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            workflow_id: workflow_id.into(),
            step_id: None,
        }
    }

    /// Attach a step identifier.
    #[must_use]
    pub fn with_step(mut self, step_id: impl Into<String>) -> Self {
        let step_id = step_id.into();
        self.step_id = (!step_id.is_empty()).then_some(step_id);
        self
    }
}

/// Identifiers may arrive as JSON strings or numbers; both render as strings.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}

/// Like [`id_string`], but null and empty values become `None`.
fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) if s.is_empty() => Ok(None),
        JsonValue::String(s) => Ok(Some(s)),
        JsonValue::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}

// =============================================================================
// SOURCE ELEMENTS
// =============================================================================

/// One element of an Add/Replace `sourceData` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceElement {
    pub input_type: InputType,
    pub input: String,
    pub content_type: String,
}

impl SourceElement {
    /// An inline source.
    #[must_use]
    pub fn data(input: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            input_type: InputType::Data,
            input: input.into(),
            content_type: content_type.into(),
        }
    }

    /// A source fetched from `uri`.
    #[must_use]
    pub fn uri(uri: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            input_type: InputType::Uri,
            input: uri.into(),
            content_type: content_type.into(),
        }
    }
}

// =============================================================================
// TYPED OPERATIONS
// =============================================================================

/// Requested output mode and media type of a read operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub output_type: OutputType,
    pub content_type: String,
}

/// Add or Replace: write `source_data` into `target_graph`.
///
/// `source_data` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphWrite {
    pub target_graph: String,
    pub source_data: Vec<SourceElement>,
}

/// Query or Construct: run `query` over `source_graphs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQuery {
    pub source_graphs: Vec<String>,
    pub query: String,
    pub output: OutputSpec,
}

/// Retrieve: fetch and merge `source_graphs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRead {
    pub source_graphs: Vec<String>,
    pub output: OutputSpec,
}

/// A validated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add(GraphWrite),
    Replace(GraphWrite),
    Query(GraphQuery),
    Construct(GraphQuery),
    Retrieve(GraphRead),
}

impl Operation {
    /// The kind of this operation.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Add(_) => OperationKind::Add,
            Self::Replace(_) => OperationKind::Replace,
            Self::Query(_) => OperationKind::Query,
            Self::Construct(_) => OperationKind::Construct,
            Self::Retrieve(_) => OperationKind::Retrieve,
        }
    }
}

/// A parsed, validated operation request with its correlation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub context: ProvenanceContext,
    pub operation: Operation,
}

impl OperationRequest {
    /// Parse a request from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GatewayError> {
        let wire: WireMessage = serde_json::from_slice(bytes)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        wire.try_into()
    }

    /// Parse a request from an already decoded JSON value.
    pub fn from_value(value: JsonValue) -> Result<Self, GatewayError> {
        let wire: WireMessage = serde_json::from_value(value)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        wire.try_into()
    }

    /// The kind of the requested operation.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    /// Source elements in original order (empty for read operations).
    #[must_use]
    pub fn source_data(&self) -> &[SourceElement] {
        match &self.operation {
            Operation::Add(write) | Operation::Replace(write) => &write.source_data,
            _ => &[],
        }
    }

    /// Target graph of a write operation.
    #[must_use]
    pub fn target_graph(&self) -> Option<&str> {
        match &self.operation {
            Operation::Add(write) | Operation::Replace(write) => Some(&write.target_graph),
            _ => None,
        }
    }
}

/// Best-effort extraction of the correlation context from a raw message.
///
/// Used to address an error envelope to a caller whose request could not be
/// parsed as a whole.
#[must_use]
pub fn extract_context(value: &JsonValue) -> Option<ProvenanceContext> {
    let context = value.get("provenance")?.get("context")?;
    serde_json::from_value(context.clone()).ok()
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[derive(Deserialize)]
struct WireMessage {
    provenance: WireProvenance,
    payload: WirePayload,
}

#[derive(Deserialize)]
struct WireProvenance {
    context: ProvenanceContext,
}

#[derive(Deserialize)]
struct WirePayload {
    #[serde(rename = "graphManagerInput")]
    input: WireInput,
}

/// A single graph URI or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(uri) => vec![uri],
            Self::Many(uris) => uris,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInput {
    activity: OperationKind,
    target_graph: Option<OneOrMany>,
    source_graphs: Option<OneOrMany>,
    #[serde(default)]
    source_data: Vec<SourceElement>,
    #[serde(alias = "query")]
    input: Option<String>,
    output_type: Option<OutputType>,
    output_content_type: Option<String>,
}

impl WireInput {
    fn graph_write(self) -> Result<GraphWrite, GatewayError> {
        let mut targets = self
            .target_graph
            .map(OneOrMany::into_vec)
            .unwrap_or_default();
        if targets.len() != 1 {
            return Err(GatewayError::InvalidRequest(format!(
                "{} requires exactly one targetGraph, got {}",
                self.activity,
                targets.len()
            )));
        }
        if self.source_data.is_empty() {
            return Err(GatewayError::InvalidRequest(format!(
                "{} requires a non-empty sourceData list",
                self.activity
            )));
        }
        Ok(GraphWrite {
            target_graph: targets.remove(0),
            source_data: self.source_data,
        })
    }

    /// Read operations name their graphs in `sourceGraphs`; `targetGraph` is
    /// accepted for callers of the older query endpoint.
    fn read_graphs(&mut self) -> Result<Vec<String>, GatewayError> {
        let graphs = self
            .source_graphs
            .take()
            .or_else(|| self.target_graph.take())
            .map(OneOrMany::into_vec)
            .unwrap_or_default();
        if graphs.is_empty() {
            return Err(GatewayError::InvalidRequest(format!(
                "{} requires at least one source graph",
                self.activity
            )));
        }
        Ok(graphs)
    }

    fn output(&mut self) -> Result<OutputSpec, GatewayError> {
        let output_type = self.output_type.ok_or_else(|| {
            GatewayError::InvalidRequest(format!("{} requires outputType", self.activity))
        })?;
        let content_type = self.output_content_type.take().ok_or_else(|| {
            GatewayError::InvalidRequest(format!("{} requires outputContentType", self.activity))
        })?;
        Ok(OutputSpec {
            output_type,
            content_type,
        })
    }

    fn graph_query(mut self) -> Result<GraphQuery, GatewayError> {
        let source_graphs = self.read_graphs()?;
        let output = self.output()?;
        let query = self
            .input
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::InvalidRequest(format!("{} requires a query", self.activity))
            })?;
        Ok(GraphQuery {
            source_graphs,
            query,
            output,
        })
    }

    fn graph_read(mut self) -> Result<GraphRead, GatewayError> {
        let source_graphs = self.read_graphs()?;
        let output = self.output()?;
        Ok(GraphRead {
            source_graphs,
            output,
        })
    }
}

impl TryFrom<WireMessage> for OperationRequest {
    type Error = GatewayError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let input = wire.payload.input;
        let operation = match input.activity {
            OperationKind::Add => Operation::Add(input.graph_write()?),
            OperationKind::Replace => Operation::Replace(input.graph_write()?),
            OperationKind::Query => Operation::Query(input.graph_query()?),
            OperationKind::Construct => Operation::Construct(input.graph_query()?),
            OperationKind::Retrieve => Operation::Retrieve(input.graph_read()?),
        };
        Ok(Self {
            context: wire.provenance.context,
            operation,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_message(source_data: JsonValue) -> JsonValue {
        json!({
            "provenance": {"context": {"activityID": 7, "workflowID": "wf", "stepID": "s1"}},
            "payload": {"graphManagerInput": {
                "activity": "add",
                "targetGraph": "http://example.org/g1",
                "sourceData": source_data
            }}
        })
    }

    #[test]
    fn parses_add_request() {
        let request = OperationRequest::from_value(add_message(json!([
            {"inputType": "Data", "input": "<a> <b> <c>.", "contentType": "text/turtle"},
            {"inputType": "URI", "input": "http://example.org/data.nt", "contentType": "application/n-triples"}
        ])))
        .expect("valid request");

        assert_eq!(request.kind(), OperationKind::Add);
        assert_eq!(request.target_graph(), Some("http://example.org/g1"));
        assert_eq!(request.source_data().len(), 2);
        assert_eq!(request.source_data()[1].input_type, InputType::Uri);
    }

    #[test]
    fn numeric_ids_render_as_strings() {
        let request = OperationRequest::from_value(add_message(json!([
            {"inputType": "Data", "input": "x", "contentType": "text/turtle"}
        ])))
        .expect("valid request");
        assert_eq!(request.context.activity_id, "7");
        assert_eq!(request.context.step_id.as_deref(), Some("s1"));
    }

    #[test]
    fn empty_source_data_is_rejected() {
        let err = OperationRequest::from_value(add_message(json!([])));
        assert!(matches!(err, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn single_source_graph_string_is_accepted() {
        let request = OperationRequest::from_value(json!({
            "provenance": {"context": {"activityID": "1", "workflowID": "w"}},
            "payload": {"graphManagerInput": {
                "activity": "query",
                "sourceGraphs": "http://example.org/g1",
                "input": "SELECT * WHERE {?s ?p ?o}",
                "outputType": "URI",
                "outputContentType": "application/sparql-results+json"
            }}
        }))
        .expect("valid request");

        match request.operation {
            Operation::Query(query) => {
                assert_eq!(query.source_graphs, vec!["http://example.org/g1".to_string()]);
                assert_eq!(query.output.output_type, OutputType::Uri);
            }
            other => panic!("unexpected operation {other:?}"),
        }
        assert_eq!(request.context.step_id, None);
    }

    #[test]
    fn query_without_text_is_rejected() {
        let err = OperationRequest::from_value(json!({
            "provenance": {"context": {"activityID": "1", "workflowID": "w"}},
            "payload": {"graphManagerInput": {
                "activity": "construct",
                "sourceGraphs": ["http://example.org/g1"],
                "outputType": "Data",
                "outputContentType": "text/turtle"
            }}
        }));
        assert!(matches!(err, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn retrieve_requires_output_spec() {
        let err = OperationRequest::from_value(json!({
            "provenance": {"context": {"activityID": "1", "workflowID": "w"}},
            "payload": {"graphManagerInput": {
                "activity": "retrieve",
                "sourceGraphs": ["http://example.org/g1"]
            }}
        }));
        assert!(matches!(err, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn context_is_extracted_from_unparseable_request() {
        let raw = json!({
            "provenance": {"context": {"activityID": "1", "workflowID": "w", "stepID": ""}},
            "payload": {}
        });
        assert!(OperationRequest::from_value(raw.clone()).is_err());
        let context = extract_context(&raw).expect("context");
        assert_eq!(context, ProvenanceContext::new("1", "w"));
    }
}
