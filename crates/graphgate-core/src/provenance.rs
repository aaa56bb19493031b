//! # Provenance Messages and Response Envelopes
//!
//! The two outbound message shapes of the gateway, and the pure builders that
//! assemble them. Both carry the same agent identity and a verbatim copy of the
//! caller's correlation context, so a response and the provenance record of
//! the same operation can be joined end-to-end.
//!
//! ## Provenance message
//!
//! ```json
//! {
//!   "provenance": {
//!     "agent":    { "ID": "GraphManager", "role": "storage" },
//!     "context":  { "activityID": "...", "workflowID": "...", "stepID": "..." },
//!     "activity": { "type": "ServiceExecution", "title": "...", "status": "success",
//!                   "startTime": "...", "endTime": "..." },
//!     "input":    [ { "key": "inputGraphs_0", "role": "tempDataset" } ],
//!     "output":   [ { "key": "outputGraph", "role": "Dataset" } ]
//!   },
//!   "payload": { "inputGraphs_0": "attx:tempDataset", "outputGraph": "http://..." }
//! }
//! ```
//!
//! ## Response envelope
//!
//! ```json
//! {
//!   "provenance": { "agent": {...}, "context": {...} },
//!   "payload": { "status": "success", "statusMessage": "...",
//!                "graphManagerOutput": "...", "contentType": "...", "outputType": "URI" }
//! }
//! ```

use crate::primitives::{
    ACTIVITY_TITLE, ACTIVITY_TYPE, AGENT_ID, AGENT_ROLE, INPUT_KEY_PREFIX, INPUT_ROLE,
    OUTPUT_KEY, OUTPUT_ROLE, REDACTED_DATA, TIMESTAMP_FORMAT,
};
use crate::{InputType, OperationRequest, OperationStatus, OutputType, ProvenanceContext};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

// =============================================================================
// SHARED PARTS
// =============================================================================

/// The agent identity stamped on every outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "ID")]
    pub id: String,
    pub role: String,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            id: AGENT_ID.to_string(),
            role: AGENT_ROLE.to_string(),
        }
    }
}

/// Format a timestamp the way provenance records carry it.
#[must_use]
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Index-qualified provenance key of the `index`-th source element.
#[must_use]
pub fn input_key(index: usize) -> String {
    format!("{INPUT_KEY_PREFIX}_{index}")
}

// =============================================================================
// PROVENANCE MESSAGE
// =============================================================================

/// What happened, when, with which outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub title: String,
    pub status: OperationStatus,
    pub start_time: String,
    pub end_time: String,
}

/// One input or output dataset of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRole {
    pub key: String,
    pub role: String,
}

/// The `provenance` section of a provenance message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub agent: Agent,
    pub context: ProvenanceContext,
    pub activity: Activity,
    pub input: Vec<DatasetRole>,
    pub output: Vec<DatasetRole>,
}

/// Audit record of one terminal write-operation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceMessage {
    pub provenance: ProvenanceRecord,
    /// Dataset key → URI, or the redaction placeholder for inline data.
    pub payload: Map<String, JsonValue>,
}

impl ProvenanceMessage {
    /// Status recorded in the activity.
    #[must_use]
    pub fn status(&self) -> OperationStatus {
        self.provenance.activity.status
    }
}

/// Build the provenance message for one terminal outcome of `request`.
///
/// `input` enumerates every source element in original order; inline data is
/// recorded as [`REDACTED_DATA`], URI sources as the literal URI.
#[must_use]
pub fn build_provenance(
    request: &OperationRequest,
    status: OperationStatus,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
) -> ProvenanceMessage {
    let mut payload = Map::new();
    let mut input = Vec::with_capacity(request.source_data().len());

    for (index, source) in request.source_data().iter().enumerate() {
        let key = input_key(index);
        let recorded = match source.input_type {
            InputType::Data => REDACTED_DATA.to_string(),
            InputType::Uri => source.input.clone(),
        };
        payload.insert(key.clone(), JsonValue::String(recorded));
        input.push(DatasetRole {
            key,
            role: INPUT_ROLE.to_string(),
        });
    }

    if let Some(target) = request.target_graph() {
        payload.insert(OUTPUT_KEY.to_string(), JsonValue::String(target.to_string()));
    }

    ProvenanceMessage {
        provenance: ProvenanceRecord {
            agent: Agent::default(),
            context: request.context.clone(),
            activity: Activity {
                activity_type: ACTIVITY_TYPE.to_string(),
                title: ACTIVITY_TITLE.to_string(),
                status,
                start_time: format_timestamp(start_time),
                end_time: format_timestamp(end_time),
            },
            input,
            output: vec![DatasetRole {
                key: OUTPUT_KEY.to_string(),
                role: OUTPUT_ROLE.to_string(),
            }],
        },
        payload,
    }
}

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// A result handed back to the caller, inline or by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutput {
    /// Inline content (`Data`) or the path it was persisted to (`URI`).
    #[serde(rename = "graphManagerOutput")]
    pub output: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(rename = "outputType")]
    pub output_type: OutputType,
}

/// Agent and correlation context of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub agent: Agent,
    pub context: ProvenanceContext,
}

/// Outcome section of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub status: OperationStatus,
    #[serde(
        rename = "statusMessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_message: Option<String>,
    #[serde(flatten)]
    pub output: Option<OperationOutput>,
}

/// Caller-facing answer to one operation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub provenance: ResponseHeader,
    pub payload: ResponsePayload,
}

impl ResponseEnvelope {
    /// Success envelope, optionally carrying an output.
    #[must_use]
    pub fn success(context: &ProvenanceContext, output: Option<OperationOutput>) -> Self {
        build_response(context, OperationStatus::Success, None, output)
    }

    /// Error envelope carrying the failure reason.
    #[must_use]
    pub fn error(context: &ProvenanceContext, message: impl Into<String>) -> Self {
        build_response(context, OperationStatus::Error, Some(message.into()), None)
    }

    /// Outcome recorded in the payload.
    #[must_use]
    pub fn status(&self) -> OperationStatus {
        self.payload.status
    }
}

/// Build a response envelope addressed to `context`.
#[must_use]
pub fn build_response(
    context: &ProvenanceContext,
    status: OperationStatus,
    status_message: Option<String>,
    output: Option<OperationOutput>,
) -> ResponseEnvelope {
    ResponseEnvelope {
        provenance: ResponseHeader {
            agent: Agent::default(),
            context: context.clone(),
        },
        payload: ResponsePayload {
            status,
            status_message,
            output,
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================
