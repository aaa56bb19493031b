//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the gateway:
//! - Source and output modes (`InputType`, `OutputType`)
//! - Operation kinds (`OperationKind`)
//! - Terminal outcome of an operation (`OperationStatus`)
//! - Error types (`GatewayError`)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// SOURCE / OUTPUT MODES
// =============================================================================

/// How a source element carries its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputType {
    /// The `input` field is the literal payload.
    Data,
    /// The `input` field is a URI the payload must be fetched from.
    #[serde(rename = "URI")]
    Uri,
}

/// How an operation result is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputType {
    /// Inline content.
    Data,
    /// Path of a file the result was persisted to.
    #[serde(rename = "URI")]
    Uri,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "Data"),
            Self::Uri => write!(f, "URI"),
        }
    }
}

// =============================================================================
// OPERATION KIND
// =============================================================================

/// The logical graph operations a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Merge source data into the target graph.
    Add,
    /// Replace the target graph with the first source, then add the rest.
    Replace,
    /// SPARQL SELECT/ASK over the source graphs.
    Query,
    /// SPARQL CONSTRUCT over the source graphs.
    Construct,
    /// Fetch and merge the source graphs.
    Retrieve,
}

impl OperationKind {
    /// Whether this operation mutates the store (and therefore emits provenance).
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Add | Self::Replace)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Query => "query",
            Self::Construct => "construct",
            Self::Retrieve => "retrieve",
        };
        f.write_str(name)
    }
}

// =============================================================================
// OPERATION STATUS
// =============================================================================

/// Terminal outcome recorded in provenance messages and response envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Error,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur anywhere in the gateway.
///
/// - No silent failures, no automatic retries
/// - Every variant reaches the immediate caller
/// - `NotFound` is only produced where a missing graph is an error for the
///   caller; the store client reports absence as a value
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The triple store could not be reached.
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// The triple store answered with an error status.
    #[error("Graph store rejected request ({status}): {body}")]
    StoreRejected { status: u16, body: String },

    /// The named graph does not exist.
    #[error("Graph not found: {0}")]
    NotFound(String),

    /// The MIME type has no mapping for the requested use.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// A materialized result could not be written.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// The broker could not accept a provenance or response message.
    #[error("Publish failure: {reason}")]
    PublishFailure {
        reason: String,
        /// The operation failure this publish failure superseded, if any.
        underlying: Option<String>,
    },

    /// The broker could not be polled for inbound requests.
    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// The request lacks a field its operation kind requires.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A URI-typed source could not be read.
    #[error("Source fetch failed: {0}")]
    SourceFetch(String),

    /// A graph document could not be parsed or serialized.
    #[error("RDF syntax error: {0}")]
    RdfSyntax(String),

    /// Configuration could not be loaded or applied.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// HTTP status an HTTP caller receives for this failure.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::NotFound(_) => 410,
            Self::UnsupportedContentType(_) => 415,
            Self::SourceFetch(_) | Self::RdfSyntax(_) => 422,
            Self::StoreRejected { .. } => 502,
            Self::StoreUnavailable(_) | Self::BrokerUnavailable(_) => 503,
            Self::PersistenceError(_) | Self::PublishFailure { .. } | Self::Configuration(_) => {
                500
            }
        }
    }

    /// Short stable name of the error kind, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "StoreUnavailable",
            Self::StoreRejected { .. } => "StoreRejected",
            Self::NotFound(_) => "NotFound",
            Self::UnsupportedContentType(_) => "UnsupportedContentType",
            Self::PersistenceError(_) => "PersistenceError",
            Self::PublishFailure { .. } => "PublishFailure",
            Self::BrokerUnavailable(_) => "BrokerUnavailable",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::SourceFetch(_) => "SourceFetch",
            Self::RdfSyntax(_) => "RdfSyntax",
            Self::Configuration(_) => "Configuration",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
