//! # graphgate-core
//!
//! The deterministic half of the Graph Manager gateway - THE LOGIC.
//!
//! This crate describes graph-store operations and their outcomes without
//! performing any of them:
//! - `request`: typed, validated operation requests
//! - `provenance`: provenance messages and response envelopes
//! - `formats`: the content-type table and RDF merge/re-serialization
//! - `types`: shared enums and the `GatewayError` type
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Builders are pure: the caller supplies timestamps
//! - Network, filesystem and broker access live in the `graphgate` app crate

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod primitives;
pub mod provenance;
pub mod request;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{GatewayError, InputType, OperationKind, OperationStatus, OutputType};

// =============================================================================
// RE-EXPORTS: Requests and Messages
// =============================================================================

pub use request::{
    GraphQuery, GraphRead, GraphWrite, Operation, OperationRequest, OutputSpec,
    ProvenanceContext, SourceElement, extract_context,
};
pub use provenance::{
    Agent, OperationOutput, ProvenanceMessage, ResponseEnvelope, build_provenance,
    build_response, format_timestamp,
};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{ContentType, MergedGraph, file_extension};
