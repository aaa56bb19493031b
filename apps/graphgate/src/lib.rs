//! # graphgate
//!
//! The I/O half of the Graph Manager gateway: everything that talks to the
//! triple store, the filesystem or the broker.
//!
//! - `config`: the immutable gateway configuration
//! - `store`: SPARQL 1.1 graph store client
//! - `source`: payload resolution of `sourceData` elements
//! - `materialize`: inline or file-backed operation results
//! - `broker`, `publish`: broker management API and the provenance channel
//! - `pipeline`: the operation orchestrator
//! - `rpc`: request/reply handling over the broker

pub mod broker;
pub mod config;
pub mod materialize;
pub mod pipeline;
pub mod publish;
pub mod rpc;
pub mod source;
pub mod store;

pub use config::GatewayConfig;
pub use pipeline::Pipeline;
pub use publish::{BrokerPublisher, ProvenancePublisher};
pub use store::GraphStoreClient;
