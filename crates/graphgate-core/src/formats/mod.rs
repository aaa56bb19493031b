//! # Formats
//!
//! Media types understood by the gateway and the RDF plumbing built on them.

pub mod content_type;
pub mod rdf;

pub use content_type::{ContentType, file_extension};
pub use oxrdfio::RdfFormat;
pub use rdf::{MergedGraph, convert};
