//! # RDF Merge and Re-serialization
//!
//! Retrieve merges several serialized graphs into one logical graph and emits
//! it in the caller's content type; Construct converts the store's transfer
//! serialization into the caller's content type. Both go through here.
//!
//! The merged graph is a set: a triple present in several source documents
//! appears once in the output.

use crate::GatewayError;
use oxrdf::{Graph, Triple};
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};

/// An in-memory union of parsed graph documents.
#[derive(Debug, Default)]
pub struct MergedGraph {
    graph: Graph,
}

impl MergedGraph {
    /// Create an empty merged graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `document` and add its triples.
    ///
    /// Blank nodes get fresh labels on every call, so two documents that both
    /// say `_:b0` contribute two distinct nodes.
    ///
    /// Returns the number of statements the document contained.
    pub fn merge_document(
        &mut self,
        document: &str,
        format: RdfFormat,
    ) -> Result<usize, GatewayError> {
        let mut parsed = 0usize;
        for quad in RdfParser::from_format(format)
            .rename_blank_nodes()
            .for_reader(document.as_bytes()) {
            let quad = quad.map_err(|e| GatewayError::RdfSyntax(e.to_string()))?;
            let triple = Triple::from(quad);
            self.graph.insert(&triple);
            parsed += 1;
        }
        Ok(parsed)
    }

    /// Number of distinct triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Whether no triple has been merged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Serialize the merged graph.
    pub fn serialize(&self, format: RdfFormat) -> Result<String, GatewayError> {
        let mut writer = RdfSerializer::from_format(format).for_writer(Vec::new());
        for triple in self.graph.iter() {
            writer
                .serialize_triple(triple)
                .map_err(|e| GatewayError::RdfSyntax(e.to_string()))?;
        }
        let bytes = writer
            .finish()
            .map_err(|e| GatewayError::RdfSyntax(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| GatewayError::RdfSyntax(e.to_string()))
    }
}

/// Re-serialize a single document from one RDF format into another.
pub fn convert(document: &str, from: RdfFormat, to: RdfFormat) -> Result<String, GatewayError> {
    let mut graph = MergedGraph::new();
    graph.merge_document(document, from)?;
    graph.serialize(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_A: &str = "@prefix ex: <http://example.org/> .\n\
                         ex:s ex:p ex:o .\n\
                         ex:s ex:p ex:o2 .\n";
    const DOC_B: &str = "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n\
                         <http://example.org/x> <http://example.org/p> \"lit\" .\n";

    #[test]
    fn merge_deduplicates_triples() {
        let mut graph = MergedGraph::new();
        assert_eq!(
            graph
                .merge_document(DOC_A, RdfFormat::Turtle)
                .expect("doc a"),
            2
        );
        assert_eq!(
            graph
                .merge_document(DOC_B, RdfFormat::Turtle)
                .expect("doc b"),
            2
        );
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn convert_turtle_to_ntriples() {
        let out = convert(DOC_A, RdfFormat::Turtle, RdfFormat::NTriples).expect("convert");
        assert!(out.contains("<http://example.org/s> <http://example.org/p> <http://example.org/o> ."));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn serialized_output_parses_back() {
        let mut graph = MergedGraph::new();
        graph
            .merge_document(DOC_B, RdfFormat::NTriples)
            .expect("merge");
        let turtle = graph.serialize(RdfFormat::Turtle).expect("serialize");

        let mut reparsed = MergedGraph::new();
        reparsed
            .merge_document(&turtle, RdfFormat::Turtle)
            .expect("reparse");
        assert_eq!(reparsed.len(), graph.len());
    }

    #[test]
    fn blank_nodes_stay_distinct_across_documents() {
        let mut graph = MergedGraph::new();
        graph
            .merge_document("_:b0 <http://example.org/name> \"alice\" .\n", RdfFormat::Turtle)
            .expect("alice");
        graph
            .merge_document("_:b0 <http://example.org/name> \"bob\" .\n", RdfFormat::Turtle)
            .expect("bob");

        let out = graph.serialize(RdfFormat::NTriples).expect("serialize");
        let subjects: std::collections::BTreeSet<&str> = out
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .collect();
        assert_eq!(graph.len(), 2);
        assert_eq!(subjects.len(), 2);
    }

    #[test]
    fn malformed_document_is_syntax_error() {
        let mut graph = MergedGraph::new();
        let err = graph.merge_document("ex:s ex:p", RdfFormat::Turtle);
        assert!(matches!(err, Err(GatewayError::RdfSyntax(_))));
    }

    #[test]
    fn empty_graph_is_empty() {
        let graph = MergedGraph::new();
        assert!(graph.is_empty());
        assert_eq!(
            graph.serialize(RdfFormat::NTriples).expect("serialize"),
            ""
        );
    }
}
