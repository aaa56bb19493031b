//! # Content Types
//!
//! The fixed table of media types the gateway understands, and the file
//! extension each one is materialized with.
//!
//! | Media type                        | Extension | Kind            |
//! |-----------------------------------|-----------|-----------------|
//! | `text/turtle`                     | `ttl`     | RDF graph       |
//! | `application/n-triples`           | `nt`      | RDF graph       |
//! | `text/n3`                         | `n3`      | RDF graph       |
//! | `application/trig`                | `trig`    | RDF graph       |
//! | `application/rdf+xml`             | `xml`     | RDF graph       |
//! | `application/sparql-results+xml`  | `xml`     | SPARQL results  |
//! | `application/sparql-results+json` | `json`    | SPARQL results  |

use crate::GatewayError;
use oxrdfio::RdfFormat;

/// A recognised media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Turtle,
    NTriples,
    N3,
    TriG,
    RdfXml,
    SparqlResultsXml,
    SparqlResultsJson,
}

impl ContentType {
    /// Every recognised media type, in table order.
    pub const ALL: [Self; 7] = [
        Self::Turtle,
        Self::NTriples,
        Self::N3,
        Self::TriG,
        Self::RdfXml,
        Self::SparqlResultsXml,
        Self::SparqlResultsJson,
    ];

    /// Look up a media type, ignoring parameters such as `; charset=utf-8`.
    pub fn parse(media_type: &str) -> Result<Self, GatewayError> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ct| ct.media_type() == essence)
            .ok_or_else(|| GatewayError::UnsupportedContentType(media_type.to_string()))
    }

    /// Canonical media type string.
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::NTriples => "application/n-triples",
            Self::N3 => "text/n3",
            Self::TriG => "application/trig",
            Self::RdfXml => "application/rdf+xml",
            Self::SparqlResultsXml => "application/sparql-results+xml",
            Self::SparqlResultsJson => "application/sparql-results+json",
        }
    }

    /// File extension used when a result of this type is materialized.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Turtle => "ttl",
            Self::NTriples => "nt",
            Self::N3 => "n3",
            Self::TriG => "trig",
            Self::RdfXml | Self::SparqlResultsXml => "xml",
            Self::SparqlResultsJson => "json",
        }
    }

    /// Whether this is a SPARQL results encoding (SELECT/ASK output).
    #[must_use]
    pub const fn is_sparql_results(self) -> bool {
        matches!(self, Self::SparqlResultsXml | Self::SparqlResultsJson)
    }

    /// The RDF serialization format, for graph media types only.
    #[must_use]
    pub const fn rdf_format(self) -> Option<RdfFormat> {
        match self {
            Self::Turtle => Some(RdfFormat::Turtle),
            Self::NTriples => Some(RdfFormat::NTriples),
            Self::N3 => Some(RdfFormat::N3),
            Self::TriG => Some(RdfFormat::TriG),
            Self::RdfXml => Some(RdfFormat::RdfXml),
            Self::SparqlResultsXml | Self::SparqlResultsJson => None,
        }
    }

    /// Parse a media type that must name a SPARQL results encoding.
    pub fn sparql_results(media_type: &str) -> Result<Self, GatewayError> {
        let ct = Self::parse(media_type)?;
        if ct.is_sparql_results() {
            Ok(ct)
        } else {
            Err(GatewayError::UnsupportedContentType(format!(
                "{media_type} is not a SPARQL results type"
            )))
        }
    }

    /// Parse a media type that must name an RDF graph serialization.
    pub fn rdf_graph(media_type: &str) -> Result<(Self, RdfFormat), GatewayError> {
        let ct = Self::parse(media_type)?;
        ct.rdf_format().map(|format| (ct, format)).ok_or_else(|| {
            GatewayError::UnsupportedContentType(format!(
                "{media_type} is not an RDF graph serialization"
            ))
        })
    }
}

/// File extension for a media type string.
pub fn file_extension(media_type: &str) -> Result<&'static str, GatewayError> {
    ContentType::parse(media_type).map(ContentType::extension)
}
