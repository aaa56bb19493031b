//! # Operation Orchestrator
//!
//! Runs one validated [`OperationRequest`] against the graph store and turns
//! the outcome into a [`ResponseEnvelope`].
//!
//! ## Writes (Add, Replace)
//!
//! Source elements are resolved and written strictly in order; the first
//! failure stops the sequence and nothing already written is rolled back.
//! Every terminal outcome publishes exactly one provenance message:
//!
//! - success: publish `success` provenance, answer with a success envelope
//! - failure: publish `error` provenance, then return the original error
//! - failure + publish failure: `PublishFailure` is returned, carrying the
//!   original error, which is also logged
//!
//! ## Reads (Query, Construct, Retrieve)
//!
//! Reads publish no provenance. Their result is materialized inline or to a
//! file according to the requested output type.

use crate::broker::BrokerClient;
use crate::config::GatewayConfig;
use crate::materialize::Materializer;
use crate::publish::{BrokerPublisher, ProvenancePublisher};
use crate::source::SourceResolver;
use crate::store::{GraphFetch, GraphStoreClient};
use chrono::{Local, NaiveDateTime};
use graphgate_core::formats::RdfFormat;
use graphgate_core::{
    ContentType, GatewayError, GraphQuery, GraphRead, GraphWrite, MergedGraph, Operation,
    OperationOutput, OperationRequest, OperationStatus, ProvenanceContext, ResponseEnvelope,
    build_provenance,
};

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// The orchestrator: store, source resolver, materializer and publisher.
pub struct Pipeline<P> {
    store: GraphStoreClient,
    sources: SourceResolver,
    materializer: Materializer,
    publisher: P,
}

impl Pipeline<BrokerPublisher> {
    /// Wire every component from one resolved configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let broker = BrokerClient::new(&config.broker, &config.timeouts)?;
        Ok(Self::new(
            GraphStoreClient::new(&config.store, &config.timeouts)?,
            SourceResolver::new(&config.timeouts)?,
            Materializer::new(&config.output),
            BrokerPublisher::new(broker, config.broker.provenance_queue.clone()),
        ))
    }
}

impl<P: ProvenancePublisher> Pipeline<P> {
    #[must_use]
    pub fn new(
        store: GraphStoreClient,
        sources: SourceResolver,
        materializer: Materializer,
        publisher: P,
    ) -> Self {
        Self {
            store,
            sources,
            materializer,
            publisher,
        }
    }

    /// The store client, for operations that need no orchestration.
    #[must_use]
    pub fn store(&self) -> &GraphStoreClient {
        &self.store
    }

    /// Run one operation to its terminal outcome.
    pub async fn execute(
        &self,
        request: &OperationRequest,
    ) -> Result<ResponseEnvelope, GatewayError> {
        tracing::info!(
            "Running {} for activity {}",
            request.kind(),
            request.context.activity_id
        );
        match &request.operation {
            Operation::Add(write) => self.write(request, write, false).await,
            Operation::Replace(write) => self.write(request, write, true).await,
            Operation::Query(query) => self.read(&request.context, self.query(query)).await,
            Operation::Construct(query) => {
                self.read(&request.context, self.construct(query)).await
            }
            Operation::Retrieve(read) => self.read(&request.context, self.retrieve(read)).await,
        }
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    async fn write(
        &self,
        request: &OperationRequest,
        write: &GraphWrite,
        replace: bool,
    ) -> Result<ResponseEnvelope, GatewayError> {
        let start_time = now();
        let outcome = self.apply_sources(write, replace).await;
        let end_time = now();

        match outcome {
            Ok(()) => {
                let message =
                    build_provenance(request, OperationStatus::Success, start_time, end_time);
                if let Err(publish_err) = self.publisher.publish(&message).await {
                    tracing::error!(
                        "{} into {} succeeded but its provenance was not published: {}",
                        request.kind(),
                        write.target_graph,
                        publish_err
                    );
                    return Err(publish_err);
                }
                tracing::info!(
                    "{} into {} completed with {} source(s)",
                    request.kind(),
                    write.target_graph,
                    write.source_data.len()
                );
                Ok(ResponseEnvelope::success(&request.context, None))
            }
            Err(err) => {
                let message =
                    build_provenance(request, OperationStatus::Error, start_time, end_time);
                match self.publisher.publish(&message).await {
                    Ok(()) => {
                        tracing::error!(
                            "{} into {} failed ({}): {}",
                            request.kind(),
                            write.target_graph,
                            err.kind(),
                            err
                        );
                        Err(err)
                    }
                    Err(publish_err) => {
                        tracing::error!(
                            "{} into {} failed ({}): {}; error provenance not published: {}",
                            request.kind(),
                            write.target_graph,
                            err.kind(),
                            err,
                            publish_err
                        );
                        Err(supersede(publish_err, &err))
                    }
                }
            }
        }
    }

    /// Replace writes element 0 with PUT; every other element is merged with POST.
    async fn apply_sources(&self, write: &GraphWrite, replace: bool) -> Result<(), GatewayError> {
        for (index, source) in write.source_data.iter().enumerate() {
            let payload = self.sources.resolve(source).await?;
            if replace && index == 0 {
                self.store
                    .replace_graph_data(&write.target_graph, payload, &source.content_type)
                    .await?;
            } else {
                self.store
                    .add_graph_data(&write.target_graph, payload, &source.content_type)
                    .await?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    async fn read<F>(
        &self,
        context: &ProvenanceContext,
        result: F,
    ) -> Result<ResponseEnvelope, GatewayError>
    where
        F: Future<Output = Result<OperationOutput, GatewayError>>,
    {
        match result.await {
            Ok(output) => Ok(ResponseEnvelope::success(context, Some(output))),
            Err(err) => {
                tracing::error!(
                    "Read for activity {} failed ({}): {}",
                    context.activity_id,
                    err.kind(),
                    err
                );
                Err(err)
            }
        }
    }

    async fn query(&self, query: &GraphQuery) -> Result<OperationOutput, GatewayError> {
        let content = self
            .store
            .sparql_query(&query.source_graphs, &query.query, &query.output.content_type)
            .await?;
        self.materializer
            .materialize(content, query.output.output_type, &query.output.content_type)
            .await
    }

    async fn construct(&self, query: &GraphQuery) -> Result<OperationOutput, GatewayError> {
        let content = self
            .store
            .sparql_construct(&query.source_graphs, &query.query, &query.output.content_type)
            .await?;
        self.materializer
            .materialize(content, query.output.output_type, &query.output.content_type)
            .await
    }

    /// Missing graphs contribute nothing; they do not fail the read.
    async fn retrieve(&self, read: &GraphRead) -> Result<OperationOutput, GatewayError> {
        let (_, format) = ContentType::rdf_graph(&read.output.content_type)?;

        let mut merged = MergedGraph::new();
        for graph_uri in &read.source_graphs {
            match self.store.retrieve_graph(graph_uri).await? {
                GraphFetch::Found(document) => {
                    merged.merge_document(&document, RdfFormat::Turtle)?;
                }
                GraphFetch::NotFound => {
                    tracing::info!("Skipping missing graph {} in retrieve", graph_uri);
                }
            }
        }

        let content = merged.serialize(format)?;
        self.materializer
            .materialize(content, read.output.output_type, &read.output.content_type)
            .await
    }
}

/// The publish failure that replaces `original` as the visible error.
fn supersede(publish_err: GatewayError, original: &GatewayError) -> GatewayError {
    let reason = match publish_err {
        GatewayError::PublishFailure { reason, .. } => reason,
        other => other.to_string(),
    };
    GatewayError::PublishFailure {
        reason,
        underlying: Some(original.to_string()),
    }
}
