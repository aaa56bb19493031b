//! # Provenance Publishing
//!
//! The outbound channel for provenance messages. The orchestrator only sees
//! [`ProvenancePublisher`]; [`BrokerPublisher`] is the production channel.

use crate::broker::BrokerClient;
use graphgate_core::{GatewayError, ProvenanceMessage};
use std::future::Future;

/// Accepts one provenance message per terminal write outcome.
///
/// Implementations report every failure as `GatewayError::PublishFailure`.
pub trait ProvenancePublisher: Send + Sync {
    fn publish(
        &self,
        message: &ProvenanceMessage,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Publishes provenance messages to the provenance queue of the broker.
#[derive(Clone)]
pub struct BrokerPublisher {
    broker: BrokerClient,
    queue: String,
}

impl BrokerPublisher {
    #[must_use]
    pub fn new(broker: BrokerClient, queue: impl Into<String>) -> Self {
        Self {
            broker,
            queue: queue.into(),
        }
    }
}

impl ProvenancePublisher for BrokerPublisher {
    async fn publish(&self, message: &ProvenanceMessage) -> Result<(), GatewayError> {
        self.broker.publish(&self.queue, message, None).await?;
        tracing::info!(
            "Published {} provenance for activity {}",
            message.status(),
            message.provenance.context.activity_id
        );
        Ok(())
    }
}
