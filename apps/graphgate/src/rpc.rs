//! # RPC Channel
//!
//! Request/reply access to the orchestrator over the broker.
//!
//! [`handle_message`] turns one raw message body into exactly one
//! [`ResponseEnvelope`]; it never fails. [`RpcServer`] polls the RPC queue,
//! handles each message and publishes the envelope to the message's
//! `reply_to` queue under its `correlation_id`.

use crate::broker::{BrokerClient, BrokerMessage};
use crate::pipeline::Pipeline;
use crate::publish::ProvenancePublisher;
use graphgate_core::{
    GatewayError, OperationRequest, ProvenanceContext, ResponseEnvelope, extract_context,
};
use serde_json::Value as JsonValue;
use std::future;
use std::time::Duration;

/// Answer one inbound message.
///
/// A message that cannot be parsed at all is answered with an empty context;
/// one that parses but fails validation keeps whatever context it carried.
pub async fn handle_message<P: ProvenancePublisher>(
    pipeline: &Pipeline<P>,
    body: &[u8],
) -> ResponseEnvelope {
    let value: JsonValue = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            let err = GatewayError::InvalidRequest(e.to_string());
            tracing::error!("Rejected RPC message: {}", err);
            return ResponseEnvelope::error(&ProvenanceContext::new("", ""), err.to_string());
        }
    };

    let context = extract_context(&value).unwrap_or_else(|| ProvenanceContext::new("", ""));
    let request = match OperationRequest::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            tracing::error!("Rejected RPC message for activity {}: {}", context.activity_id, err);
            return ResponseEnvelope::error(&context, err.to_string());
        }
    };

    match pipeline.execute(&request).await {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::error!(
                "RPC {} for activity {} failed ({}): {}",
                request.kind(),
                request.context.activity_id,
                err.kind(),
                err
            );
            ResponseEnvelope::error(&request.context, err.to_string())
        }
    }
}

/// Polls the RPC queue until Ctrl-C.
pub struct RpcServer<P> {
    pipeline: Pipeline<P>,
    broker: BrokerClient,
    queue: String,
    poll_interval: Duration,
}

impl<P: ProvenancePublisher> RpcServer<P> {
    #[must_use]
    pub fn new(
        pipeline: Pipeline<P>,
        broker: BrokerClient,
        queue: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            broker,
            queue: queue.into(),
            poll_interval,
        }
    }

    /// Take one message off the queue and answer it.
    ///
    /// Returns `false` when the queue was empty.
    pub async fn poll_once(&self) -> Result<bool, GatewayError> {
        match self.broker.fetch_one(&self.queue).await? {
            Some(message) => {
                self.respond(message).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), GatewayError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Cannot listen for Ctrl-C: {}", e);
            }
        })
        .await
    }

    /// Serve until `shutdown` completes.
    ///
    /// The broker acknowledges a message when it hands it out, so a fetch in
    /// flight always runs to completion and its message is answered; shutdown
    /// is only observed between messages.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Consuming RPC requests from queue {}", self.queue);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = future::ready(()) => {}
            }
            match self.broker.fetch_one(&self.queue).await {
                Ok(Some(message)) => {
                    self.respond(message).await;
                    continue;
                }
                Ok(None) => {}
                Err(err) => tracing::error!("Polling {} failed: {}", self.queue, err),
            }
            tokio::select! {
                () = &mut shutdown => break,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("RPC consumer stopped");
        Ok(())
    }

    async fn respond(&self, message: BrokerMessage) {
        let envelope = handle_message(&self.pipeline, &message.body).await;

        let Some(reply_to) = message.reply_to else {
            tracing::warn!(
                "RPC message without reply_to answered {}; response dropped",
                envelope.status()
            );
            return;
        };
        if let Err(err) = self
            .broker
            .publish(&reply_to, &envelope, message.correlation_id.as_deref())
            .await
        {
            tracing::error!("Reply to {} failed: {}", reply_to, err);
        }
    }
}
