//! # CLI Command Implementations

use graphgate::broker::BrokerClient;
use graphgate::config::GatewayConfig;
use graphgate::pipeline::Pipeline;
use graphgate::rpc::RpcServer;
use graphgate::store::{GraphFetch, GraphStoreClient};
use graphgate_core::{GatewayError, OperationRequest, ResponseEnvelope};
use std::path::Path;
use std::time::Duration;

/// Maximum size of a request file (100 MB).
const MAX_REQUEST_FILE_SIZE: u64 = 100 * 1024 * 1024;

fn store_client(config: &GatewayConfig) -> Result<GraphStoreClient, GatewayError> {
    GraphStoreClient::new(&config.store, &config.timeouts)
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// STORE COMMANDS
// =============================================================================

/// Ping the graph store.
pub async fn cmd_health(config: &GatewayConfig, json_mode: bool) -> Result<(), GatewayError> {
    let store = store_client(config)?;
    store.health().await?;

    if json_mode {
        print_json(&serde_json::json!({
            "store": config.store.base_url(),
            "dataset": store.dataset(),
            "status": "ok"
        }));
        return Ok(());
    }
    println!("Graph store {} is up", config.store.base_url());
    Ok(())
}

/// List named graphs.
pub async fn cmd_list(config: &GatewayConfig, json_mode: bool) -> Result<(), GatewayError> {
    let listing = store_client(config)?.list_graphs().await?;

    if json_mode {
        print_json(&listing);
        return Ok(());
    }

    println!("Named Graphs ({})", listing.graphs_count);
    println!("==================");
    for graph in &listing.graphs {
        println!("{:>10}  {}", graph.triple_count, graph.graph_uri);
    }
    Ok(())
}

/// Show dataset statistics.
pub async fn cmd_stats(config: &GatewayConfig, json_mode: bool) -> Result<(), GatewayError> {
    let stats = store_client(config)?.statistics().await?;

    if json_mode {
        print_json(&stats);
        return Ok(());
    }

    println!("Dataset Statistics");
    println!("==================");
    println!("Dataset:         {}", stats.dataset);
    println!("Requests:        {}", stats.requests.total_requests);
    println!("Failed Requests: {}", stats.requests.failed_requests);
    println!("Triples:         {}", stats.total_triples);
    Ok(())
}

/// Print a named graph as the store serializes it.
pub async fn cmd_retrieve(config: &GatewayConfig, uri: &str) -> Result<(), GatewayError> {
    match store_client(config)?.retrieve_graph(uri).await? {
        GraphFetch::Found(document) => {
            print!("{document}");
            Ok(())
        }
        GraphFetch::NotFound => Err(GatewayError::NotFound(uri.to_string())),
    }
}

/// Drop a named graph.
pub async fn cmd_drop(
    config: &GatewayConfig,
    json_mode: bool,
    uri: &str,
) -> Result<(), GatewayError> {
    store_client(config)?.drop_graph(uri).await?;

    if json_mode {
        print_json(&serde_json::json!({ "dropped": uri }));
    } else {
        println!("Dropped graph {uri}");
    }
    Ok(())
}

// =============================================================================
// OPERATION COMMANDS
// =============================================================================

/// Run one operation request and print its response envelope.
///
/// A failed operation still prints an envelope; the error is returned so the
/// process exits non-zero.
pub async fn cmd_execute(config: &GatewayConfig, file: &Path) -> Result<(), GatewayError> {
    let metadata = tokio::fs::metadata(file).await.map_err(|e| {
        GatewayError::InvalidRequest(format!("Cannot read '{}': {}", file.display(), e))
    })?;
    if metadata.len() > MAX_REQUEST_FILE_SIZE {
        return Err(GatewayError::InvalidRequest(format!(
            "Request file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_REQUEST_FILE_SIZE
        )));
    }
    let bytes = tokio::fs::read(file).await.map_err(|e| {
        GatewayError::InvalidRequest(format!("Cannot read '{}': {}", file.display(), e))
    })?;

    let request = OperationRequest::from_slice(&bytes)?;
    let pipeline = Pipeline::from_config(config)?;

    match pipeline.execute(&request).await {
        Ok(envelope) => {
            print_json(&envelope);
            Ok(())
        }
        Err(err) => {
            print_json(&ResponseEnvelope::error(&request.context, err.to_string()));
            Err(err)
        }
    }
}

/// Consume the RPC queue until Ctrl-C.
pub async fn cmd_rpc(config: &GatewayConfig) -> Result<(), GatewayError> {
    let broker = BrokerClient::new(&config.broker, &config.timeouts)?;
    let server = RpcServer::new(
        Pipeline::from_config(config)?,
        broker,
        config.broker.rpc_queue.clone(),
        Duration::from_millis(config.broker.poll_interval_ms),
    );

    println!("Graph Manager RPC consumer");
    println!();
    println!("Configuration:");
    println!("  Store:  {}/{}", config.store.base_url(), config.store.dataset);
    println!("  Broker: {}", config.broker.management_url());
    println!("  Queue:  {}", config.broker.rpc_queue);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    server.run().await
}
