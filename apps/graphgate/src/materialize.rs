//! # Result Materializer
//!
//! Hands an operation result back inline, or persists it under the results
//! directory and hands back the path.
//!
//! Persisted results live at `<results_dir>/<uuid>/<uuid>.<ext>`; ownership of
//! the file passes to whoever consumes the path.

use crate::config::OutputConfig;
use graphgate_core::{GatewayError, OperationOutput, OutputType, file_extension};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Materializer {
    results_dir: PathBuf,
}

impl Materializer {
    #[must_use]
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            results_dir: output.results_dir.clone(),
        }
    }

    /// Return `content` as-is (`Data`) or persist it and return its path (`URI`).
    pub async fn materialize(
        &self,
        content: String,
        output_type: OutputType,
        content_type: &str,
    ) -> Result<OperationOutput, GatewayError> {
        let output = match output_type {
            OutputType::Data => content,
            OutputType::Uri => self.persist(&content, content_type).await?,
        };
        Ok(OperationOutput {
            output,
            content_type: content_type.to_string(),
            output_type,
        })
    }

    async fn persist(&self, content: &str, content_type: &str) -> Result<String, GatewayError> {
        let extension = file_extension(content_type)?;
        let dir = self.results_dir.join(Uuid::new_v4().simple().to_string());
        let path = dir.join(format!("{}.{extension}", Uuid::new_v4().simple()));

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| GatewayError::PersistenceError(format!("{}: {e}", dir.display())))?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| GatewayError::PersistenceError(format!("{}: {e}", path.display())))?;

        tracing::info!("Materialized {} result at {}", content_type, path.display());
        Ok(path.to_string_lossy().into_owned())
    }
}
