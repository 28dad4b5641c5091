use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::value_objects::Namespace;

/// Provider limit on records per upsert call.
pub const MAX_UPSERT_BATCH: usize = 96;

#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Batch of {size} records exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
    #[error("Embedding error: {0}")]
    EmbeddingError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub text: String,
    pub page: i32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upserts one batch; records with an existing id are overwritten.
    async fn upsert(
        &self,
        namespace: &Namespace,
        records: &[VectorRecord],
    ) -> Result<usize, VectorIndexError>;

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorIndexError>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, VectorIndexError>;

    fn max_batch_size(&self) -> usize {
        MAX_UPSERT_BATCH
    }
}
