use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::Chunk;
use crate::domain::value_objects::Namespace;

#[derive(Debug, Error)]
pub enum ChunkRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Inserts the chunks; ids already present in the namespace are overwritten.
    async fn save_batch(&self, chunks: &[Chunk]) -> Result<(), ChunkRepositoryError>;
    async fn find_by_namespace(
        &self,
        namespace: &Namespace,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Chunk>, ChunkRepositoryError>;
    async fn count_by_namespace(&self, namespace: &Namespace) -> Result<i64, ChunkRepositoryError>;
    async fn delete_by_namespace(&self, namespace: &Namespace) -> Result<i64, ChunkRepositoryError>;
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ChunkRepositoryError>;
}
