use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::IngestionRun;
use crate::domain::value_objects::UrlFingerprint;

#[derive(Debug, Error)]
pub enum RunRepositoryError {
    #[error("Run not found: {0}")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[async_trait]
pub trait RunRepository: Send + Sync {
    async fn save(&self, run: &IngestionRun) -> Result<(), RunRepositoryError>;
    async fn update(&self, run: &IngestionRun) -> Result<(), RunRepositoryError>;
    async fn find_by_id(&self, run_id: Uuid) -> Result<Option<IngestionRun>, RunRepositoryError>;
    async fn find_active(&self) -> Result<Vec<IngestionRun>, RunRepositoryError>;
    async fn find_active_by_fingerprint(
        &self,
        fingerprint: &UrlFingerprint,
    ) -> Result<Option<IngestionRun>, RunRepositoryError>;
}
