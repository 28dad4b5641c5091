use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::DocumentRecord;
use crate::domain::value_objects::Namespace;

#[derive(Debug, Error)]
pub enum DocumentRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Duplicate error: {0}")]
    DuplicateError(String),
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn save(&self, document: &DocumentRecord) -> Result<(), DocumentRepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentRecord>, DocumentRepositoryError>;
    /// Most recent document ingested from `file_url`.
    async fn find_by_url(
        &self,
        file_url: &str,
    ) -> Result<Option<DocumentRecord>, DocumentRepositoryError>;
    async fn find_by_namespace(
        &self,
        namespace: &Namespace,
    ) -> Result<Option<DocumentRecord>, DocumentRepositoryError>;
    async fn find_by_user(
        &self,
        user_id: &str,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<DocumentRecord>, DocumentRepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<bool, DocumentRepositoryError>;
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, DocumentRepositoryError>;
}
