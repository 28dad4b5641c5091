use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::LibraryEntry;

#[derive(Debug, Error)]
pub enum LibraryRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[async_trait]
pub trait LibraryRepository: Send + Sync {
    async fn add(&self, entry: &LibraryEntry) -> Result<(), LibraryRepositoryError>;
}
