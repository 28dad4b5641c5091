use std::sync::Arc;

use crate::domain::entities::{Chunk, DocumentRecord};
use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, chunk_repository::ChunkRepositoryError,
    document_repository::DocumentRepositoryError,
};
use crate::domain::value_objects::Namespace;

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug)]
pub enum ListDocumentsError {
    NotFound(String),
    RepositoryError(String),
    ValidationError(String),
}

impl std::fmt::Display for ListDocumentsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListDocumentsError::NotFound(what) => write!(f, "Not found: {}", what),
            ListDocumentsError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            ListDocumentsError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ListDocumentsError {}

impl From<DocumentRepositoryError> for ListDocumentsError {
    fn from(error: DocumentRepositoryError) -> Self {
        ListDocumentsError::RepositoryError(error.to_string())
    }
}

impl From<ChunkRepositoryError> for ListDocumentsError {
    fn from(error: ChunkRepositoryError) -> Self {
        ListDocumentsError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Result<Self, ListDocumentsError> {
        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(20);
        if skip < 0 || limit <= 0 {
            return Err(ListDocumentsError::ValidationError(
                "skip must be >= 0 and limit > 0".to_string(),
            ));
        }
        Ok(Self {
            skip,
            limit: limit.min(MAX_PAGE_SIZE),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChunkPage {
    pub namespace: Namespace,
    pub chunks: Vec<Chunk>,
    pub total: i64,
}

/// Read side of the document store: user listings, URL lookup and chunk browsing.
pub struct ListDocumentsUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
}

impl ListDocumentsUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        chunk_repository: Arc<dyn ChunkRepository>,
    ) -> Self {
        Self {
            document_repository,
            chunk_repository,
        }
    }

    pub async fn by_user(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<Vec<DocumentRecord>, ListDocumentsError> {
        if user_id.trim().is_empty() {
            return Err(ListDocumentsError::ValidationError(
                "user_id cannot be empty".to_string(),
            ));
        }

        Ok(self
            .document_repository
            .find_by_user(user_id, page.skip, page.limit)
            .await?)
    }

    /// Latest document ingested from `url`.
    pub async fn by_url(&self, url: &str) -> Result<DocumentRecord, ListDocumentsError> {
        self.document_repository
            .find_by_url(url)
            .await?
            .ok_or_else(|| ListDocumentsError::NotFound(format!("document for {}", url)))
    }

    pub async fn chunks(
        &self,
        namespace: &str,
        page: Page,
    ) -> Result<ChunkPage, ListDocumentsError> {
        let namespace = Namespace::new(namespace).map_err(ListDocumentsError::ValidationError)?;

        let (chunks, total) = tokio::join!(
            self.chunk_repository
                .find_by_namespace(&namespace, page.skip, page.limit),
            self.chunk_repository.count_by_namespace(&namespace)
        );
        let total = total?;
        if total == 0 {
            return Err(ListDocumentsError::NotFound(format!("namespace {}", namespace)));
        }

        Ok(ChunkPage {
            chunks: chunks?,
            total,
            namespace,
        })
    }
}
