use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::ports::{GraphStore, VectorIndex};
use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, document_repository::DocumentRepositoryError,
};

#[derive(Debug)]
pub enum DeleteDocumentError {
    DocumentNotFound(Uuid),
    RepositoryError(String),
    VectorIndexError(String),
    GraphError(String),
}

impl std::fmt::Display for DeleteDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteDocumentError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            DeleteDocumentError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            DeleteDocumentError::VectorIndexError(msg) => write!(f, "Vector index error: {}", msg),
            DeleteDocumentError::GraphError(msg) => write!(f, "Graph store error: {}", msg),
        }
    }
}

impl std::error::Error for DeleteDocumentError {}

impl From<DocumentRepositoryError> for DeleteDocumentError {
    fn from(error: DocumentRepositoryError) -> Self {
        DeleteDocumentError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct DeleteDocumentResponse {
    pub document_id: Uuid,
    pub namespace: String,
    pub chunk_rows_deleted: i64,
}

/// Removes a document and everything derived from it. The document row goes
/// last, so a partial failure leaves a row that can be deleted again.
pub struct DeleteDocumentUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
    vector_index: Arc<dyn VectorIndex>,
    graph_store: Option<Arc<dyn GraphStore>>,
}

impl DeleteDocumentUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        chunk_repository: Arc<dyn ChunkRepository>,
        vector_index: Arc<dyn VectorIndex>,
        graph_store: Option<Arc<dyn GraphStore>>,
    ) -> Self {
        Self {
            document_repository,
            chunk_repository,
            vector_index,
            graph_store,
        }
    }

    pub async fn execute(
        &self,
        document_id: Uuid,
    ) -> Result<DeleteDocumentResponse, DeleteDocumentError> {
        let document = self
            .document_repository
            .find_by_id(document_id)
            .await?
            .ok_or(DeleteDocumentError::DocumentNotFound(document_id))?;
        let namespace = document.namespace().clone();

        self.vector_index
            .delete_namespace(&namespace)
            .await
            .map_err(|e| DeleteDocumentError::VectorIndexError(e.to_string()))?;

        let chunk_rows_deleted = self
            .chunk_repository
            .delete_by_namespace(&namespace)
            .await
            .map_err(|e| DeleteDocumentError::RepositoryError(e.to_string()))?;

        if let Some(graph_store) = &self.graph_store {
            if let Err(e) = graph_store.delete_run(document.task_id()).await {
                warn!(task_id = document.task_id(), error = %e, "citation graph cleanup failed");
                return Err(DeleteDocumentError::GraphError(e.to_string()));
            }
        }

        if !self.document_repository.delete(document_id).await? {
            return Err(DeleteDocumentError::DocumentNotFound(document_id));
        }

        info!(%document_id, namespace = %namespace, chunk_rows_deleted, "document deleted");
        Ok(DeleteDocumentResponse {
            document_id,
            namespace: namespace.to_string(),
            chunk_rows_deleted,
        })
    }
}
