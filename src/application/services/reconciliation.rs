use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::ports::{VectorIndex, VectorIndexError};
use crate::domain::repositories::{
    ChunkRepository, ChunkRepositoryError, DocumentRepository, DocumentRepositoryError,
    RunRepository, RunRepositoryError,
};
use crate::domain::value_objects::Namespace;

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Vector index error: {0}")]
    Vector(#[from] VectorIndexError),
    #[error("Chunk repository error: {0}")]
    Chunk(#[from] ChunkRepositoryError),
    #[error("Document repository error: {0}")]
    Document(#[from] DocumentRepositoryError),
    #[error("Run repository error: {0}")]
    Run(#[from] RunRepositoryError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamespaceCleanup {
    pub namespace: String,
    pub chunk_rows_deleted: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    pub examined: usize,
    pub cleaned: Vec<NamespaceCleanup>,
    /// Orphan candidates left alone because a run is still writing to them.
    pub skipped_active: Vec<String>,
    pub failures: Vec<String>,
}

/// Removes vectors and chunk rows whose namespace never got a document row.
pub struct ReconciliationService {
    vector_index: Arc<dyn VectorIndex>,
    chunk_repository: Arc<dyn ChunkRepository>,
    document_repository: Arc<dyn DocumentRepository>,
    run_repository: Arc<dyn RunRepository>,
}

impl ReconciliationService {
    pub fn new(
        vector_index: Arc<dyn VectorIndex>,
        chunk_repository: Arc<dyn ChunkRepository>,
        document_repository: Arc<dyn DocumentRepository>,
        run_repository: Arc<dyn RunRepository>,
    ) -> Self {
        Self {
            vector_index,
            chunk_repository,
            document_repository,
            run_repository,
        }
    }

    pub async fn sweep(&self) -> Result<ReconciliationReport, ReconciliationError> {
        let mut candidates: BTreeSet<Namespace> = BTreeSet::new();
        candidates.extend(self.vector_index.list_namespaces().await?);
        candidates.extend(self.chunk_repository.list_namespaces().await?);

        // Active runs before documents: a run only completes after its
        // document row is committed, so it is caught by one read or the other.
        let active: HashSet<Namespace> = self
            .run_repository
            .find_active()
            .await?
            .into_iter()
            .filter_map(|run| run.namespace().cloned())
            .collect();
        let committed: HashSet<Namespace> = self
            .document_repository
            .list_namespaces()
            .await?
            .into_iter()
            .collect();

        let mut report = ReconciliationReport {
            examined: candidates.len(),
            ..Default::default()
        };

        for namespace in candidates {
            if namespace.is_library() || committed.contains(&namespace) {
                continue;
            }
            if active.contains(&namespace) {
                report.skipped_active.push(namespace.to_string());
                continue;
            }

            match self.purge_if_uncommitted(&namespace).await {
                Ok(None) => {}
                Ok(Some(cleanup)) => report.cleaned.push(cleanup),
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "failed to clean orphaned namespace");
                    report.failures.push(format!("{}: {}", namespace, e));
                }
            }
        }

        info!(
            examined = report.examined,
            cleaned = report.cleaned.len(),
            skipped = report.skipped_active.len(),
            "reconciliation sweep finished"
        );
        Ok(report)
    }

    /// Cleans one namespace. `None` when it is committed, shared, or still being written.
    pub async fn reconcile_namespace(
        &self,
        namespace: &Namespace,
    ) -> Result<Option<NamespaceCleanup>, ReconciliationError> {
        if namespace.is_library() {
            return Ok(None);
        }
        let active = self.run_repository.find_active().await?;
        if active.iter().any(|run| run.namespace() == Some(namespace)) {
            return Ok(None);
        }

        self.purge_if_uncommitted(namespace).await
    }

    async fn purge_if_uncommitted(
        &self,
        namespace: &Namespace,
    ) -> Result<Option<NamespaceCleanup>, ReconciliationError> {
        if self
            .document_repository
            .find_by_namespace(namespace)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        self.purge(namespace).await.map(Some)
    }

    async fn purge(&self, namespace: &Namespace) -> Result<NamespaceCleanup, ReconciliationError> {
        self.vector_index.delete_namespace(namespace).await?;
        let chunk_rows_deleted = self.chunk_repository.delete_by_namespace(namespace).await?;

        info!(namespace = %namespace, chunk_rows_deleted, "orphaned namespace removed");
        Ok(NamespaceCleanup {
            namespace: namespace.to_string(),
            chunk_rows_deleted,
        })
    }
}
