use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use std::sync::Arc;

use crate::application::ports::embedding_provider::BatchEmbeddingRequest;
use crate::application::ports::{EmbeddingProvider, VectorIndex, VectorIndexError, VectorRecord};
use crate::domain::value_objects::Namespace;
use crate::infrastructure::database::models::NewChunkVectorModel;
use crate::infrastructure::database::schema::chunk_vectors;
use crate::infrastructure::database::{DbConnection, DbPool, get_connection_from_pool};

/// Vector index backed by the `chunk_vectors` table, embedding through the inference service.
pub struct PgvectorIndex {
    pool: DbPool,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl PgvectorIndex {
    pub fn new(pool: DbPool, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { pool, embedder }
    }

    fn get_connection(&self) -> Result<DbConnection, VectorIndexError> {
        get_connection_from_pool(&self.pool)
            .map_err(|e| VectorIndexError::DatabaseError(e.to_string()))
    }
}

fn join_error(e: tokio::task::JoinError) -> VectorIndexError {
    VectorIndexError::DatabaseError(format!("Task join error: {}", e))
}

#[async_trait]
impl VectorIndex for PgvectorIndex {
    async fn upsert(
        &self,
        namespace: &Namespace,
        records: &[VectorRecord],
    ) -> Result<usize, VectorIndexError> {
        if records.len() > self.max_batch_size() {
            return Err(VectorIndexError::BatchTooLarge {
                size: records.len(),
                max: self.max_batch_size(),
            });
        }
        if records.is_empty() {
            return Ok(0);
        }

        let texts = records.iter().map(|r| r.text.clone()).collect();
        let response = self
            .embedder
            .generate_embeddings(BatchEmbeddingRequest {
                texts,
                model_name: None,
            })
            .await
            .map_err(|e| VectorIndexError::EmbeddingError(e.to_string()))?;

        let rows: Vec<NewChunkVectorModel> = records
            .iter()
            .zip(response.embeddings)
            .map(|(record, embedding)| NewChunkVectorModel {
                namespace: namespace.to_string(),
                id: record.id.clone(),
                text: record.text.clone(),
                page: record.page,
                embedding,
            })
            .collect();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(chunk_vectors::table)
                .values(&rows)
                .on_conflict((chunk_vectors::namespace, chunk_vectors::id))
                .do_update()
                .set((
                    chunk_vectors::text.eq(excluded(chunk_vectors::text)),
                    chunk_vectors::page.eq(excluded(chunk_vectors::page)),
                    chunk_vectors::embedding.eq(excluded(chunk_vectors::embedding)),
                ))
                .execute(&mut conn)
                .map_err(|e| VectorIndexError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorIndexError> {
        let namespace = namespace.to_string();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::delete(chunk_vectors::table.filter(chunk_vectors::namespace.eq(namespace)))
                .execute(&mut conn)
                .map_err(|e| VectorIndexError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, VectorIndexError> {
        let mut conn = self.get_connection()?;

        let names: Vec<String> = tokio::task::spawn_blocking(move || {
            chunk_vectors::table
                .select(chunk_vectors::namespace)
                .distinct()
                .load(&mut conn)
                .map_err(|e| VectorIndexError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        Ok(names
            .into_iter()
            .filter_map(|name| Namespace::new(name).ok())
            .collect())
    }
}
