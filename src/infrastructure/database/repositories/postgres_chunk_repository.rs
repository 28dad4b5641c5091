use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::domain::entities::Chunk;
use crate::domain::repositories::{ChunkRepository, chunk_repository::ChunkRepositoryError};
use crate::domain::value_objects::Namespace;
use crate::infrastructure::database::models::{ChunkModel, NewChunkModel};
use crate::infrastructure::database::schema::chunks;
use crate::infrastructure::database::{DbConnection, DbPool, get_connection_from_pool};

// keeps each INSERT well under the postgres bind parameter limit
const INSERT_BATCH: usize = 1000;

pub struct PostgresChunkRepository {
    pool: DbPool,
}

impl PostgresChunkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, ChunkRepositoryError> {
        get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
    }
}

fn join_error(e: tokio::task::JoinError) -> ChunkRepositoryError {
    ChunkRepositoryError::DatabaseError(format!("Task join error: {}", e))
}

#[async_trait]
impl ChunkRepository for PostgresChunkRepository {
    async fn save_batch(&self, chunks: &[Chunk]) -> Result<(), ChunkRepositoryError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let rows = chunks
            .iter()
            .map(NewChunkModel::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ChunkRepositoryError::ValidationError)?;
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            conn.transaction(|conn| {
                for batch in rows.chunks(INSERT_BATCH) {
                    diesel::insert_into(chunks::table)
                        .values(batch)
                        .on_conflict(chunks::id)
                        .do_update()
                        .set((
                            chunks::namespace.eq(excluded(chunks::namespace)),
                            chunks::text.eq(excluded(chunks::text)),
                            chunks::bbox.eq(excluded(chunks::bbox)),
                            chunks::page.eq(excluded(chunks::page)),
                        ))
                        .execute(conn)?;
                }
                Ok::<_, diesel::result::Error>(())
            })
            .map_err(|e| ChunkRepositoryError::DatabaseError(format!("Failed to save chunks: {}", e)))
        })
        .await
        .map_err(join_error)?
    }

    async fn find_by_namespace(
        &self,
        namespace: &Namespace,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Chunk>, ChunkRepositoryError> {
        let namespace = namespace.to_string();
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            chunks::table
                .filter(chunks::namespace.eq(namespace))
                .order((chunks::page.asc(), chunks::created_at.asc()))
                .offset(skip)
                .limit(limit)
                .select(ChunkModel::as_select())
                .load(&mut conn)
                .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        models
            .into_iter()
            .map(|model| Chunk::try_from(model).map_err(ChunkRepositoryError::ValidationError))
            .collect()
    }

    async fn count_by_namespace(&self, namespace: &Namespace) -> Result<i64, ChunkRepositoryError> {
        let namespace = namespace.to_string();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            chunks::table
                .filter(chunks::namespace.eq(namespace))
                .count()
                .get_result(&mut conn)
                .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn delete_by_namespace(&self, namespace: &Namespace) -> Result<i64, ChunkRepositoryError> {
        let namespace = namespace.to_string();
        let mut conn = self.get_connection()?;

        let deleted = tokio::task::spawn_blocking(move || {
            diesel::delete(chunks::table.filter(chunks::namespace.eq(namespace)))
                .execute(&mut conn)
                .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        Ok(deleted as i64)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ChunkRepositoryError> {
        let mut conn = self.get_connection()?;

        let names: Vec<String> = tokio::task::spawn_blocking(move || {
            chunks::table
                .select(chunks::namespace)
                .distinct()
                .load(&mut conn)
                .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        names
            .into_iter()
            .map(|name| Namespace::new(name).map_err(ChunkRepositoryError::ValidationError))
            .collect()
    }
}
