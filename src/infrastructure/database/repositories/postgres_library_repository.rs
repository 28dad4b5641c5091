use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::LibraryEntry;
use crate::domain::repositories::{LibraryRepository, LibraryRepositoryError};
use crate::infrastructure::database::models::NewLibraryEntryModel;
use crate::infrastructure::database::schema::library_entries;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresLibraryRepository {
    pool: DbPool,
}

impl PostgresLibraryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryRepository for PostgresLibraryRepository {
    async fn add(&self, entry: &LibraryEntry) -> Result<(), LibraryRepositoryError> {
        let row = NewLibraryEntryModel::try_from(entry).map_err(LibraryRepositoryError::DatabaseError)?;
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| LibraryRepositoryError::DatabaseError(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(library_entries::table)
                .values(&row)
                .execute(&mut conn)
                .map_err(|e| {
                    LibraryRepositoryError::DatabaseError(format!("Failed to add library entry: {}", e))
                })
        })
        .await
        .map_err(|e| LibraryRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }
}
