use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::domain::entities::DocumentRecord;
use crate::domain::repositories::{
    DocumentRepository, document_repository::DocumentRepositoryError,
};
use crate::domain::value_objects::Namespace;
use crate::infrastructure::database::models::DocumentModel;
use crate::infrastructure::database::schema::documents;
use crate::infrastructure::database::{DbConnection, DbPool, get_connection_from_pool};

pub struct PostgresDocumentRepository {
    pool: DbPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, DocumentRepositoryError> {
        get_connection_from_pool(&self.pool)
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))
    }

    async fn load_one<F>(&self, query: F) -> Result<Option<DocumentRecord>, DocumentRepositoryError>
    where
        F: FnOnce(&mut DbConnection) -> QueryResult<Option<DocumentModel>> + Send + 'static,
    {
        let mut conn = self.get_connection()?;
        let model = tokio::task::spawn_blocking(move || query(&mut conn))
            .await
            .map_err(join_error)?
            .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))?;

        model
            .map(|m| DocumentRecord::try_from(m).map_err(DocumentRepositoryError::ValidationError))
            .transpose()
    }
}

fn join_error(e: tokio::task::JoinError) -> DocumentRepositoryError {
    DocumentRepositoryError::DatabaseError(format!("Task join error: {}", e))
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn save(&self, document: &DocumentRecord) -> Result<(), DocumentRepositoryError> {
        let row = DocumentModel::from(document);
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(documents::table)
                .values(&row)
                .execute(&mut conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        DocumentRepositoryError::DuplicateError(row.namespace.clone())
                    }
                    other => DocumentRepositoryError::DatabaseError(format!(
                        "Failed to save document: {}",
                        other
                    )),
                })
        })
        .await
        .map_err(join_error)??;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentRecord>, DocumentRepositoryError> {
        self.load_one(move |conn| {
            documents::table
                .find(id)
                .select(DocumentModel::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn find_by_url(
        &self,
        file_url: &str,
    ) -> Result<Option<DocumentRecord>, DocumentRepositoryError> {
        let file_url = file_url.to_string();
        self.load_one(move |conn| {
            documents::table
                .filter(documents::file_url.eq(file_url))
                .order(documents::created_at.desc())
                .select(DocumentModel::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn find_by_namespace(
        &self,
        namespace: &Namespace,
    ) -> Result<Option<DocumentRecord>, DocumentRepositoryError> {
        let namespace = namespace.to_string();
        self.load_one(move |conn| {
            documents::table
                .filter(documents::namespace.eq(namespace))
                .select(DocumentModel::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<DocumentRecord>, DocumentRepositoryError> {
        let user_id = user_id.to_string();
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            documents::table
                .filter(documents::user_id.eq(user_id))
                .order(documents::created_at.desc())
                .offset(skip)
                .limit(limit)
                .select(DocumentModel::as_select())
                .load(&mut conn)
                .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        models
            .into_iter()
            .map(|m| DocumentRecord::try_from(m).map_err(DocumentRepositoryError::ValidationError))
            .collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DocumentRepositoryError> {
        let mut conn = self.get_connection()?;

        let deleted = tokio::task::spawn_blocking(move || {
            diesel::delete(documents::table.find(id))
                .execute(&mut conn)
                .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        Ok(deleted > 0)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, DocumentRepositoryError> {
        let mut conn = self.get_connection()?;

        let names: Vec<String> = tokio::task::spawn_blocking(move || {
            documents::table
                .select(documents::namespace)
                .load(&mut conn)
                .map_err(|e| DocumentRepositoryError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        names
            .into_iter()
            .map(|name| Namespace::new(name).map_err(DocumentRepositoryError::ValidationError))
            .collect()
    }
}
