use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::IngestionRun;
use crate::domain::repositories::{RunRepository, run_repository::RunRepositoryError};
use crate::domain::value_objects::UrlFingerprint;
use crate::infrastructure::database::models::{NewRunModel, RunModel, UpdateRunModel};
use crate::infrastructure::database::schema::ingestion_runs;
use crate::infrastructure::database::{DbConnection, DbPool, get_connection_from_pool};

const ACTIVE_STATUSES: [&str; 2] = ["pending", "processing"];

pub struct PostgresRunRepository {
    pool: DbPool,
}

impl PostgresRunRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, RunRepositoryError> {
        get_connection_from_pool(&self.pool).map_err(|e| {
            RunRepositoryError::DatabaseError(format!("Failed to get database connection: {}", e))
        })
    }
}

fn join_error(e: tokio::task::JoinError) -> RunRepositoryError {
    RunRepositoryError::DatabaseError(format!("Task join error: {}", e))
}

fn to_domain(model: RunModel) -> Result<IngestionRun, RunRepositoryError> {
    IngestionRun::try_from(model)
        .map_err(|e| RunRepositoryError::ValidationError(format!("Failed to convert run model: {}", e)))
}

#[async_trait]
impl RunRepository for PostgresRunRepository {
    async fn save(&self, run: &IngestionRun) -> Result<(), RunRepositoryError> {
        let new_run = NewRunModel::from(run);
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(ingestion_runs::table)
                .values(&new_run)
                .execute(&mut conn)
                .map_err(|e| RunRepositoryError::DatabaseError(format!("Failed to save run: {}", e)))
        })
        .await
        .map_err(join_error)??;

        Ok(())
    }

    async fn update(&self, run: &IngestionRun) -> Result<(), RunRepositoryError> {
        let changes = UpdateRunModel::from(run);
        let run_id = run.id();
        let mut conn = self.get_connection()?;

        let updated = tokio::task::spawn_blocking(move || {
            diesel::update(ingestion_runs::table.find(run_id))
                .set(&changes)
                .execute(&mut conn)
                .map_err(|e| RunRepositoryError::DatabaseError(format!("Failed to update run: {}", e)))
        })
        .await
        .map_err(join_error)??;

        if updated == 0 {
            return Err(RunRepositoryError::NotFound(run_id));
        }
        Ok(())
    }

    async fn find_by_id(&self, run_id: Uuid) -> Result<Option<IngestionRun>, RunRepositoryError> {
        let mut conn = self.get_connection()?;

        let model = tokio::task::spawn_blocking(move || {
            ingestion_runs::table
                .find(run_id)
                .select(RunModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| RunRepositoryError::DatabaseError(format!("Failed to find run: {}", e)))
        })
        .await
        .map_err(join_error)??;

        model.map(to_domain).transpose()
    }

    async fn find_active(&self) -> Result<Vec<IngestionRun>, RunRepositoryError> {
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            ingestion_runs::table
                .filter(ingestion_runs::status.eq_any(ACTIVE_STATUSES))
                .order(ingestion_runs::created_at.asc())
                .select(RunModel::as_select())
                .load(&mut conn)
                .map_err(|e| {
                    RunRepositoryError::DatabaseError(format!("Failed to find active runs: {}", e))
                })
        })
        .await
        .map_err(join_error)??;

        models.into_iter().map(to_domain).collect()
    }

    async fn find_active_by_fingerprint(
        &self,
        fingerprint: &UrlFingerprint,
    ) -> Result<Option<IngestionRun>, RunRepositoryError> {
        let fingerprint = fingerprint.as_str().to_string();
        let mut conn = self.get_connection()?;

        let model = tokio::task::spawn_blocking(move || {
            ingestion_runs::table
                .filter(ingestion_runs::url_fingerprint.eq(fingerprint))
                .filter(ingestion_runs::status.eq_any(ACTIVE_STATUSES))
                .order(ingestion_runs::created_at.desc())
                .select(RunModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| RunRepositoryError::DatabaseError(e.to_string()))
        })
        .await
        .map_err(join_error)??;

        model.map(to_domain).transpose()
    }
}
