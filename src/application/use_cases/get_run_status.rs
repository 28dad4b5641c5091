use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::IngestionRun;
use crate::domain::repositories::{RunRepository, run_repository::RunRepositoryError};

#[derive(Debug)]
pub enum GetRunStatusError {
    RunNotFound(Uuid),
    RepositoryError(String),
}

impl std::fmt::Display for GetRunStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetRunStatusError::RunNotFound(id) => write!(f, "Ingestion run not found: {}", id),
            GetRunStatusError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for GetRunStatusError {}

impl From<RunRepositoryError> for GetRunStatusError {
    fn from(error: RunRepositoryError) -> Self {
        match error {
            RunRepositoryError::NotFound(id) => GetRunStatusError::RunNotFound(id),
            _ => GetRunStatusError::RepositoryError(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetRunStatusResponse {
    pub run: IngestionRun,
    pub duration: Option<chrono::Duration>,
}

pub struct GetRunStatusUseCase {
    run_repository: Arc<dyn RunRepository>,
}

impl GetRunStatusUseCase {
    pub fn new(run_repository: Arc<dyn RunRepository>) -> Self {
        Self { run_repository }
    }

    pub async fn execute(&self, run_id: Uuid) -> Result<GetRunStatusResponse, GetRunStatusError> {
        let run = self
            .run_repository
            .find_by_id(run_id)
            .await?
            .ok_or(GetRunStatusError::RunNotFound(run_id))?;

        Ok(GetRunStatusResponse {
            duration: run.duration(),
            run,
        })
    }

    pub async fn get_active_runs(&self) -> Result<Vec<IngestionRun>, GetRunStatusError> {
        self.run_repository
            .find_active()
            .await
            .map_err(GetRunStatusError::from)
    }
}
