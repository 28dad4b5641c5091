use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::IngestionRun;

#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a run for processing
    async fn enqueue(&self, run: IngestionRun) -> Result<(), JobQueueError>;

    async fn health_check(&self) -> Result<QueueHealth, JobQueueError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueHealth {
    pub queue_size: usize,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub is_healthy: bool,
    pub last_activity: Option<chrono::DateTime<chrono::Utc>>,
}
