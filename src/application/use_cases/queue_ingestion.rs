use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::ports::{JobQueue, job_queue::JobQueueError};
use crate::domain::entities::IngestionRun;
use crate::domain::repositories::{RunRepository, run_repository::RunRepositoryError};

#[derive(Debug)]
pub enum QueueIngestionError {
    InvalidUrl(String),
    AlreadyActive { url: String, run_id: Uuid },
    RepositoryError(String),
    QueueError(String),
    ValidationError(String),
}

impl std::fmt::Display for QueueIngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueIngestionError::InvalidUrl(url) => write!(f, "Invalid document URL: {}", url),
            QueueIngestionError::AlreadyActive { url, run_id } => {
                write!(f, "{} is already being ingested by run {}", url, run_id)
            }
            QueueIngestionError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            QueueIngestionError::QueueError(msg) => write!(f, "Queue error: {}", msg),
            QueueIngestionError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for QueueIngestionError {}

impl From<RunRepositoryError> for QueueIngestionError {
    fn from(error: RunRepositoryError) -> Self {
        QueueIngestionError::RepositoryError(error.to_string())
    }
}

impl From<JobQueueError> for QueueIngestionError {
    fn from(error: JobQueueError) -> Self {
        QueueIngestionError::QueueError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct QueueIngestionRequest {
    pub url: String,
    pub user_id: String,
    pub save_to_library: bool,
}

#[derive(Debug, Clone)]
pub struct QueueIngestionResponse {
    pub run_id: Uuid,
    pub url: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct QueueBatchRequest {
    pub urls: Vec<String>,
    pub user_id: String,
}

/// Per-URL outcome of a batch; one bad URL does not reject the others.
#[derive(Debug)]
pub struct QueueBatchResponse {
    pub queued: Vec<QueueIngestionResponse>,
    pub rejected: Vec<(String, QueueIngestionError)>,
}

pub struct QueueIngestionUseCase {
    run_repository: Arc<dyn RunRepository>,
    job_queue: Arc<dyn JobQueue>,
}

impl QueueIngestionUseCase {
    pub fn new(run_repository: Arc<dyn RunRepository>, job_queue: Arc<dyn JobQueue>) -> Self {
        Self {
            run_repository,
            job_queue,
        }
    }

    pub async fn execute(
        &self,
        request: QueueIngestionRequest,
    ) -> Result<QueueIngestionResponse, QueueIngestionError> {
        let url = validate_url(&request.url)?;
        if request.user_id.trim().is_empty() {
            return Err(QueueIngestionError::ValidationError(
                "user_id cannot be empty".to_string(),
            ));
        }

        let run = IngestionRun::new(url.clone(), request.user_id, request.save_to_library);

        // one active run per document URL
        if let Some(active) = self
            .run_repository
            .find_active_by_fingerprint(run.url_fingerprint())
            .await?
        {
            return Err(QueueIngestionError::AlreadyActive {
                url,
                run_id: active.id(),
            });
        }

        self.run_repository.save(&run).await?;
        let run_id = run.id();
        let status = run.status().as_str().to_string();
        self.job_queue.enqueue(run).await?;

        info!(%run_id, url = %url, library = request.save_to_library, "ingestion queued");

        Ok(QueueIngestionResponse {
            run_id,
            url,
            status,
            message: "Ingestion queued".to_string(),
        })
    }

    /// Queues one library-mode run per URL.
    pub async fn execute_batch(
        &self,
        request: QueueBatchRequest,
    ) -> Result<QueueBatchResponse, QueueIngestionError> {
        if request.urls.is_empty() {
            return Err(QueueIngestionError::ValidationError(
                "urls cannot be empty".to_string(),
            ));
        }

        let mut response = QueueBatchResponse {
            queued: Vec::new(),
            rejected: Vec::new(),
        };
        for url in request.urls {
            let single = QueueIngestionRequest {
                url: url.clone(),
                user_id: request.user_id.clone(),
                save_to_library: true,
            };
            match self.execute(single).await {
                Ok(queued) => response.queued.push(queued),
                Err(QueueIngestionError::QueueError(msg)) => {
                    return Err(QueueIngestionError::QueueError(msg));
                }
                Err(error) => response.rejected.push((url, error)),
            }
        }

        Ok(response)
    }
}

fn validate_url(raw: &str) -> Result<String, QueueIngestionError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|_| QueueIngestionError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        _ => Err(QueueIngestionError::InvalidUrl(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_doubles::{InMemoryJobQueue, InMemoryRunRepository};

    fn use_case() -> (QueueIngestionUseCase, Arc<InMemoryJobQueue>) {
        let queue = Arc::new(InMemoryJobQueue::default());
        let use_case = QueueIngestionUseCase::new(
            Arc::new(InMemoryRunRepository::default()),
            queue.clone(),
        );
        (use_case, queue)
    }

    fn request(url: &str) -> QueueIngestionRequest {
        QueueIngestionRequest {
            url: url.to_string(),
            user_id: "user-1".to_string(),
            save_to_library: false,
        }
    }

    #[tokio::test]
    async fn test_queues_run() {
        let (use_case, queue) = use_case();

        let response = use_case
            .execute(request("https://arxiv.org/pdf/1706.03762"))
            .await
            .unwrap();

        assert_eq!(response.status, "pending");
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_second_run_for_same_url() {
        let (use_case, queue) = use_case();
        let first = use_case
            .execute(request("https://arxiv.org/pdf/1706.03762"))
            .await
            .unwrap();

        let second = use_case
            .execute(request("https://arxiv.org/pdf/1706.03762"))
            .await;

        match second {
            Err(QueueIngestionError::AlreadyActive { run_id, .. }) => {
                assert_eq!(run_id, first.run_id)
            }
            other => panic!("expected AlreadyActive, got {:?}", other),
        }
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_non_http_url() {
        let (use_case, _) = use_case();

        let result = use_case.execute(request("file:///etc/passwd")).await;
        assert!(matches!(result, Err(QueueIngestionError::InvalidUrl(_))));

        let result = use_case.execute(request("not a url")).await;
        assert!(matches!(result, Err(QueueIngestionError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_batch_queues_library_runs() {
        let (use_case, queue) = use_case();

        let response = use_case
            .execute_batch(QueueBatchRequest {
                urls: vec![
                    "https://example.org/a.pdf".to_string(),
                    "bogus".to_string(),
                    "https://example.org/b.pdf".to_string(),
                ],
                user_id: "user-1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.queued.len(), 2);
        assert_eq!(response.rejected.len(), 1);
        assert!(queue.runs().iter().all(|run| run.save_to_library()));
    }
}
