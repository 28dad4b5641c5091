use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::SegmentedChunk;

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Segmentation job {task_id} failed: {message}")]
    JobFailed { task_id: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentationJobState {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Unknown(String),
}

impl SegmentationJobState {
    pub fn from_wire(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "starting" => SegmentationJobState::Starting,
            "processing" => SegmentationJobState::Processing,
            "succeeded" => SegmentationJobState::Succeeded,
            "failed" => SegmentationJobState::Failed,
            "cancelled" => SegmentationJobState::Cancelled,
            other => SegmentationJobState::Unknown(other.to_string()),
        }
    }

    /// The job will never produce output.
    pub fn is_dead(&self) -> bool {
        matches!(
            self,
            SegmentationJobState::Failed | SegmentationJobState::Cancelled
        )
    }
}

#[derive(Debug, Clone)]
pub struct SegmentationJobStatus {
    pub task_id: String,
    pub state: SegmentationJobState,
    pub message: Option<String>,
    pub chunks: Vec<SegmentedChunk>,
}

impl SegmentationJobStatus {
    pub fn has_output(&self) -> bool {
        !self.chunks.is_empty()
    }
}

#[async_trait]
pub trait SegmentationService: Send + Sync {
    /// Submits a document for segmentation and returns the job id.
    async fn submit(&self, document_url: &str) -> Result<String, SegmentationError>;

    async fn poll(&self, task_id: &str) -> Result<SegmentationJobStatus, SegmentationError>;
}
