use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::get_run_status::GetRunStatusResponse;
use crate::application::use_cases::queue_ingestion::{QueueBatchResponse, QueueIngestionResponse};
use crate::domain::entities::{IngestionRun, RunResult};

#[derive(Debug, Deserialize)]
pub struct QueueIngestionRequestDto {
    pub url: String,
    pub user_id: String,
    #[serde(default)]
    pub save_to_library: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueueBatchRequestDto {
    pub urls: Vec<String>,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct QueueRunResponseDto {
    pub run_id: Uuid,
    pub url: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RejectedUrlDto {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct QueueBatchResponseDto {
    pub queued: Vec<QueueRunResponseDto>,
    pub rejected: Vec<RejectedUrlDto>,
}

#[derive(Debug, Serialize)]
pub struct RunResultDto {
    pub chunks_created: i32,
    pub vectors_upserted: i32,
    pub references_extracted: i32,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct RunStatusDto {
    pub run_id: Uuid,
    pub document_url: String,
    pub user_id: String,
    pub save_to_library: bool,
    pub status: String,
    pub progress: f32,
    pub task_id: Option<String>,
    pub namespace: Option<String>,
    pub graph_status: String,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub result_summary: Option<RunResultDto>,
    pub duration_ms: Option<i64>,
    pub is_terminal: bool,
}

impl From<QueueIngestionResponse> for QueueRunResponseDto {
    fn from(response: QueueIngestionResponse) -> Self {
        Self {
            run_id: response.run_id,
            url: response.url,
            status: response.status,
            message: response.message,
        }
    }
}

impl From<QueueBatchResponse> for QueueBatchResponseDto {
    fn from(response: QueueBatchResponse) -> Self {
        Self {
            queued: response
                .queued
                .into_iter()
                .map(QueueRunResponseDto::from)
                .collect(),
            rejected: response
                .rejected
                .into_iter()
                .map(|(url, error)| RejectedUrlDto {
                    url,
                    reason: error.to_string(),
                })
                .collect(),
        }
    }
}

impl From<&RunResult> for RunResultDto {
    fn from(result: &RunResult) -> Self {
        Self {
            chunks_created: result.chunks_created,
            vectors_upserted: result.vectors_upserted,
            references_extracted: result.references_extracted,
            processing_time_ms: result.processing_time_ms,
        }
    }
}

impl From<GetRunStatusResponse> for RunStatusDto {
    fn from(response: GetRunStatusResponse) -> Self {
        Self::from_run_with_duration(response.run, response.duration)
    }
}

impl RunStatusDto {
    pub fn from_run(run: IngestionRun) -> Self {
        let duration = run.duration();
        Self::from_run_with_duration(run, duration)
    }

    fn from_run_with_duration(run: IngestionRun, duration: Option<chrono::Duration>) -> Self {
        Self {
            run_id: run.id(),
            document_url: run.document_url().to_string(),
            user_id: run.user_id().to_string(),
            save_to_library: run.save_to_library(),
            status: run.status().as_str().to_string(),
            progress: run.progress(),
            task_id: run.task_id().map(str::to_string),
            namespace: run.namespace().map(|n| n.to_string()),
            graph_status: run.graph_status().to_string(),
            created_at: run.created_at().to_rfc3339(),
            started_at: run.started_at().map(|dt| dt.to_rfc3339()),
            completed_at: run.completed_at().map(|dt| dt.to_rfc3339()),
            error_message: run.error_message().map(str::to_string),
            result_summary: run.result_summary().map(RunResultDto::from),
            duration_ms: duration.map(|d| d.num_milliseconds()),
            is_terminal: run.status().is_terminal(),
        }
    }
}
