use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::get_run_status::GetRunStatusError;
use crate::application::use_cases::queue_ingestion::{
    QueueBatchRequest, QueueIngestionError, QueueIngestionRequest,
};
use crate::application::use_cases::{GetRunStatusUseCase, QueueIngestionUseCase};
use crate::presentation::http::dto::{
    ApiResponse, QueueBatchRequestDto, QueueBatchResponseDto, QueueIngestionRequestDto,
    QueueRunResponseDto, RunStatusDto,
};

pub struct RunHandler {
    queue_ingestion_use_case: Arc<QueueIngestionUseCase>,
    get_run_status_use_case: Arc<GetRunStatusUseCase>,
}

fn queue_error_status(error: &QueueIngestionError) -> (StatusCode, &'static str) {
    match error {
        QueueIngestionError::InvalidUrl(_) | QueueIngestionError::ValidationError(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_REQUEST")
        }
        QueueIngestionError::AlreadyActive { .. } => (StatusCode::CONFLICT, "RUN_ALREADY_ACTIVE"),
        QueueIngestionError::RepositoryError(_) | QueueIngestionError::QueueError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "QUEUE_FAILED")
        }
    }
}

impl RunHandler {
    pub fn new(
        queue_ingestion_use_case: Arc<QueueIngestionUseCase>,
        get_run_status_use_case: Arc<GetRunStatusUseCase>,
    ) -> Self {
        Self {
            queue_ingestion_use_case,
            get_run_status_use_case,
        }
    }

    pub async fn queue_ingestion(
        State(handler): State<Arc<RunHandler>>,
        Json(request): Json<QueueIngestionRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = QueueIngestionRequest {
            url: request.url,
            user_id: request.user_id,
            save_to_library: request.save_to_library,
        };

        match handler.queue_ingestion_use_case.execute(request).await {
            Ok(response) => Ok((
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(QueueRunResponseDto::from(response))),
            )),
            Err(e) => {
                let (status, code) = queue_error_status(&e);
                Ok((status, Json(ApiResponse::error(code, e.to_string(), None))))
            }
        }
    }

    /// Library ingestion of several URLs; per-URL rejections are part of the response.
    pub async fn queue_batch(
        State(handler): State<Arc<RunHandler>>,
        Json(request): Json<QueueBatchRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = QueueBatchRequest {
            urls: request.urls,
            user_id: request.user_id,
        };

        match handler.queue_ingestion_use_case.execute_batch(request).await {
            Ok(response) => Ok((
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(QueueBatchResponseDto::from(response))),
            )),
            Err(e) => {
                let (status, code) = queue_error_status(&e);
                Ok((status, Json(ApiResponse::error(code, e.to_string(), None))))
            }
        }
    }

    pub async fn get_run_status(
        State(handler): State<Arc<RunHandler>>,
        Path(run_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_run_status_use_case.execute(run_id).await {
            Ok(response) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(RunStatusDto::from(response))),
            )),
            Err(e @ GetRunStatusError::RunNotFound(_)) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("RUN_NOT_FOUND", e.to_string(), None)),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("DATABASE_ERROR", e.to_string(), None)),
            )),
        }
    }

    pub async fn get_active_runs(
        State(handler): State<Arc<RunHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_run_status_use_case.get_active_runs().await {
            Ok(runs) => {
                let dtos: Vec<RunStatusDto> = runs.into_iter().map(RunStatusDto::from_run).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("DATABASE_ERROR", e.to_string(), None)),
            )),
        }
    }
}
