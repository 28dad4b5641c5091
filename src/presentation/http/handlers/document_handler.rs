use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::delete_document::DeleteDocumentError;
use crate::application::use_cases::list_documents::{ListDocumentsError, Page};
use crate::application::use_cases::{DeleteDocumentUseCase, ListDocumentsUseCase};
use crate::presentation::http::dto::{
    ApiResponse, ChunkPageDto, DeleteDocumentResponseDto, DocumentDto, DocumentLookupQuery,
    PaginationDto, UserDocumentsQuery,
};

pub struct DocumentHandler {
    list_documents_use_case: Arc<ListDocumentsUseCase>,
    delete_document_use_case: Arc<DeleteDocumentUseCase>,
}

fn list_error_status(error: &ListDocumentsError) -> (StatusCode, &'static str) {
    match error {
        ListDocumentsError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ListDocumentsError::ValidationError(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        ListDocumentsError::RepositoryError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
        }
    }
}

impl DocumentHandler {
    pub fn new(
        list_documents_use_case: Arc<ListDocumentsUseCase>,
        delete_document_use_case: Arc<DeleteDocumentUseCase>,
    ) -> Self {
        Self {
            list_documents_use_case,
            delete_document_use_case,
        }
    }

    pub async fn list_user_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Query(query): Query<UserDocumentsQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let result = match Page::new(query.skip, query.limit) {
            Ok(page) => {
                handler
                    .list_documents_use_case
                    .by_user(&query.user_id, page)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(documents) => {
                let dtos: Vec<DocumentDto> = documents.into_iter().map(DocumentDto::from).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => {
                let (status, code) = list_error_status(&e);
                Ok((status, Json(ApiResponse::error(code, e.to_string(), None))))
            }
        }
    }

    pub async fn lookup_by_url(
        State(handler): State<Arc<DocumentHandler>>,
        Query(query): Query<DocumentLookupQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.list_documents_use_case.by_url(&query.url).await {
            Ok(document) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(DocumentDto::from(document))),
            )),
            Err(e) => {
                let (status, code) = list_error_status(&e);
                Ok((status, Json(ApiResponse::error(code, e.to_string(), None))))
            }
        }
    }

    pub async fn list_chunks(
        State(handler): State<Arc<DocumentHandler>>,
        Path(namespace): Path<String>,
        Query(pagination): Query<PaginationDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let page = match Page::new(pagination.skip, pagination.limit) {
            Ok(page) => page,
            Err(e) => {
                let (status, code) = list_error_status(&e);
                return Ok((status, Json(ApiResponse::error(code, e.to_string(), None))));
            }
        };
        let (skip, limit) = (page.skip, page.limit);

        match handler.list_documents_use_case.chunks(&namespace, page).await {
            Ok(chunks) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(ChunkPageDto::new(chunks, skip, limit))),
            )),
            Err(e) => {
                let (status, code) = list_error_status(&e);
                Ok((status, Json(ApiResponse::error(code, e.to_string(), None))))
            }
        }
    }

    pub async fn delete_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.delete_document_use_case.execute(document_id).await {
            Ok(response) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(DeleteDocumentResponseDto::from(response))),
            )),
            Err(e @ DeleteDocumentError::DocumentNotFound(_)) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("DOCUMENT_NOT_FOUND", e.to_string(), None)),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("DELETE_FAILED", e.to_string(), None)),
            )),
        }
    }
}
