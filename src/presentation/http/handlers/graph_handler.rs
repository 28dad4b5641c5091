use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::use_cases::get_citation_graph::GetCitationGraphError;
use crate::application::use_cases::reconcile_namespaces::ReconcileError;
use crate::application::use_cases::{GetCitationGraphUseCase, ReconcileNamespacesUseCase};
use crate::presentation::http::dto::{ApiResponse, CitationGraphDto, ReconcileQuery};

pub struct GraphHandler {
    get_citation_graph_use_case: Arc<GetCitationGraphUseCase>,
}

impl GraphHandler {
    pub fn new(get_citation_graph_use_case: Arc<GetCitationGraphUseCase>) -> Self {
        Self {
            get_citation_graph_use_case,
        }
    }

    pub async fn get_graph(
        State(handler): State<Arc<GraphHandler>>,
        Path(task_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_citation_graph_use_case.execute(&task_id).await {
            Ok(graph) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(CitationGraphDto::new(task_id, graph))),
            )),
            Err(e) => {
                let (status, code) = match e {
                    GetCitationGraphError::GraphDisabled => {
                        (StatusCode::SERVICE_UNAVAILABLE, "GRAPH_DISABLED")
                    }
                    GetCitationGraphError::NotFound(_) => (StatusCode::NOT_FOUND, "GRAPH_NOT_FOUND"),
                    GetCitationGraphError::StoreError(_) => (StatusCode::BAD_GATEWAY, "GRAPH_STORE_ERROR"),
                };
                Ok((status, Json(ApiResponse::error(code, e.to_string(), None))))
            }
        }
    }
}

pub struct MaintenanceHandler {
    reconcile_use_case: Arc<ReconcileNamespacesUseCase>,
}

impl MaintenanceHandler {
    pub fn new(reconcile_use_case: Arc<ReconcileNamespacesUseCase>) -> Self {
        Self { reconcile_use_case }
    }

    /// Sweeps every orphaned namespace, or only `?namespace=` when given.
    pub async fn reconcile(
        State(handler): State<Arc<MaintenanceHandler>>,
        Query(query): Query<ReconcileQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let result = match query.namespace.as_deref() {
            Some(namespace) => handler
                .reconcile_use_case
                .namespace(namespace)
                .await
                .map(|cleanup| serde_json::json!({ "cleaned": cleanup })),
            None => handler
                .reconcile_use_case
                .sweep()
                .await
                .and_then(|report| {
                    serde_json::to_value(report).map_err(|e| ReconcileError::Failed(e.to_string()))
                }),
        };

        match result {
            Ok(body) => Ok((StatusCode::OK, Json(ApiResponse::success(body)))),
            Err(e @ ReconcileError::ValidationError(_)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("INVALID_REQUEST", e.to_string(), None)),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("RECONCILE_FAILED", e.to_string(), None)),
            )),
        }
    }
}
