use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use std::sync::Arc;

use crate::application::ports::job_queue::JobQueue;
use crate::presentation::http::dto::{ApiResponse, HealthResponseDto};

#[derive(Clone)]
struct HealthState {
    graph_enabled: bool,
    job_queue: Arc<dyn JobQueue>,
}

pub fn health_routes(graph_enabled: bool, job_queue: Arc<dyn JobQueue>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(HealthState {
            graph_enabled,
            job_queue,
        })
}

async fn root_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse::success("citeweave".to_string())),
    )
}

async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let queue = match state.job_queue.health_check().await {
        Ok(queue) => Some(queue),
        Err(e) => {
            tracing::warn!("Job queue health check failed: {}", e);
            None
        }
    };
    let status = match &queue {
        Some(queue) if queue.is_healthy => "healthy",
        _ => "degraded",
    };

    let health_response = HealthResponseDto {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        graph_enabled: state.graph_enabled,
        queue,
    };

    (StatusCode::OK, Json(ApiResponse::success(health_response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::application::services::test_doubles::InMemoryJobQueue;
    use crate::domain::entities::IngestionRun;

    async fn get_health(app: Router) -> serde_json::Value {
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_queue_depth() {
        let queue = Arc::new(InMemoryJobQueue::default());
        queue
            .enqueue(IngestionRun::new(
                "https://arxiv.org/pdf/1706.03762".to_string(),
                "u1".to_string(),
                false,
            ))
            .await
            .unwrap();

        let body = get_health(health_routes(true, queue)).await;
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["graph_enabled"], true);
        assert_eq!(body["data"]["queue"]["queue_size"], 1);
        assert_eq!(body["data"]["queue"]["total_enqueued"], 1);
    }
}
