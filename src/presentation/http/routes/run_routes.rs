use axum::{Router, routing::get, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::{RunHandler, SseHandler};

pub fn run_routes(run_handler: Arc<RunHandler>, sse_handler: Arc<SseHandler>) -> Router {
    Router::new()
        .route("/ingestions", post(RunHandler::queue_ingestion))
        .route("/ingestions/batch", post(RunHandler::queue_batch))
        .route("/ingestions/active", get(RunHandler::get_active_runs))
        .route("/ingestions/{run_id}", get(RunHandler::get_run_status))
        .nest(
            "/ingestions",
            Router::new()
                .route("/{run_id}/stream", get(SseHandler::run_progress_stream))
                .with_state(sse_handler),
        )
        .with_state(run_handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::application::services::test_doubles::{InMemoryJobQueue, InMemoryRunRepository};
    use crate::application::use_cases::{GetRunStatusUseCase, QueueIngestionUseCase};

    fn router() -> (Router, Arc<InMemoryJobQueue>) {
        let runs = Arc::new(InMemoryRunRepository::default());
        let queue = Arc::new(InMemoryJobQueue::default());
        let status = Arc::new(GetRunStatusUseCase::new(runs.clone()));
        let run_handler = Arc::new(RunHandler::new(
            Arc::new(QueueIngestionUseCase::new(runs, queue.clone())),
            status.clone(),
        ));

        (run_routes(run_handler, Arc::new(SseHandler::new(status))), queue)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_queue_then_fetch_status() {
        let (app, queue) = router();

        let response = app
            .clone()
            .oneshot(post_json(
                "/ingestions",
                serde_json::json!({"url": "https://arxiv.org/pdf/1706.03762", "user_id": "u1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        let run_id = body["data"]["run_id"].as_str().unwrap().to_string();
        assert_eq!(queue.len(), 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/ingestions/{}", run_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["is_terminal"], false);
    }

    #[tokio::test]
    async fn test_duplicate_active_url_conflicts() {
        let (app, _) = router();
        let request = serde_json::json!({"url": "https://example.org/a.pdf", "user_id": "u1"});

        let first = app.clone().oneshot(post_json("/ingestions", request.clone())).await.unwrap();
        let second = app.oneshot(post_json("/ingestions", request)).await.unwrap();

        assert_eq!(first.status(), StatusCode::ACCEPTED);
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(second).await["error"]["code"], "RUN_ALREADY_ACTIVE");
    }

    #[tokio::test]
    async fn test_rejects_non_http_url_and_unknown_run() {
        let (app, queue) = router();

        let response = app
            .clone()
            .oneshot(post_json(
                "/ingestions",
                serde_json::json!({"url": "ftp://example.org/a.pdf", "user_id": "u1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(queue.len(), 0);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/ingestions/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
