use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::infrastructure::container::AppContainer;
use crate::infrastructure::messaging::BackgroundProcessor;
use crate::presentation::http::routes::{
    document_routes, graph_routes, health_routes, maintenance_routes, run_routes,
};

pub struct HttpServer {
    router: Router,
    background_processor: Arc<BackgroundProcessor>,
    port: u16,
}

impl HttpServer {
    pub fn new(container: &AppContainer) -> Self {
        let router = Router::new()
            .merge(health_routes(
                container.graph_enabled,
                container.job_queue.clone(),
            ))
            .merge(run_routes(
                container.run_handler.clone(),
                container.sse_handler.clone(),
            ))
            .merge(document_routes(container.document_handler.clone()))
            .merge(graph_routes(container.graph_handler.clone()))
            .merge(maintenance_routes(container.maintenance_handler.clone()));

        Self {
            router: with_layers(router, container.config.server.body_limit_bytes),
            background_processor: container.background_processor.clone(),
            port: container.config.server.port,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let background_processor = self.background_processor.clone();
        tokio::spawn(async move {
            background_processor.start().await;
        });

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("listening on {}", addr);

        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

fn with_layers(router: Router, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http()
        .on_request(
            |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                tracing::info!("Received request: {} {}", request.method(), request.uri());
            },
        )
        .on_response(
            |response: &axum::http::Response<axum::body::Body>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                tracing::info!(
                    "Response: {} (took {} ms)",
                    response.status(),
                    latency.as_millis()
                );
            },
        )
        .on_failure(
            |error: ServerErrorsFailureClass, latency: std::time::Duration, _span: &tracing::Span| {
                tracing::error!(
                    "Request failed: {:?} (took {} ms)",
                    error,
                    latency.as_millis()
                );
            },
        );

    router
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(trace)
}
