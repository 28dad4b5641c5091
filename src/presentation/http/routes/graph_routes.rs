use axum::{Router, routing::get, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::{GraphHandler, MaintenanceHandler};

pub fn graph_routes(graph_handler: Arc<GraphHandler>) -> Router {
    Router::new()
        .route("/graph/{task_id}", get(GraphHandler::get_graph))
        .with_state(graph_handler)
}

pub fn maintenance_routes(maintenance_handler: Arc<MaintenanceHandler>) -> Router {
    Router::new()
        .route("/maintenance/reconcile", post(MaintenanceHandler::reconcile))
        .with_state(maintenance_handler)
}
