use axum::{Router, routing::delete, routing::get};
use std::sync::Arc;

use crate::presentation::http::handlers::DocumentHandler;

pub fn document_routes(document_handler: Arc<DocumentHandler>) -> Router {
    Router::new()
        .route("/documents", get(DocumentHandler::list_user_documents))
        .route("/documents/lookup", get(DocumentHandler::lookup_by_url))
        .route(
            "/documents/{namespace}/chunks",
            get(DocumentHandler::list_chunks),
        )
        .route(
            "/documents/{document_id}",
            delete(DocumentHandler::delete_document),
        )
        .with_state(document_handler)
}
