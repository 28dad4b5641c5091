pub mod document_handler;
pub mod graph_handler;
pub mod run_handler;
pub mod sse_handler;

pub use document_handler::DocumentHandler;
pub use graph_handler::{GraphHandler, MaintenanceHandler};
pub use run_handler::RunHandler;
pub use sse_handler::SseHandler;
