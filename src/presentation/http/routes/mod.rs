pub mod document_routes;
pub mod graph_routes;
pub mod health_routes;
pub mod run_routes;

pub use document_routes::*;
pub use graph_routes::*;
pub use health_routes::*;
pub use run_routes::*;
