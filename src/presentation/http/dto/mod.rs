pub mod document_dto;
pub mod graph_dto;
pub mod response_dto;
pub mod run_dto;

pub use document_dto::*;
pub use graph_dto::*;
pub use response_dto::*;
pub use run_dto::*;
