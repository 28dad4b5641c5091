pub mod chunk_model;
pub mod chunk_vector_model;
pub mod document_model;
pub mod library_entry_model;
pub mod run_model;

pub use chunk_model::*;
pub use chunk_vector_model::*;
pub use document_model::*;
pub use library_entry_model::*;
pub use run_model::*;
