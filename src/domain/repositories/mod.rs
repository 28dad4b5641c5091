pub mod chunk_repository;
pub mod document_repository;
pub mod library_repository;
pub mod run_repository;

pub use chunk_repository::{ChunkRepository, ChunkRepositoryError};
pub use document_repository::{DocumentRepository, DocumentRepositoryError};
pub use library_repository::{LibraryRepository, LibraryRepositoryError};
pub use run_repository::{RunRepository, RunRepositoryError};
