pub mod postgres_chunk_repository;
pub mod postgres_document_repository;
pub mod postgres_library_repository;
pub mod postgres_run_repository;

pub use postgres_chunk_repository::PostgresChunkRepository;
pub use postgres_document_repository::PostgresDocumentRepository;
pub use postgres_library_repository::PostgresLibraryRepository;
pub use postgres_run_repository::PostgresRunRepository;
