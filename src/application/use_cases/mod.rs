pub mod delete_document;
pub mod get_citation_graph;
pub mod get_run_status;
pub mod list_documents;
pub mod queue_ingestion;
pub mod reconcile_namespaces;

pub use delete_document::DeleteDocumentUseCase;
pub use get_citation_graph::GetCitationGraphUseCase;
pub use get_run_status::GetRunStatusUseCase;
pub use list_documents::ListDocumentsUseCase;
pub use queue_ingestion::QueueIngestionUseCase;
pub use reconcile_namespaces::ReconcileNamespacesUseCase;
