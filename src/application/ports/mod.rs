pub mod completion_service;
pub mod embedding_provider;
pub mod graph_store;
pub mod job_queue;
pub mod segmentation_service;
pub mod vector_index;

pub use completion_service::{CompletionError, CompletionRequest, CompletionService, OutputSchema};
pub use embedding_provider::EmbeddingProvider;
pub use graph_store::{GraphStore, GraphStoreError};
pub use job_queue::JobQueue;
pub use segmentation_service::{SegmentationError, SegmentationJobStatus, SegmentationService};
pub use vector_index::{VectorIndex, VectorIndexError, VectorRecord};
