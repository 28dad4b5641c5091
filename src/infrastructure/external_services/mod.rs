pub mod chunkr_client;
pub mod inference_client;
pub mod neo4j_graph_store;
pub mod openai_completion;
pub mod pgvector_index;
pub mod pinecone_index;

pub use chunkr_client::{ChunkrClient, ChunkrClientConfig};
pub use inference_client::{EmbeddingsClientConfig, InferenceClient, InferenceEmbeddingProvider};
pub use neo4j_graph_store::{Neo4jConfig, Neo4jGraphStore};
pub use openai_completion::{OpenAiCompletionClient, OpenAiConfig};
pub use pgvector_index::PgvectorIndex;
pub use pinecone_index::{PineconeConfig, PineconeIndex};
