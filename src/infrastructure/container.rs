use std::sync::Arc;

use crate::{
    application::{
        ports::{
            CompletionService, EmbeddingProvider, GraphStore, JobQueue, SegmentationService,
            VectorIndex,
        },
        services::{
            CitationGraphBuilder, IngestionOrchestrator, IngestionPorts, MetadataExtractor,
            ReconciliationService, ReferenceExtractor, SegmentAggregator,
        },
        use_cases::{
            DeleteDocumentUseCase, GetCitationGraphUseCase, GetRunStatusUseCase,
            ListDocumentsUseCase, QueueIngestionUseCase, ReconcileNamespacesUseCase,
        },
    },
    config::{AppConfig, VectorBackend},
    domain::repositories::{ChunkRepository, DocumentRepository, LibraryRepository, RunRepository},
    infrastructure::{
        database::{
            create_connection_pool,
            repositories::{
                PostgresChunkRepository, PostgresDocumentRepository, PostgresLibraryRepository,
                PostgresRunRepository,
            },
            run_migrations,
        },
        external_services::{
            ChunkrClient, ChunkrClientConfig, EmbeddingsClientConfig, InferenceClient,
            InferenceEmbeddingProvider, Neo4jConfig, Neo4jGraphStore, OpenAiCompletionClient,
            OpenAiConfig, PgvectorIndex, PineconeConfig, PineconeIndex,
        },
        messaging::{BackgroundProcessor, MpscJobQueue},
    },
    presentation::http::handlers::{
        DocumentHandler, GraphHandler, MaintenanceHandler, RunHandler, SseHandler,
    },
};

const HTTP_TIMEOUT_SECS: u64 = 60;

pub struct AppContainer {
    pub config: AppConfig,
    pub graph_enabled: bool,

    // Repositories
    pub run_repository: Arc<dyn RunRepository>,
    pub chunk_repository: Arc<dyn ChunkRepository>,
    pub document_repository: Arc<dyn DocumentRepository>,
    pub library_repository: Arc<dyn LibraryRepository>,

    // External Services
    pub vector_index: Arc<dyn VectorIndex>,
    pub graph_store: Option<Arc<dyn GraphStore>>,

    // Job Queue and Background Processing
    pub job_queue: Arc<dyn JobQueue>,
    pub background_processor: Arc<BackgroundProcessor>,

    // Application Services
    pub orchestrator: Arc<IngestionOrchestrator>,

    // HTTP Handlers
    pub run_handler: Arc<RunHandler>,
    pub sse_handler: Arc<SseHandler>,
    pub document_handler: Arc<DocumentHandler>,
    pub graph_handler: Arc<GraphHandler>,
    pub maintenance_handler: Arc<MaintenanceHandler>,
}

impl AppContainer {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db_pool = create_connection_pool(&config.database.url, config.database.pool_size)?;
        run_migrations(&db_pool)?;

        // Repositories
        let run_repository: Arc<dyn RunRepository> =
            Arc::new(PostgresRunRepository::new(db_pool.clone()));
        let chunk_repository: Arc<dyn ChunkRepository> =
            Arc::new(PostgresChunkRepository::new(db_pool.clone()));
        let document_repository: Arc<dyn DocumentRepository> =
            Arc::new(PostgresDocumentRepository::new(db_pool.clone()));
        let library_repository: Arc<dyn LibraryRepository> =
            Arc::new(PostgresLibraryRepository::new(db_pool.clone()));

        // External services
        let segmentation: Arc<dyn SegmentationService> =
            Arc::new(ChunkrClient::new(ChunkrClientConfig {
                api_url: config.segmentation.api_url.clone(),
                api_key: config.segmentation.api_key.clone(),
                target_chunk_length: config.segmentation.target_chunk_length,
                timeout_secs: HTTP_TIMEOUT_SECS,
            })?);

        let completion_client = |model: &str| -> Result<Arc<dyn CompletionService>, reqwest::Error> {
            Ok(Arc::new(OpenAiCompletionClient::new(OpenAiConfig {
                api_url: config.completion.api_url.clone(),
                api_key: config.completion.api_key.clone(),
                model: model.to_string(),
                timeout: config.completion.timeout,
            })?))
        };
        let metadata_completion = completion_client(&config.completion.metadata_model)?;
        let reference_completion = completion_client(&config.completion.reference_model)?;

        let vector_index: Arc<dyn VectorIndex> = match &config.vector.backend {
            VectorBackend::Pinecone {
                index_host,
                api_key,
            } => Arc::new(PineconeIndex::new(PineconeConfig {
                index_host: index_host.clone(),
                api_key: api_key.clone(),
                timeout_secs: HTTP_TIMEOUT_SECS,
            })?),
            VectorBackend::Pgvector { embeddings_url } => {
                let client = InferenceClient::new(EmbeddingsClientConfig::new(
                    embeddings_url.clone(),
                ))?;
                let embedder: Arc<dyn EmbeddingProvider> =
                    Arc::new(InferenceEmbeddingProvider::new(client));
                Arc::new(PgvectorIndex::new(db_pool.clone(), embedder))
            }
        };

        let graph_store: Option<Arc<dyn GraphStore>> = match &config.graph {
            Some(graph) => Some(Arc::new(Neo4jGraphStore::new(Neo4jConfig {
                http_url: graph.http_url.clone(),
                user: graph.user.clone(),
                password: graph.password.clone(),
                database: graph.database.clone(),
                timeout_secs: HTTP_TIMEOUT_SECS,
            })?)),
            None => None,
        };
        let graph_builder = graph_store
            .clone()
            .map(|store| Arc::new(CitationGraphBuilder::new(store)));

        // Application services
        let metadata_extractor = Arc::new(
            MetadataExtractor::new(metadata_completion)
                .with_title_fallback(config.ingestion.metadata_fallback),
        );
        let reference_extractor = Arc::new(ReferenceExtractor::new(reference_completion));

        let ports = IngestionPorts {
            segmentation,
            vector_index: vector_index.clone(),
            chunk_repository: chunk_repository.clone(),
            document_repository: document_repository.clone(),
            library_repository: library_repository.clone(),
        };
        let mut orchestrator = IngestionOrchestrator::new(
            ports,
            SegmentAggregator::new(config.ingestion.text_byte_budget),
            metadata_extractor,
            reference_extractor,
            config.ingestion_settings(),
        );
        if let Some(builder) = &graph_builder {
            orchestrator = orchestrator.with_graph_builder(builder.clone());
        }
        let orchestrator = Arc::new(orchestrator);

        let reconciliation = Arc::new(ReconciliationService::new(
            vector_index.clone(),
            chunk_repository.clone(),
            document_repository.clone(),
            run_repository.clone(),
        ));

        // Job queue and background processor
        let (job_queue, job_receiver) = MpscJobQueue::create_pair();
        let job_queue: Arc<dyn JobQueue> = Arc::new(job_queue);

        let background_processor = Arc::new(
            BackgroundProcessor::new(
                Arc::new(job_receiver),
                run_repository.clone(),
                orchestrator.clone(),
            )
            .with_worker_count(config.ingestion.worker_count)
            .with_run_timeout(config.ingestion.run_timeout),
        );

        // Use cases
        let queue_ingestion_use_case = Arc::new(QueueIngestionUseCase::new(
            run_repository.clone(),
            job_queue.clone(),
        ));
        let get_run_status_use_case = Arc::new(GetRunStatusUseCase::new(run_repository.clone()));
        let list_documents_use_case = Arc::new(ListDocumentsUseCase::new(
            document_repository.clone(),
            chunk_repository.clone(),
        ));
        let delete_document_use_case = Arc::new(DeleteDocumentUseCase::new(
            document_repository.clone(),
            chunk_repository.clone(),
            vector_index.clone(),
            graph_store.clone(),
        ));
        let get_citation_graph_use_case =
            Arc::new(GetCitationGraphUseCase::new(graph_builder.clone()));
        let reconcile_use_case = Arc::new(ReconcileNamespacesUseCase::new(reconciliation));

        // HTTP handlers
        let run_handler = Arc::new(RunHandler::new(
            queue_ingestion_use_case,
            get_run_status_use_case.clone(),
        ));
        let sse_handler = Arc::new(SseHandler::new(get_run_status_use_case));
        let document_handler = Arc::new(DocumentHandler::new(
            list_documents_use_case,
            delete_document_use_case,
        ));
        let graph_handler = Arc::new(GraphHandler::new(get_citation_graph_use_case));
        let maintenance_handler = Arc::new(MaintenanceHandler::new(reconcile_use_case));

        Ok(Self {
            graph_enabled: orchestrator.graph_enabled(),
            config,
            run_repository,
            chunk_repository,
            document_repository,
            library_repository,
            vector_index,
            graph_store,
            job_queue,
            background_processor,
            orchestrator,
            run_handler,
            sse_handler,
            document_handler,
            graph_handler,
            maintenance_handler,
        })
    }
}
