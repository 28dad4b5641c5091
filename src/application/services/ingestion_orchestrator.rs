use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::ports::{
    GraphStoreError, SegmentationError, SegmentationService, VectorIndex,
    VectorIndexError, VectorRecord,
};
use crate::application::services::citation_graph_builder::CitationGraphBuilder;
use crate::application::services::metadata_extractor::{ExtractionError, MetadataExtractor};
use crate::application::services::reference_extractor::ReferenceExtractor;
use crate::application::services::retry::{AttemptError, PollError, RetryPolicy, poll_until};
use crate::application::services::segment_aggregator::{
    AggregatedChunk, AggregationError, SegmentAggregator,
};
use crate::domain::entities::{
    Chunk, DocumentRecord, GraphWriteSummary, LibraryEntry, SegmentedChunk,
};
use crate::domain::repositories::{ChunkRepository, DocumentRepository, LibraryRepository};
use crate::domain::value_objects::{DocumentMetadata, Namespace};

/// What happens when citation graph population fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFailurePolicy {
    /// Populate out of band; failures are logged and recorded on the run.
    #[default]
    Ignore,
    /// Out of band, retried with linear backoff before giving up.
    Retry { max_attempts: u32, base_delay: Duration },
    /// Populate inline before the document row is written; failure fails the run.
    Propagate,
}

#[derive(Debug, Clone)]
pub struct IngestionSettings {
    pub poll_policy: RetryPolicy,
    pub vector_batch_size: usize,
    pub graph_policy: GraphFailurePolicy,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            poll_policy: RetryPolicy::default(),
            vector_batch_size: crate::application::ports::vector_index::MAX_UPSERT_BATCH,
            graph_policy: GraphFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionRequest {
    pub document_url: String,
    pub user_id: String,
    pub save_to_library: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    VectorIndex,
    ChunkRows,
    DocumentRow,
    LibraryEntry,
}

impl std::fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WriteTarget::VectorIndex => "vector index",
            WriteTarget::ChunkRows => "chunk rows",
            WriteTarget::DocumentRow => "document row",
            WriteTarget::LibraryEntry => "library entry",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    pub target: WriteTarget,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum GraphPopulationError {
    #[error("Reference extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Graph store error: {0}")]
    Store(#[from] GraphStoreError),
    #[error("Gave up after {0} attempts")]
    RetriesExhausted(u32),
}

/// Failure classes, used for reporting and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Data,
    Store,
    Config,
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Segmentation failed: {0}")]
    Segmentation(#[from] SegmentationError),
    #[error("Segmentation produced no output after {attempts} attempts")]
    NoSegmentationOutput { attempts: u32 },
    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),
    #[error("Metadata extraction failed: {0}")]
    Metadata(ExtractionError),
    #[error("Citation graph population failed: {0}")]
    Graph(GraphPopulationError),
    #[error("Writes failed: {}", describe_failures(.0))]
    WritesFailed(Vec<WriteFailure>),
    #[error("Run timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_failures(failures: &[WriteFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.target, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl IngestionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestionError::Segmentation(e) => match e {
                SegmentationError::NetworkError(_) | SegmentationError::ApiError { .. } => {
                    ErrorKind::Transient
                }
                SegmentationError::ParseError(_) | SegmentationError::JobFailed { .. } => {
                    ErrorKind::Data
                }
            },
            IngestionError::NoSegmentationOutput { .. } | IngestionError::Aggregation(_) => {
                ErrorKind::Data
            }
            IngestionError::Metadata(e) => extraction_kind(e),
            IngestionError::Graph(e) => match e {
                GraphPopulationError::Extraction(inner) => extraction_kind(inner),
                GraphPopulationError::Store(GraphStoreError::NetworkError(_)) => {
                    ErrorKind::Transient
                }
                GraphPopulationError::Store(_) | GraphPopulationError::RetriesExhausted(_) => {
                    ErrorKind::Store
                }
            },
            IngestionError::WritesFailed(_) => ErrorKind::Store,
            IngestionError::TimedOut(_) => ErrorKind::Transient,
            IngestionError::Config(_) => ErrorKind::Config,
        }
    }
}

fn extraction_kind(error: &ExtractionError) -> ErrorKind {
    if error.is_transient() {
        ErrorKind::Transient
    } else {
        ErrorKind::Data
    }
}

/// Milestones reported while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionStage {
    Submitted { task_id: String },
    Segmented { chunks: usize },
    MetadataExtracted { namespace: Namespace },
    Persisted,
}

impl IngestionStage {
    pub fn progress(&self) -> f32 {
        match self {
            IngestionStage::Submitted { .. } => 0.2,
            IngestionStage::Segmented { .. } => 0.5,
            IngestionStage::MetadataExtracted { .. } => 0.6,
            IngestionStage::Persisted => 0.9,
        }
    }
}

#[async_trait]
pub trait IngestionObserver: Send + Sync {
    async fn on_stage(&self, stage: IngestionStage);
}

/// Graph population state at the moment `ingest` returns.
#[derive(Debug)]
pub enum GraphOutcome {
    Disabled,
    Completed(GraphWriteSummary),
    Scheduled(JoinHandle<Result<GraphWriteSummary, GraphPopulationError>>),
}

#[derive(Debug)]
pub struct IngestionOutcome {
    pub task_id: String,
    pub namespace: Namespace,
    pub document_id: Option<Uuid>,
    pub metadata: DocumentMetadata,
    pub chunks_created: usize,
    pub vectors_upserted: usize,
    pub graph: GraphOutcome,
    pub elapsed: Duration,
}

/// External collaborators the orchestrator writes to and reads from.
#[derive(Clone)]
pub struct IngestionPorts {
    pub segmentation: Arc<dyn SegmentationService>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub chunk_repository: Arc<dyn ChunkRepository>,
    pub document_repository: Arc<dyn DocumentRepository>,
    pub library_repository: Arc<dyn LibraryRepository>,
}

pub struct IngestionOrchestrator {
    ports: IngestionPorts,
    aggregator: SegmentAggregator,
    metadata_extractor: Arc<MetadataExtractor>,
    reference_extractor: Arc<ReferenceExtractor>,
    graph_builder: Option<Arc<CitationGraphBuilder>>,
    settings: IngestionSettings,
}

impl IngestionOrchestrator {
    pub fn new(
        ports: IngestionPorts,
        aggregator: SegmentAggregator,
        metadata_extractor: Arc<MetadataExtractor>,
        reference_extractor: Arc<ReferenceExtractor>,
        settings: IngestionSettings,
    ) -> Self {
        Self {
            ports,
            aggregator,
            metadata_extractor,
            reference_extractor,
            graph_builder: None,
            settings,
        }
    }

    /// Enables citation graph population.
    pub fn with_graph_builder(mut self, builder: Arc<CitationGraphBuilder>) -> Self {
        self.graph_builder = Some(builder);
        self
    }

    pub fn graph_enabled(&self) -> bool {
        self.graph_builder.is_some()
    }

    pub async fn ingest(
        &self,
        request: &IngestionRequest,
        observer: &dyn IngestionObserver,
    ) -> Result<IngestionOutcome, IngestionError> {
        let started = Instant::now();
        if self.settings.vector_batch_size == 0 {
            return Err(IngestionError::Config(
                "vector batch size must be at least 1".to_string(),
            ));
        }

        let task_id = self.ports.segmentation.submit(&request.document_url).await?;
        info!(task_id = %task_id, url = %request.document_url, "segmentation job submitted");
        observer
            .on_stage(IngestionStage::Submitted {
                task_id: task_id.clone(),
            })
            .await;

        let raw_chunks = self.wait_for_segments(&task_id).await?;
        let aggregation = self.aggregator.aggregate(&raw_chunks)?;
        info!(
            task_id = %task_id,
            chunks = aggregation.chunks.len(),
            dropped = aggregation.dropped,
            "segments aggregated"
        );
        observer
            .on_stage(IngestionStage::Segmented {
                chunks: aggregation.chunks.len(),
            })
            .await;

        let excerpt = &aggregation.title_excerpt;
        let metadata = self
            .metadata_extractor
            .extract(&excerpt.info, &excerpt.title)
            .await
            .map_err(IngestionError::Metadata)?;
        if metadata.is_unknown() {
            warn!(task_id = %task_id, "no title, authors or year recovered for document");
        }

        let title = metadata
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| excerpt.title.clone());
        let description = metadata.description.clone().unwrap_or_default();

        let namespace = if request.save_to_library {
            Namespace::library()
        } else {
            Namespace::generate(&title)
        };
        observer
            .on_stage(IngestionStage::MetadataExtracted {
                namespace: namespace.clone(),
            })
            .await;

        let library_entry = LibraryEntry::new(
            (!request.save_to_library).then(|| request.user_id.clone()),
            title.clone(),
            description.clone(),
            &request.document_url,
            &metadata,
        );

        if request.save_to_library {
            let vectors_upserted = self
                .run_library_mode(&namespace, &aggregation.chunks, &library_entry)
                .await?;
            observer.on_stage(IngestionStage::Persisted).await;

            return Ok(IngestionOutcome {
                task_id,
                namespace,
                document_id: None,
                metadata,
                chunks_created: 0,
                vectors_upserted,
                graph: GraphOutcome::Disabled,
                elapsed: started.elapsed(),
            });
        }

        // Phase A: vectors and chunk rows. Nothing is committed as a document yet.
        let chunks: Vec<Chunk> = aggregation
            .chunks
            .iter()
            .map(|c| {
                Chunk::new(c.chunk_id.clone(), namespace.clone(), c.text.clone(), c.bbox, c.page)
            })
            .collect();

        let (vectors, rows) = tokio::join!(
            self.upsert_vectors(&namespace, &aggregation.chunks),
            self.ports.chunk_repository.save_batch(&chunks),
        );

        let mut failures = Vec::new();
        let vectors_upserted = match vectors {
            Ok(count) => count,
            Err(e) => {
                failures.push(WriteFailure {
                    target: WriteTarget::VectorIndex,
                    message: e.to_string(),
                });
                0
            }
        };
        if let Err(e) = rows {
            failures.push(WriteFailure {
                target: WriteTarget::ChunkRows,
                message: e.to_string(),
            });
        }
        if !failures.is_empty() {
            error!(namespace = %namespace, "write phase failed before document commit");
            return Err(IngestionError::WritesFailed(failures));
        }

        let inline_graph = match (&self.graph_builder, self.settings.graph_policy) {
            (Some(builder), GraphFailurePolicy::Propagate) => Some(
                populate_graph(&self.reference_extractor, builder, &task_id, &raw_chunks)
                    .await
                    .map_err(IngestionError::Graph)?,
            ),
            _ => None,
        };

        // Phase B: the document row commits the run.
        let document = DocumentRecord::new(
            request.user_id.clone(),
            namespace.clone(),
            title,
            description,
            request.document_url.clone(),
            aggregation.page_dimensions.clone(),
            task_id.clone(),
        );

        let (document_result, library_result) = tokio::join!(
            self.ports.document_repository.save(&document),
            self.ports.library_repository.add(&library_entry),
        );

        let mut failures = Vec::new();
        if let Err(e) = document_result {
            failures.push(WriteFailure {
                target: WriteTarget::DocumentRow,
                message: e.to_string(),
            });
        }
        if let Err(e) = library_result {
            failures.push(WriteFailure {
                target: WriteTarget::LibraryEntry,
                message: e.to_string(),
            });
        }
        if !failures.is_empty() {
            return Err(IngestionError::WritesFailed(failures));
        }
        observer.on_stage(IngestionStage::Persisted).await;

        let graph = match (inline_graph, &self.graph_builder) {
            (Some(summary), _) => GraphOutcome::Completed(summary),
            (None, Some(builder)) => GraphOutcome::Scheduled(self.schedule_graph(
                builder.clone(),
                task_id.clone(),
                raw_chunks,
            )),
            (None, None) => GraphOutcome::Disabled,
        };

        info!(
            task_id = %task_id,
            namespace = %namespace,
            chunks = chunks.len(),
            vectors = vectors_upserted,
            "document ingested"
        );

        Ok(IngestionOutcome {
            task_id,
            namespace,
            document_id: Some(document.id()),
            metadata,
            chunks_created: chunks.len(),
            vectors_upserted,
            graph,
            elapsed: started.elapsed(),
        })
    }

    async fn wait_for_segments(&self, task_id: &str) -> Result<Vec<SegmentedChunk>, IngestionError> {
        let segmentation = self.ports.segmentation.clone();
        let policy = self.settings.poll_policy;

        let result = poll_until(
            &policy,
            |attempt| {
                let segmentation = segmentation.clone();
                async move {
                    debug!(task_id, attempt, "polling segmentation job");
                    let status = segmentation
                        .poll(task_id)
                        .await
                        .map_err(AttemptError::Transient)?;
                    if status.state.is_dead() && !status.has_output() {
                        return Err(AttemptError::Fatal(SegmentationError::JobFailed {
                            task_id: task_id.to_string(),
                            message: status.message.unwrap_or_default(),
                        }));
                    }
                    Ok(status)
                }
            },
            |status| status.has_output(),
        )
        .await;

        match result {
            Ok(status) => Ok(status.chunks),
            Err(PollError::Aborted(e)) => Err(IngestionError::Segmentation(e)),
            Err(PollError::Exhausted { attempts, last_error }) => {
                if let Some(e) = last_error {
                    warn!(task_id, error = %e, "last poll attempt error");
                }
                Err(IngestionError::NoSegmentationOutput { attempts })
            }
        }
    }

    /// Library runs only touch the shared vector namespace and the catalog.
    async fn run_library_mode(
        &self,
        namespace: &Namespace,
        chunks: &[AggregatedChunk],
        entry: &LibraryEntry,
    ) -> Result<usize, IngestionError> {
        let vectors_upserted = self.upsert_vectors(namespace, chunks).await.map_err(|e| {
            IngestionError::WritesFailed(vec![WriteFailure {
                target: WriteTarget::VectorIndex,
                message: e.to_string(),
            }])
        })?;

        self.ports.library_repository.add(entry).await.map_err(|e| {
            IngestionError::WritesFailed(vec![WriteFailure {
                target: WriteTarget::LibraryEntry,
                message: e.to_string(),
            }])
        })?;

        info!(vectors = vectors_upserted, "document added to library");
        Ok(vectors_upserted)
    }

    /// Issues every batch at once and waits for all of them to settle.
    async fn upsert_vectors(
        &self,
        namespace: &Namespace,
        chunks: &[AggregatedChunk],
    ) -> Result<usize, VectorIndexError> {
        let records: Vec<VectorRecord> = chunks
            .iter()
            .map(|c| VectorRecord {
                id: c.chunk_id.clone(),
                text: c.text.clone(),
                page: c.page,
            })
            .collect();

        let batch_size = self
            .settings
            .vector_batch_size
            .min(self.ports.vector_index.max_batch_size())
            .max(1);

        let results = join_all(
            records
                .chunks(batch_size)
                .map(|batch| self.ports.vector_index.upsert(namespace, batch)),
        )
        .await;

        let mut upserted = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(count) => upserted += count,
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "vector batch rejected");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(upserted),
        }
    }

    fn schedule_graph(
        &self,
        builder: Arc<CitationGraphBuilder>,
        task_id: String,
        raw_chunks: Vec<SegmentedChunk>,
    ) -> JoinHandle<Result<GraphWriteSummary, GraphPopulationError>> {
        let extractor = self.reference_extractor.clone();
        let policy = self.settings.graph_policy;

        tokio::spawn(async move {
            let result = match policy {
                GraphFailurePolicy::Retry {
                    max_attempts,
                    base_delay,
                } => {
                    populate_graph_with_retry(
                        &extractor,
                        &builder,
                        &task_id,
                        &raw_chunks,
                        RetryPolicy::new(max_attempts, base_delay),
                    )
                    .await
                }
                _ => populate_graph(&extractor, &builder, &task_id, &raw_chunks).await,
            };

            if let Err(e) = &result {
                error!(task_id = %task_id, error = %e, "citation graph population failed");
            }
            result
        })
    }
}

async fn populate_graph(
    extractor: &ReferenceExtractor,
    builder: &CitationGraphBuilder,
    task_id: &str,
    raw_chunks: &[SegmentedChunk],
) -> Result<GraphWriteSummary, GraphPopulationError> {
    let references = extractor.extract(raw_chunks).await?;
    Ok(builder.build(task_id, &references, raw_chunks).await?)
}

/// Partial writes from a failed attempt are removed before the next one.
async fn populate_graph_with_retry(
    extractor: &ReferenceExtractor,
    builder: &CitationGraphBuilder,
    task_id: &str,
    raw_chunks: &[SegmentedChunk],
    policy: RetryPolicy,
) -> Result<GraphWriteSummary, GraphPopulationError> {
    let result = poll_until(
        &policy,
        |attempt| async move {
            if attempt > 0 {
                builder
                    .delete_run(task_id)
                    .await
                    .map_err(|e| AttemptError::Transient(GraphPopulationError::Store(e)))?;
            }
            populate_graph(extractor, builder, task_id, raw_chunks)
                .await
                .map_err(AttemptError::Transient)
        },
        |_| true,
    )
    .await;

    match result {
        Ok(summary) => Ok(summary),
        Err(PollError::Aborted(e)) => Err(e),
        Err(PollError::Exhausted {
            attempts,
            last_error,
        }) => Err(last_error.unwrap_or(GraphPopulationError::RetriesExhausted(attempts))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::segmentation_service::SegmentationJobState;
    use crate::application::services::test_doubles::{
        FakeCompletion, FakeSegmentation, InMemoryChunkRepository, InMemoryDocumentRepository,
        InMemoryGraphStore, InMemoryLibraryRepository, InMemoryVectorIndex, NoopObserver,
        RecordingObserver, cited_chunk, metadata_json, references_json, segment,
    };
    use crate::domain::entities::{Segment, SegmentType};
    use crate::domain::repositories::DocumentRepository;
    use crate::domain::value_objects::BoundingBox;

    struct Harness {
        segmentation: Arc<FakeSegmentation>,
        vectors: Arc<InMemoryVectorIndex>,
        chunks: Arc<InMemoryChunkRepository>,
        documents: Arc<InMemoryDocumentRepository>,
        library: Arc<InMemoryLibraryRepository>,
        graph: Arc<InMemoryGraphStore>,
        metadata_completion: Arc<FakeCompletion>,
        reference_completion: Arc<FakeCompletion>,
    }

    impl Harness {
        fn new(segmentation: FakeSegmentation) -> Self {
            Self {
                segmentation: Arc::new(segmentation),
                vectors: Arc::new(InMemoryVectorIndex::default()),
                chunks: Arc::new(InMemoryChunkRepository::default()),
                documents: Arc::new(InMemoryDocumentRepository::default()),
                library: Arc::new(InMemoryLibraryRepository::default()),
                graph: Arc::new(InMemoryGraphStore::default()),
                metadata_completion: Arc::new(FakeCompletion::with_text(&metadata_json("A Study"))),
                reference_completion: Arc::new(FakeCompletion::with_json(references_json(&["A", "B", "C"]))),
            }
        }

        fn orchestrator(&self, settings: IngestionSettings, with_graph: bool) -> IngestionOrchestrator {
            let ports = IngestionPorts {
                segmentation: self.segmentation.clone(),
                vector_index: self.vectors.clone(),
                chunk_repository: self.chunks.clone(),
                document_repository: self.documents.clone(),
                library_repository: self.library.clone(),
            };
            let orchestrator = IngestionOrchestrator::new(
                ports,
                SegmentAggregator::default(),
                Arc::new(MetadataExtractor::new(self.metadata_completion.clone())),
                Arc::new(ReferenceExtractor::new(self.reference_completion.clone())),
                settings,
            );
            if with_graph {
                orchestrator.with_graph_builder(Arc::new(CitationGraphBuilder::new(self.graph.clone())))
            } else {
                orchestrator
            }
        }
    }

    fn settings() -> IngestionSettings {
        IngestionSettings {
            poll_policy: RetryPolicy::new(30, Duration::from_secs(2)).with_warmup(Duration::from_secs(10)),
            vector_batch_size: 96,
            graph_policy: GraphFailurePolicy::Ignore,
        }
    }

    fn request(save_to_library: bool) -> IngestionRequest {
        IngestionRequest {
            document_url: "https://example.org/paper.pdf".to_string(),
            user_id: "user-1".to_string(),
            save_to_library,
        }
    }

    /// First chunk opens with a title and a running header so metadata
    /// extraction has something to read.
    fn document_chunks(n: usize) -> Vec<SegmentedChunk> {
        let mut chunks: Vec<SegmentedChunk> = (0..n)
            .map(|i| {
                let markers: &[&str] = if i == 0 { &["[2,4]"] } else { &[] };
                cited_chunk(&format!("c{}", i), markers)
            })
            .collect();
        if let Some(first) = chunks.first_mut() {
            let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
            first.segments.splice(
                0..0,
                [
                    Segment {
                        segment_type: SegmentType::Title,
                        content: "A Study of Citation Graphs".to_string(),
                        ..segment("c0-title", bbox)
                    },
                    Segment {
                        segment_type: SegmentType::PageHeader,
                        content: "Journal of Testing, March 2021".to_string(),
                        ..segment("c0-header", bbox)
                    },
                ],
            );
        }
        chunks
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_run_persists_everything() {
        let harness = Harness::new(FakeSegmentation::ready_after(2, document_chunks(200)));
        let orchestrator = harness.orchestrator(settings(), true);
        let observer = RecordingObserver::default();

        let outcome = orchestrator.ingest(&request(false), &observer).await.unwrap();

        assert_eq!(outcome.chunks_created, 200);
        assert_eq!(outcome.vectors_upserted, 200);
        assert!(outcome.namespace.as_str().starts_with("a-study-"));
        assert_eq!(harness.metadata_completion.calls(), 1);
        assert_eq!(harness.vectors.batch_sizes(), vec![96, 96, 8]);
        assert_eq!(harness.chunks.count(&outcome.namespace), 200);

        let document = harness
            .documents
            .find_by_namespace(&outcome.namespace)
            .await
            .unwrap()
            .expect("document row");
        assert_eq!(document.task_id(), outcome.task_id);
        assert_eq!(document.title(), "A Study");
        assert_eq!(harness.library.len(), 1);

        let summary = match outcome.graph {
            GraphOutcome::Scheduled(handle) => handle.await.unwrap().unwrap(),
            other => panic!("expected scheduled graph, got {:?}", other),
        };
        assert_eq!(summary.cited_nodes, 3);
        assert_eq!(summary.cited_edges, 1);
        assert_eq!(observer.stages().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_polls_fail_without_document_row() {
        let harness = Harness::new(FakeSegmentation::never_ready());
        let orchestrator = harness.orchestrator(settings(), true);

        let err = orchestrator
            .ingest(&request(false), &NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::NoSegmentationOutput { attempts: 30 }));
        assert_eq!(err.kind(), ErrorKind::Data);
        assert_eq!(harness.segmentation.poll_count(), 30);
        assert_eq!(harness.documents.len(), 0);
        assert_eq!(harness.vectors.batch_sizes().len(), 0);
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected_before_submission() {
        let harness = Harness::new(FakeSegmentation::ready_after(0, document_chunks(2)));
        let orchestrator = harness.orchestrator(
            IngestionSettings {
                vector_batch_size: 0,
                ..settings()
            },
            false,
        );

        let err = orchestrator
            .ingest(&request(false), &NoopObserver)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(harness.segmentation.poll_count(), 0);
        assert_eq!(harness.metadata_completion.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_segmentation_job_aborts_polling() {
        let harness = Harness::new(FakeSegmentation::with_state(SegmentationJobState::Failed));
        let orchestrator = harness.orchestrator(settings(), false);

        let err = orchestrator
            .ingest(&request(false), &NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::Segmentation(SegmentationError::JobFailed { .. })));
        assert_eq!(harness.segmentation.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vector_failure_blocks_document_commit() {
        let harness = Harness::new(FakeSegmentation::ready_after(0, document_chunks(5)));
        harness.vectors.fail_upserts(true);
        let orchestrator = harness.orchestrator(settings(), true);

        let err = orchestrator
            .ingest(&request(false), &NoopObserver)
            .await
            .unwrap_err();

        match &err {
            IngestionError::WritesFailed(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].target, WriteTarget::VectorIndex);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(err.kind(), ErrorKind::Store);
        // chunk rows were still written; reconciliation cleans them up
        assert_eq!(harness.chunks.total(), 5);
        assert_eq!(harness.documents.len(), 0);
        assert_eq!(harness.graph.node_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_failure_is_fatal_by_default() {
        let mut harness = Harness::new(FakeSegmentation::ready_after(0, document_chunks(2)));
        harness.metadata_completion = Arc::new(FakeCompletion::with_text("no json here"));
        let orchestrator = harness.orchestrator(settings(), false);

        let err = orchestrator
            .ingest(&request(false), &NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::Metadata(_)));
        assert_eq!(harness.metadata_completion.calls(), 1);
        assert_eq!(harness.chunks.total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_graph_failure_does_not_fail_run() {
        let mut harness = Harness::new(FakeSegmentation::ready_after(0, document_chunks(3)));
        harness.reference_completion = Arc::new(FakeCompletion::failing());
        let orchestrator = harness.orchestrator(settings(), true);

        let outcome = orchestrator.ingest(&request(false), &NoopObserver).await.unwrap();

        assert!(outcome.document_id.is_some());
        match outcome.graph {
            GraphOutcome::Scheduled(handle) => assert!(handle.await.unwrap().is_err()),
            other => panic!("expected scheduled graph, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_propagated_graph_failure_fails_before_commit() {
        let mut harness = Harness::new(FakeSegmentation::ready_after(0, document_chunks(3)));
        harness.reference_completion = Arc::new(FakeCompletion::failing());
        let orchestrator = harness.orchestrator(
            IngestionSettings {
                graph_policy: GraphFailurePolicy::Propagate,
                ..settings()
            },
            true,
        );

        let err = orchestrator
            .ingest(&request(false), &NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::Graph(_)));
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(harness.documents.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_recovers_from_flaky_store() {
        let harness = Harness::new(FakeSegmentation::ready_after(0, document_chunks(3)));
        harness.graph.fail_next_writes(2);
        let orchestrator = harness.orchestrator(
            IngestionSettings {
                graph_policy: GraphFailurePolicy::Retry {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(500),
                },
                ..settings()
            },
            true,
        );

        let outcome = orchestrator.ingest(&request(false), &NoopObserver).await.unwrap();

        let summary = match outcome.graph {
            GraphOutcome::Scheduled(handle) => handle.await.unwrap().unwrap(),
            other => panic!("expected scheduled graph, got {:?}", other),
        };
        assert_eq!(summary.cited_nodes, 3);
        assert_eq!(harness.graph.task_count(&outcome.task_id), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_library_mode_only_indexes_and_catalogs() {
        let harness = Harness::new(FakeSegmentation::ready_after(1, document_chunks(4)));
        let orchestrator = harness.orchestrator(settings(), true);

        let outcome = orchestrator.ingest(&request(true), &NoopObserver).await.unwrap();

        assert!(outcome.namespace.is_library());
        assert!(outcome.document_id.is_none());
        assert!(matches!(outcome.graph, GraphOutcome::Disabled));
        assert_eq!(outcome.vectors_upserted, 4);
        assert_eq!(harness.chunks.total(), 0);
        assert_eq!(harness.documents.len(), 0);
        assert_eq!(harness.library.len(), 1);
        assert_eq!(harness.graph.node_count(), 0);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            IngestionError::Segmentation(SegmentationError::NetworkError("reset".into())).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            IngestionError::Aggregation(AggregationError::EmptyChunk("c".into())).kind(),
            ErrorKind::Data
        );
        assert_eq!(
            IngestionError::Metadata(ExtractionError::Unparseable("x".into())).kind(),
            ErrorKind::Data
        );
        assert_eq!(IngestionError::Config("x".into()).kind(), ErrorKind::Config);
    }
}
