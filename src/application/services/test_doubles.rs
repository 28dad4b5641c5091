//! In-memory fakes and fixtures shared by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::job_queue::{JobQueueError, QueueHealth};
use crate::application::ports::segmentation_service::SegmentationJobState;
use crate::application::ports::{
    CompletionError, CompletionRequest, CompletionService, GraphStore, GraphStoreError, JobQueue,
    OutputSchema, SegmentationError, SegmentationJobStatus, SegmentationService, VectorIndex,
    VectorIndexError, VectorRecord,
};
use crate::application::services::ingestion_orchestrator::{IngestionObserver, IngestionStage};
use crate::domain::entities::citation_graph::{CITED_LABEL, ORIGIN_LABEL, TASK_LABEL};
use crate::domain::entities::{
    CitationGraphPlan, Chunk, DocumentRecord, GraphFragment, GraphLink, GraphNode,
    GraphWriteSummary, IngestionRun, LibraryEntry, Reference, Segment, SegmentType,
    SegmentedChunk,
};
use crate::domain::repositories::{
    ChunkRepository, ChunkRepositoryError, DocumentRepository, DocumentRepositoryError,
    LibraryRepository, LibraryRepositoryError, RunRepository, RunRepositoryError,
};
use crate::domain::value_objects::{BoundingBox, Namespace, PageDimensions, UrlFingerprint};

// ---- fixtures ----

pub fn segment(id: &str, bbox: BoundingBox) -> Segment {
    Segment {
        segment_id: id.to_string(),
        bbox,
        page_number: Some(1),
        page_size: None,
        segment_type: SegmentType::Text,
        content: "segment text".to_string(),
        confidence: Some(0.9),
        citation_marker: None,
    }
}

pub fn segment_on_page(id: &str, page: Option<i32>) -> Segment {
    Segment {
        page_number: page,
        ..segment(id, BoundingBox::new(0.0, 0.0, 1.0, 1.0))
    }
}

pub fn chunk(id: &str, segments: Vec<Segment>) -> SegmentedChunk {
    SegmentedChunk {
        chunk_id: id.to_string(),
        embed: "embedded text".to_string(),
        segments,
    }
}

/// Chunk with one text segment per entry.
pub fn text_chunk(id: &str, contents: &[&str]) -> SegmentedChunk {
    let segments = contents
        .iter()
        .enumerate()
        .map(|(i, content)| Segment {
            content: content.to_string(),
            ..segment(&format!("{}-s{}", id, i), BoundingBox::new(0.0, i as f64 * 10.0, 100.0, 10.0))
        })
        .collect();
    chunk(id, segments)
}

/// Chunk with one segment per citation marker, plus a plain one when there are none.
pub fn cited_chunk(id: &str, markers: &[&str]) -> SegmentedChunk {
    let mut segments: Vec<Segment> = markers
        .iter()
        .enumerate()
        .map(|(i, marker)| Segment {
            content: format!("claim {} {}", i, marker),
            citation_marker: Some(marker.to_string()),
            ..segment(&format!("{}-s{}", id, i), BoundingBox::new(0.0, 0.0, 10.0, 10.0))
        })
        .collect();
    if segments.is_empty() {
        segments.push(segment(&format!("{}-plain", id), BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
    }
    chunk(id, segments)
}

pub fn reference(title: &str) -> Reference {
    Reference {
        title: title.to_string(),
        authors: vec!["Doe, J.".to_string()],
        year: Some("2020".to_string()),
        url: None,
        order: 0,
    }
}

pub fn stored_chunk(id: &str, namespace: &Namespace) -> Chunk {
    Chunk::new(
        id.to_string(),
        namespace.clone(),
        "stored text".to_string(),
        BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        1,
    )
}

pub fn document_in(namespace: &Namespace) -> DocumentRecord {
    DocumentRecord::new(
        "user-1".to_string(),
        namespace.clone(),
        "A Title".to_string(),
        String::new(),
        format!("https://example.org/{}.pdf", namespace),
        PageDimensions::new(),
        format!("task-{}", namespace),
    )
}

pub fn metadata_json(title: &str) -> String {
    format!(
        "```json\n{{\"title\": \"{}\", \"description\": \"About things.\", \"authors\": [\"Doe, J.\"], \
         \"citations\": {{\"in_text\": \"(Doe, 2020)\"}}, \"year\": \"2020\"}}\n```",
        title
    )
}

pub fn references_json(titles: &[&str]) -> serde_json::Value {
    let references: Vec<serde_json::Value> = titles
        .iter()
        .map(|t| serde_json::json!({ "title": t, "authors": ["Doe, J."], "year": "2020", "url": "" }))
        .collect();
    serde_json::json!({ "references": references })
}

// ---- completion ----

pub struct FakeCompletion {
    text: Option<String>,
    json: Option<serde_json::Value>,
    fail: bool,
    calls: AtomicU32,
    last_prompt: Mutex<Option<String>>,
    last_schema: Mutex<Option<String>>,
}

impl Default for FakeCompletion {
    fn default() -> Self {
        Self {
            text: Some("{}".to_string()),
            json: Some(serde_json::json!({ "references": [] })),
            fail: false,
            calls: AtomicU32::new(0),
            last_prompt: Mutex::new(None),
            last_schema: Mutex::new(None),
        }
    }
}

impl FakeCompletion {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn with_json(json: serde_json::Value) -> Self {
        Self {
            json: Some(json),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    pub fn last_schema_name(&self) -> Option<String> {
        self.last_schema.lock().unwrap().clone()
    }

    fn record(&self, request: &CompletionRequest) -> Result<(), CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());
        if self.fail {
            return Err(CompletionError::NetworkError("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.record(&request)?;
        self.text.clone().ok_or(CompletionError::EmptyResponse)
    }

    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value, CompletionError> {
        self.record(&request)?;
        *self.last_schema.lock().unwrap() = Some(schema.name.clone());
        self.json.clone().ok_or(CompletionError::EmptyResponse)
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

// ---- segmentation ----

pub struct FakeSegmentation {
    empty_polls: Option<u32>,
    chunks: Vec<SegmentedChunk>,
    state: SegmentationJobState,
    polls: AtomicU32,
}

impl FakeSegmentation {
    /// Output appears on poll number `empty_polls + 1`.
    pub fn ready_after(empty_polls: u32, chunks: Vec<SegmentedChunk>) -> Self {
        Self {
            empty_polls: Some(empty_polls),
            chunks,
            state: SegmentationJobState::Processing,
            polls: AtomicU32::new(0),
        }
    }

    pub fn never_ready() -> Self {
        Self {
            empty_polls: None,
            chunks: Vec::new(),
            state: SegmentationJobState::Processing,
            polls: AtomicU32::new(0),
        }
    }

    pub fn with_state(state: SegmentationJobState) -> Self {
        Self {
            state,
            ..Self::never_ready()
        }
    }

    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SegmentationService for FakeSegmentation {
    async fn submit(&self, _document_url: &str) -> Result<String, SegmentationError> {
        Ok(format!("task-{}", Uuid::new_v4().simple()))
    }

    async fn poll(&self, task_id: &str) -> Result<SegmentationJobStatus, SegmentationError> {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        let ready = self.empty_polls.is_some_and(|n| seen >= n);

        Ok(SegmentationJobStatus {
            task_id: task_id.to_string(),
            state: if ready {
                SegmentationJobState::Succeeded
            } else {
                self.state.clone()
            },
            message: None,
            chunks: if ready { self.chunks.clone() } else { Vec::new() },
        })
    }
}

// ---- vector index ----

#[derive(Default)]
pub struct InMemoryVectorIndex {
    namespaces: Mutex<HashMap<Namespace, HashMap<String, VectorRecord>>>,
    batches: Mutex<Vec<usize>>,
    fail: AtomicBool,
}

impl InMemoryVectorIndex {
    pub fn fail_upserts(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn seed_namespace(&self, namespace: &Namespace, records: usize) {
        let mut namespaces = self.namespaces.lock().unwrap();
        let entry = namespaces.entry(namespace.clone()).or_default();
        for i in 0..records {
            let id = format!("seed-{}", i);
            entry.insert(
                id.clone(),
                VectorRecord {
                    id,
                    text: "seed".to_string(),
                    page: 1,
                },
            );
        }
    }

    pub fn has_namespace(&self, namespace: &Namespace) -> bool {
        self.namespaces.lock().unwrap().contains_key(namespace)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(
        &self,
        namespace: &Namespace,
        records: &[VectorRecord],
    ) -> Result<usize, VectorIndexError> {
        if records.len() > self.max_batch_size() {
            return Err(VectorIndexError::BatchTooLarge {
                size: records.len(),
                max: self.max_batch_size(),
            });
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(VectorIndexError::ApiError {
                status: 503,
                message: "index unavailable".to_string(),
            });
        }

        self.batches.lock().unwrap().push(records.len());
        let mut namespaces = self.namespaces.lock().unwrap();
        let entry = namespaces.entry(namespace.clone()).or_default();
        for record in records {
            entry.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorIndexError> {
        self.namespaces.lock().unwrap().remove(namespace);
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, VectorIndexError> {
        Ok(self.namespaces.lock().unwrap().keys().cloned().collect())
    }
}

// ---- repositories ----

#[derive(Default)]
pub struct InMemoryChunkRepository {
    chunks: Mutex<Vec<Chunk>>,
}

impl InMemoryChunkRepository {
    pub fn count(&self, namespace: &Namespace) -> usize {
        self.chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.namespace() == namespace)
            .count()
    }

    pub fn total(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }
}

#[async_trait]
impl ChunkRepository for InMemoryChunkRepository {
    async fn save_batch(&self, chunks: &[Chunk]) -> Result<(), ChunkRepositoryError> {
        let mut stored = self.chunks.lock().unwrap();
        for chunk in chunks {
            stored.retain(|c| !(c.id() == chunk.id() && c.namespace() == chunk.namespace()));
            stored.push(chunk.clone());
        }
        Ok(())
    }

    async fn find_by_namespace(
        &self,
        namespace: &Namespace,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Chunk>, ChunkRepositoryError> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.namespace() == namespace)
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_by_namespace(&self, namespace: &Namespace) -> Result<i64, ChunkRepositoryError> {
        Ok(self.count(namespace) as i64)
    }

    async fn delete_by_namespace(&self, namespace: &Namespace) -> Result<i64, ChunkRepositoryError> {
        let mut stored = self.chunks.lock().unwrap();
        let before = stored.len();
        stored.retain(|c| c.namespace() != namespace);
        Ok((before - stored.len()) as i64)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ChunkRepositoryError> {
        let mut namespaces: Vec<Namespace> = self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.namespace().clone())
            .collect();
        namespaces.sort();
        namespaces.dedup();
        Ok(namespaces)
    }
}

#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: Mutex<Vec<DocumentRecord>>,
}

impl InMemoryDocumentRepository {
    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn save(&self, document: &DocumentRecord) -> Result<(), DocumentRepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        if documents.iter().any(|d| d.namespace() == document.namespace()) {
            return Err(DocumentRepositoryError::DuplicateError(document.namespace().to_string()));
        }
        documents.push(document.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentRecord>, DocumentRepositoryError> {
        Ok(self.documents.lock().unwrap().iter().find(|d| d.id() == id).cloned())
    }

    async fn find_by_url(
        &self,
        file_url: &str,
    ) -> Result<Option<DocumentRecord>, DocumentRepositoryError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|d| d.file_url() == file_url)
            .cloned())
    }

    async fn find_by_namespace(
        &self,
        namespace: &Namespace,
    ) -> Result<Option<DocumentRecord>, DocumentRepositoryError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.namespace() == namespace)
            .cloned())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<DocumentRecord>, DocumentRepositoryError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id() == user_id)
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DocumentRepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|d| d.id() != id);
        Ok(documents.len() < before)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, DocumentRepositoryError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.namespace().clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryLibraryRepository {
    entries: Mutex<Vec<LibraryEntry>>,
}

impl InMemoryLibraryRepository {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl LibraryRepository for InMemoryLibraryRepository {
    async fn add(&self, entry: &LibraryEntry) -> Result<(), LibraryRepositoryError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRunRepository {
    runs: Mutex<HashMap<Uuid, IngestionRun>>,
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn save(&self, run: &IngestionRun) -> Result<(), RunRepositoryError> {
        self.runs.lock().unwrap().insert(run.id(), run.clone());
        Ok(())
    }

    async fn update(&self, run: &IngestionRun) -> Result<(), RunRepositoryError> {
        let mut runs = self.runs.lock().unwrap();
        if !runs.contains_key(&run.id()) {
            return Err(RunRepositoryError::NotFound(run.id()));
        }
        runs.insert(run.id(), run.clone());
        Ok(())
    }

    async fn find_by_id(&self, run_id: Uuid) -> Result<Option<IngestionRun>, RunRepositoryError> {
        Ok(self.runs.lock().unwrap().get(&run_id).cloned())
    }

    async fn find_active(&self) -> Result<Vec<IngestionRun>, RunRepositoryError> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.status().is_terminal())
            .cloned()
            .collect())
    }

    async fn find_active_by_fingerprint(
        &self,
        fingerprint: &UrlFingerprint,
    ) -> Result<Option<IngestionRun>, RunRepositoryError> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .values()
            .find(|r| !r.status().is_terminal() && r.url_fingerprint() == fingerprint)
            .cloned())
    }
}

// ---- graph store ----

#[derive(Clone)]
struct StoredNode {
    task_id: String,
    node: GraphNode,
}

#[derive(Clone)]
struct StoredLink {
    task_id: String,
    link: GraphLink,
}

#[derive(Default)]
pub struct InMemoryGraphStore {
    nodes: Mutex<Vec<StoredNode>>,
    links: Mutex<Vec<StoredLink>>,
    failures_left: AtomicU32,
    next_id: AtomicU32,
}

impl InMemoryGraphStore {
    /// The next `n` writes store the task node and then fail.
    pub fn fail_next_writes(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }

    pub fn task_count(&self, task_id: &str) -> usize {
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.task_id == task_id && n.node.labels.iter().any(|l| l == TASK_LABEL))
            .count()
    }

    fn add_node(&self, task_id: &str, label: &str, properties: serde_json::Value) -> String {
        let id = format!("n{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.nodes.lock().unwrap().push(StoredNode {
            task_id: task_id.to_string(),
            node: GraphNode {
                id: id.clone(),
                labels: vec![label.to_string()],
                properties: properties.as_object().cloned().unwrap_or_default(),
            },
        });
        id
    }

    fn add_link(&self, task_id: &str, source: &str, target: &str, link_type: &str) {
        let id = format!("r{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.links.lock().unwrap().push(StoredLink {
            task_id: task_id.to_string(),
            link: GraphLink {
                id,
                source: source.to_string(),
                target: target.to_string(),
                link_type: link_type.to_string(),
            },
        });
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn write_plan(
        &self,
        plan: &CitationGraphPlan,
    ) -> Result<GraphWriteSummary, GraphStoreError> {
        let task_id = plan.task.task_id.as_str();
        let task = self.add_node(task_id, TASK_LABEL, serde_json::json!({ "task_id": task_id }));

        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(GraphStoreError::NetworkError("connection reset".to_string()));
        }

        let mut cited_ids = HashMap::new();
        for cited in &plan.cited {
            let id = self.add_node(
                task_id,
                CITED_LABEL,
                serde_json::json!({ "order": cited.order, "title": cited.title, "authors": cited.authors }),
            );
            cited_ids.insert(cited.order, id);
        }

        let mut summary = GraphWriteSummary {
            cited_nodes: plan.cited.len(),
            ..Default::default()
        };
        for origin in &plan.origins {
            let origin_id = self.add_node(
                task_id,
                ORIGIN_LABEL,
                serde_json::json!({ "chunk_id": origin.origin.chunk_id, "content": origin.origin.content }),
            );
            self.add_link(task_id, &task, &origin_id, "HAS_ORIGIN");
            summary.origin_nodes += 1;

            for order in &origin.cited_orders {
                if let Some(target) = cited_ids.get(order) {
                    self.add_link(task_id, &origin_id, target, "CITED");
                    summary.cited_edges += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn fetch_run_graph(&self, task_id: &str) -> Result<Vec<GraphFragment>, GraphStoreError> {
        let nodes: HashMap<String, GraphNode> = self
            .nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.task_id == task_id)
            .map(|n| (n.node.id.clone(), n.node.clone()))
            .collect();
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        // one fragment per relationship, so shared endpoints repeat
        let mut fragments: Vec<GraphFragment> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.task_id == task_id)
            .map(|l| GraphFragment {
                nodes: [&l.link.source, &l.link.target]
                    .iter()
                    .filter_map(|id| nodes.get(*id).cloned())
                    .collect(),
                links: vec![l.link.clone()],
            })
            .collect();
        fragments.push(GraphFragment {
            nodes: nodes.into_values().collect(),
            links: Vec::new(),
        });
        Ok(fragments)
    }

    async fn delete_run(&self, task_id: &str) -> Result<(), GraphStoreError> {
        self.nodes.lock().unwrap().retain(|n| n.task_id != task_id);
        self.links.lock().unwrap().retain(|l| l.task_id != task_id);
        Ok(())
    }
}

// ---- queue ----

#[derive(Default)]
pub struct InMemoryJobQueue {
    runs: Mutex<std::collections::VecDeque<IngestionRun>>,
}

impl InMemoryJobQueue {
    pub fn len(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    pub fn runs(&self) -> Vec<IngestionRun> {
        self.runs.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, run: IngestionRun) -> Result<(), JobQueueError> {
        self.runs.lock().unwrap().push_back(run);
        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, JobQueueError> {
        Ok(QueueHealth {
            queue_size: self.len(),
            total_enqueued: self.len() as u64,
            total_dequeued: 0,
            is_healthy: true,
            last_activity: None,
        })
    }
}

// ---- observer ----

pub struct NoopObserver;

#[async_trait]
impl IngestionObserver for NoopObserver {
    async fn on_stage(&self, _stage: IngestionStage) {}
}

#[derive(Default)]
pub struct RecordingObserver {
    stages: Mutex<Vec<IngestionStage>>,
}

impl RecordingObserver {
    pub fn stages(&self) -> Vec<IngestionStage> {
        self.stages.lock().unwrap().clone()
    }
}

#[async_trait]
impl IngestionObserver for RecordingObserver {
    async fn on_stage(&self, stage: IngestionStage) {
        self.stages.lock().unwrap().push(stage);
    }
}
