use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::application::services::ingestion_orchestrator::GraphOutcome;
use crate::application::services::{
    IngestionError, IngestionObserver, IngestionOrchestrator, IngestionOutcome, IngestionRequest,
    IngestionStage,
};
use crate::domain::entities::{IngestionRun, RunResult};
use crate::domain::repositories::RunRepository;
use crate::domain::value_objects::GraphStatus;
use crate::infrastructure::messaging::MpscJobQueueReceiver;

/// Mirrors orchestrator milestones onto the persisted run row.
struct RunProgressObserver {
    run: Arc<Mutex<IngestionRun>>,
    run_repository: Arc<dyn RunRepository>,
}

#[async_trait]
impl IngestionObserver for RunProgressObserver {
    async fn on_stage(&self, stage: IngestionStage) {
        let mut run = self.run.lock().await;

        match &stage {
            IngestionStage::Submitted { task_id } => run.set_task_id(task_id.clone()),
            IngestionStage::MetadataExtracted { namespace } => run.set_namespace(namespace.clone()),
            IngestionStage::Segmented { .. } | IngestionStage::Persisted => {}
        }
        if let Err(e) = run.update_progress(stage.progress()) {
            warn!(run_id = %run.id(), error = %e, "progress update rejected");
            return;
        }
        if let Err(e) = self.run_repository.update(&run).await {
            warn!(run_id = %run.id(), error = %e, "failed to persist run progress");
        }
    }
}

pub struct BackgroundProcessor {
    job_receiver: Arc<MpscJobQueueReceiver>,
    run_repository: Arc<dyn RunRepository>,
    orchestrator: Arc<IngestionOrchestrator>,
    worker_count: usize,
    run_timeout: Duration,
}

impl BackgroundProcessor {
    pub fn new(
        job_receiver: Arc<MpscJobQueueReceiver>,
        run_repository: Arc<dyn RunRepository>,
        orchestrator: Arc<IngestionOrchestrator>,
    ) -> Self {
        Self {
            job_receiver,
            run_repository,
            orchestrator,
            worker_count: 3,
            run_timeout: Duration::from_secs(6000),
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub async fn start(&self) {
        info!(workers = self.worker_count, "starting background processor");

        let mut handles = Vec::new();
        for worker_id in 0..self.worker_count {
            let processor = self.clone_for_worker();
            handles.push(tokio::spawn(async move {
                processor.worker_loop(worker_id).await;
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker = i, error = %e, "worker panicked");
            }
        }

        info!("background processor stopped");
    }

    async fn worker_loop(&self, worker_id: usize) {
        info!(worker = worker_id, "worker started");

        while let Some(run) = self.job_receiver.recv().await {
            info!(worker = worker_id, run_id = %run.id(), url = %run.document_url(), "processing run");
            self.process_run(run).await;
        }

        info!(worker = worker_id, "queue closed, worker stopped");
    }

    pub(crate) async fn process_run(&self, mut run: IngestionRun) {
        let run_id = run.id();

        if let Err(e) = run.start_processing() {
            error!(run_id = %run_id, error = %e, "failed to start run");
            return;
        }
        if let Err(e) = self.run_repository.update(&run).await {
            error!(run_id = %run_id, error = %e, "failed to mark run as processing");
            return;
        }

        let request = IngestionRequest {
            document_url: run.document_url().to_string(),
            user_id: run.user_id().to_string(),
            save_to_library: run.save_to_library(),
        };
        let shared = Arc::new(Mutex::new(run));
        let observer = RunProgressObserver {
            run: shared.clone(),
            run_repository: self.run_repository.clone(),
        };

        let result = tokio::time::timeout(
            self.run_timeout,
            self.orchestrator.ingest(&request, &observer),
        )
        .await
        .unwrap_or(Err(IngestionError::TimedOut(self.run_timeout)));

        let mut run = shared.lock().await.clone();
        match result {
            Ok(outcome) => self.finish_run(&mut run, outcome).await,
            Err(e) => {
                warn!(run_id = %run_id, kind = ?e.kind(), error = %e, "run failed");
                if let Err(err) = run.fail_processing(e.to_string()) {
                    error!(run_id = %run_id, error = %err, "failed to record run failure");
                }
                self.save_final(&run).await;
            }
        }
    }

    async fn finish_run(&self, run: &mut IngestionRun, outcome: IngestionOutcome) {
        run.set_task_id(outcome.task_id.clone());
        run.set_namespace(outcome.namespace.clone());

        let mut result = RunResult {
            chunks_created: outcome.chunks_created as i32,
            vectors_upserted: outcome.vectors_upserted as i32,
            references_extracted: 0,
            processing_time_ms: outcome.elapsed.as_millis() as u64,
        };

        let pending_graph = match outcome.graph {
            GraphOutcome::Disabled => None,
            GraphOutcome::Completed(summary) => {
                result.references_extracted = summary.cited_nodes as i32;
                run.set_graph_status(GraphStatus::Completed);
                None
            }
            GraphOutcome::Scheduled(handle) => {
                run.set_graph_status(GraphStatus::Scheduled);
                Some(handle)
            }
        };

        if let Err(e) = run.complete_processing(result.clone()) {
            error!(run_id = %run.id(), error = %e, "failed to complete run");
        }
        self.save_final(run).await;
        info!(
            run_id = %run.id(),
            namespace = %outcome.namespace,
            chunks = result.chunks_created,
            "run completed"
        );

        let Some(handle) = pending_graph else {
            return;
        };

        // The graph finishes after the run is already reported as completed.
        let mut run = run.clone();
        let run_repository = self.run_repository.clone();
        tokio::spawn(async move {
            match handle.await {
                Ok(Ok(summary)) => {
                    result.references_extracted = summary.cited_nodes as i32;
                    run.set_result_summary(result);
                    run.set_graph_status(GraphStatus::Completed);
                }
                Ok(Err(_)) => run.set_graph_status(GraphStatus::Failed),
                Err(e) => {
                    error!(run_id = %run.id(), error = %e, "graph task panicked");
                    run.set_graph_status(GraphStatus::Failed);
                }
            }
            if let Err(e) = run_repository.update(&run).await {
                error!(run_id = %run.id(), error = %e, "failed to save graph status");
            }
        });
    }

    async fn save_final(&self, run: &IngestionRun) {
        if let Err(e) = self.run_repository.update(run).await {
            error!(run_id = %run.id(), error = %e, "failed to save final run state");
        }
    }

    fn clone_for_worker(&self) -> Self {
        Self {
            job_receiver: self.job_receiver.clone(),
            run_repository: self.run_repository.clone(),
            orchestrator: self.orchestrator.clone(),
            worker_count: self.worker_count,
            run_timeout: self.run_timeout,
        }
    }
}
