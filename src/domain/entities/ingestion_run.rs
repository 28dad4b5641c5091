use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{GraphStatus, Namespace, RunStatus, UrlFingerprint};

/// One queued ingestion of a document URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRun {
    id: Uuid,
    document_url: String,
    url_fingerprint: UrlFingerprint,
    user_id: String,
    save_to_library: bool,
    status: RunStatus,
    progress: f32, // 0.0 to 1.0
    task_id: Option<String>,
    namespace: Option<Namespace>,
    graph_status: GraphStatus,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    result_summary: Option<RunResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub chunks_created: i32,
    pub vectors_upserted: i32,
    pub references_extracted: i32,
    pub processing_time_ms: u64,
}

impl IngestionRun {
    pub fn new(document_url: String, user_id: String, save_to_library: bool) -> Self {
        let url_fingerprint = UrlFingerprint::of_url(&document_url);
        Self {
            id: Uuid::new_v4(),
            document_url,
            url_fingerprint,
            user_id,
            save_to_library,
            status: RunStatus::Pending,
            progress: 0.0,
            task_id: None,
            namespace: None,
            graph_status: GraphStatus::Disabled,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
            result_summary: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        document_url: String,
        url_fingerprint: UrlFingerprint,
        user_id: String,
        save_to_library: bool,
        status: RunStatus,
        progress: f32,
        task_id: Option<String>,
        namespace: Option<Namespace>,
        graph_status: GraphStatus,
        created_at: DateTime<Utc>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        error_message: Option<String>,
        result_summary: Option<RunResult>,
    ) -> Self {
        Self {
            id,
            document_url,
            url_fingerprint,
            user_id,
            save_to_library,
            status,
            progress,
            task_id,
            namespace,
            graph_status,
            created_at,
            started_at,
            completed_at,
            error_message,
            result_summary,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    pub fn url_fingerprint(&self) -> &UrlFingerprint {
        &self.url_fingerprint
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn save_to_library(&self) -> bool {
        self.save_to_library
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    pub fn graph_status(&self) -> GraphStatus {
        self.graph_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn result_summary(&self) -> Option<&RunResult> {
        self.result_summary.as_ref()
    }

    pub fn start_processing(&mut self) -> Result<(), String> {
        if !self.status.is_pending() {
            return Err(format!("Run is not in pending state: {}", self.status));
        }

        self.status = RunStatus::Processing;
        self.started_at = Some(Utc::now());
        self.progress = 0.1;
        Ok(())
    }

    pub fn update_progress(&mut self, progress: f32) -> Result<(), String> {
        if !self.status.is_processing() {
            return Err("Run is not in processing state".to_string());
        }

        if !(0.0..=1.0).contains(&progress) {
            return Err("Progress must be between 0.0 and 1.0".to_string());
        }

        // never move backwards
        self.progress = self.progress.max(progress);
        Ok(())
    }

    pub fn set_result_summary(&mut self, result: RunResult) {
        self.result_summary = Some(result);
    }

    pub fn complete_processing(&mut self, result: RunResult) -> Result<(), String> {
        if !self.status.is_processing() {
            return Err("Run is not in processing state".to_string());
        }

        self.status = RunStatus::Completed;
        self.progress = 1.0;
        self.completed_at = Some(Utc::now());
        self.result_summary = Some(result);
        self.error_message = None;
        Ok(())
    }

    /// Pending runs may fail too, e.g. when the worker cannot start them.
    pub fn fail_processing(&mut self, error: String) -> Result<(), String> {
        let failed = RunStatus::Failed(error.clone());
        if !self.status.can_transition_to(&failed) {
            return Err(format!("Run cannot fail from state: {}", self.status));
        }

        self.status = failed;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(error);
        Ok(())
    }

    pub fn set_task_id(&mut self, task_id: String) {
        self.task_id = Some(task_id);
    }

    pub fn set_namespace(&mut self, namespace: Namespace) {
        self.namespace = Some(namespace);
    }

    pub fn set_graph_status(&mut self, graph_status: GraphStatus) {
        self.graph_status = graph_status;
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            (Some(start), None) if self.status.is_processing() => Some(Utc::now() - start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> IngestionRun {
        IngestionRun::new(
            "https://example.org/paper.pdf".to_string(),
            "user-1".to_string(),
            false,
        )
    }

    #[test]
    fn test_run_creation() {
        let run = run();

        assert_eq!(run.status(), &RunStatus::Pending);
        assert_eq!(run.progress(), 0.0);
        assert_eq!(run.graph_status(), GraphStatus::Disabled);
        assert_eq!(
            run.url_fingerprint(),
            &UrlFingerprint::of_url("https://example.org/paper.pdf")
        );
        assert!(!run.status().is_terminal());
    }

    #[test]
    fn test_run_workflow() {
        let mut run = run();

        assert!(run.start_processing().is_ok());
        assert_eq!(run.status(), &RunStatus::Processing);
        assert!(run.started_at().is_some());
        assert!(run.start_processing().is_err());

        assert!(run.update_progress(0.5).is_ok());
        assert!(run.update_progress(0.3).is_ok());
        assert_eq!(run.progress(), 0.5);
        assert!(run.update_progress(1.5).is_err());

        run.set_task_id("task-1".to_string());
        run.set_namespace(Namespace::generate("A Paper"));

        let result = RunResult {
            chunks_created: 4,
            vectors_upserted: 4,
            references_extracted: 12,
            processing_time_ms: 1500,
        };
        assert!(run.complete_processing(result).is_ok());
        assert_eq!(run.status(), &RunStatus::Completed);
        assert_eq!(run.progress(), 1.0);
        assert_eq!(run.task_id(), Some("task-1"));
        assert!(run.duration().is_some());
        assert!(run.status().is_terminal());
    }

    #[test]
    fn test_run_failure() {
        let mut run = run();
        run.start_processing().unwrap();

        assert!(run.fail_processing("segmentation timed out".to_string()).is_ok());
        assert_eq!(run.error_message(), Some("segmentation timed out"));
        assert!(run.status().is_terminal());
        assert!(run.fail_processing("again".to_string()).is_err());
    }

    #[test]
    fn test_pending_run_can_fail() {
        let mut run = run();
        assert!(run.fail_processing("worker unavailable".to_string()).is_ok());
        assert!(run.status().is_terminal());
    }
}
