use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{IngestionRun, RunResult};
use crate::domain::value_objects::{GraphStatus, Namespace, RunStatus, UrlFingerprint};
use crate::infrastructure::database::schema::ingestion_runs;

#[derive(Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name = ingestion_runs)]
#[diesel(primary_key(id))]
pub struct RunModel {
    pub id: Uuid,
    pub document_url: String,
    pub url_fingerprint: String,
    pub user_id: String,
    pub save_to_library: bool,
    pub status: String,
    pub progress: f32,
    pub task_id: Option<String>,
    pub namespace: Option<String>,
    pub graph_status: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result_summary: Option<serde_json::Value>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ingestion_runs)]
pub struct NewRunModel {
    pub id: Uuid,
    pub document_url: String,
    pub url_fingerprint: String,
    pub user_id: String,
    pub save_to_library: bool,
    pub status: String,
    pub progress: f32,
    pub task_id: Option<String>,
    pub namespace: Option<String>,
    pub graph_status: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result_summary: Option<serde_json::Value>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = ingestion_runs)]
pub struct UpdateRunModel {
    pub status: String,
    pub progress: f32,
    pub task_id: Option<Option<String>>,
    pub namespace: Option<Option<String>>,
    pub graph_status: String,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub error_message: Option<Option<String>>,
    pub result_summary: Option<Option<serde_json::Value>>,
}

fn encode_result(run: &IngestionRun) -> Option<serde_json::Value> {
    run.result_summary()
        .and_then(|r| serde_json::to_value(r).ok())
}

impl From<&IngestionRun> for NewRunModel {
    fn from(run: &IngestionRun) -> Self {
        Self {
            id: run.id(),
            document_url: run.document_url().to_string(),
            url_fingerprint: run.url_fingerprint().as_str().to_string(),
            user_id: run.user_id().to_string(),
            save_to_library: run.save_to_library(),
            status: run.status().as_str().to_string(),
            progress: run.progress(),
            task_id: run.task_id().map(str::to_string),
            namespace: run.namespace().map(|ns| ns.to_string()),
            graph_status: run.graph_status().as_str().to_string(),
            created_at: run.created_at(),
            started_at: run.started_at(),
            completed_at: run.completed_at(),
            error_message: run.error_message().map(str::to_string),
            result_summary: encode_result(run),
        }
    }
}

impl From<&IngestionRun> for UpdateRunModel {
    fn from(run: &IngestionRun) -> Self {
        Self {
            status: run.status().as_str().to_string(),
            progress: run.progress(),
            task_id: Some(run.task_id().map(str::to_string)),
            namespace: Some(run.namespace().map(|ns| ns.to_string())),
            graph_status: run.graph_status().as_str().to_string(),
            started_at: Some(run.started_at()),
            completed_at: Some(run.completed_at()),
            error_message: Some(run.error_message().map(str::to_string)),
            result_summary: Some(encode_result(run)),
        }
    }
}

impl TryFrom<RunModel> for IngestionRun {
    type Error = String;

    fn try_from(model: RunModel) -> Result<Self, Self::Error> {
        let status = RunStatus::parse(&model.status, model.error_message.as_deref())?;
        let graph_status = GraphStatus::parse(&model.graph_status)?;
        let namespace = model.namespace.map(Namespace::new).transpose()?;
        let result_summary = model
            .result_summary
            .map(serde_json::from_value::<RunResult>)
            .transpose()
            .map_err(|e| format!("Failed to parse result summary: {}", e))?;

        Ok(IngestionRun::from_database(
            model.id,
            model.document_url,
            UrlFingerprint::new(model.url_fingerprint)?,
            model.user_id,
            model.save_to_library,
            status,
            model.progress,
            model.task_id,
            namespace,
            graph_status,
            model.created_at,
            model.started_at,
            model.completed_at,
            model.error_message,
            result_summary,
        ))
    }
}
