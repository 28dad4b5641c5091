use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CitationGraphPlan, GraphFragment, GraphWriteSummary};

#[derive(Debug, Error)]
pub enum GraphStoreError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Query error {code}: {message}")]
    QueryError { code: String, message: String },
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Creates the plan's nodes and relationships in a single transaction.
    async fn write_plan(
        &self,
        plan: &CitationGraphPlan,
    ) -> Result<GraphWriteSummary, GraphStoreError>;

    /// Everything reachable from the run's `Task` node; fragments may overlap.
    async fn fetch_run_graph(&self, task_id: &str) -> Result<Vec<GraphFragment>, GraphStoreError>;

    async fn delete_run(&self, task_id: &str) -> Result<(), GraphStoreError>;
}
