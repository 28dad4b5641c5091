use std::sync::Arc;

use crate::application::ports::GraphStoreError;
use crate::application::services::CitationGraphBuilder;
use crate::domain::entities::CitationGraph;

#[derive(Debug)]
pub enum GetCitationGraphError {
    GraphDisabled,
    NotFound(String),
    StoreError(String),
}

impl std::fmt::Display for GetCitationGraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetCitationGraphError::GraphDisabled => write!(f, "Citation graph is disabled"),
            GetCitationGraphError::NotFound(task_id) => {
                write!(f, "No citation graph for task {}", task_id)
            }
            GetCitationGraphError::StoreError(msg) => write!(f, "Graph store error: {}", msg),
        }
    }
}

impl std::error::Error for GetCitationGraphError {}

impl From<GraphStoreError> for GetCitationGraphError {
    fn from(error: GraphStoreError) -> Self {
        GetCitationGraphError::StoreError(error.to_string())
    }
}

pub struct GetCitationGraphUseCase {
    graph_builder: Option<Arc<CitationGraphBuilder>>,
}

impl GetCitationGraphUseCase {
    pub fn new(graph_builder: Option<Arc<CitationGraphBuilder>>) -> Self {
        Self { graph_builder }
    }

    pub async fn execute(&self, task_id: &str) -> Result<CitationGraph, GetCitationGraphError> {
        let builder = self
            .graph_builder
            .as_ref()
            .ok_or(GetCitationGraphError::GraphDisabled)?;

        let graph = builder.get_graph(task_id).await?;
        if graph.is_empty() {
            return Err(GetCitationGraphError::NotFound(task_id.to_string()));
        }
        Ok(graph)
    }
}
