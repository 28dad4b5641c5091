use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::application::ports::{GraphStore, GraphStoreError};
use crate::domain::entities::{
    CitationGraphPlan, GraphFragment, GraphLink, GraphNode, GraphWriteSummary,
};

const CREATE_TASK: &str = "CREATE (:Task {task_id: $task_id})";

const CREATE_CITED: &str = "UNWIND $cited AS c \
     CREATE (:Cited {task_id: $task_id, order: c.order, title: c.title, \
     authors: c.authors, year: c.year, url: c.url})";

const CREATE_ORIGINS: &str = "MATCH (t:Task {task_id: $task_id}) \
     UNWIND $origins AS o \
     CREATE (t)-[:HAS_ORIGIN]->(g:Origin {task_id: $task_id, chunk_id: o.chunk_id, content: o.content}) \
     WITH g, o UNWIND o.cited_orders AS ord \
     MATCH (c:Cited {task_id: $task_id, order: ord}) \
     CREATE (g)-[:CITED]->(c)";

// Cited nodes only appear as relationship targets, never as sources.
const FETCH_RUN: &str = "MATCH (n {task_id: $task_id}) \
     OPTIONAL MATCH (n)-[r]->(m) \
     WHERE NOT (n:Cited AND r IS NOT NULL) \
     RETURN n, r, m";

const DELETE_RUN: &str = "MATCH (n {task_id: $task_id}) DETACH DELETE n";

#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub http_url: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
struct Statement {
    statement: &'static str,
    parameters: serde_json::Value,
    #[serde(rename = "resultDataContents", skip_serializing_if = "Option::is_none")]
    result_data_contents: Option<[&'static str; 1]>,
}

impl Statement {
    fn new(statement: &'static str, parameters: serde_json::Value) -> Self {
        Self {
            statement,
            parameters,
            result_data_contents: None,
        }
    }

    fn graph(statement: &'static str, parameters: serde_json::Value) -> Self {
        Self {
            statement,
            parameters,
            result_data_contents: Some(["graph"]),
        }
    }
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

#[derive(Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    #[serde(default)]
    graph: Option<TxGraph>,
}

#[derive(Deserialize)]
struct TxGraph {
    #[serde(default)]
    nodes: Vec<TxNode>,
    #[serde(default)]
    relationships: Vec<TxRelationship>,
}

#[derive(Deserialize)]
struct TxNode {
    id: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct TxRelationship {
    id: String,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(rename = "startNode")]
    start_node: String,
    #[serde(rename = "endNode")]
    end_node: String,
}

/// Neo4j over the HTTP transactional endpoint. Every call is a single
/// auto-committed transaction.
pub struct Neo4jGraphStore {
    client: Client,
    config: Neo4jConfig,
}

impl Neo4jGraphStore {
    pub fn new(config: Neo4jConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    async fn commit(&self, statements: Vec<Statement>) -> Result<TxResponse, GraphStoreError> {
        let url = format!(
            "{}/db/{}/tx/commit",
            self.config.http_url.trim_end_matches('/'),
            self.config.database
        );

        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&json!({ "statements": statements }))
            .send()
            .await
            .map_err(|e| GraphStoreError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraphStoreError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: TxResponse = response
            .json()
            .await
            .map_err(|e| GraphStoreError::ParseError(e.to_string()))?;

        check_errors(parsed)
    }
}

fn check_errors(mut response: TxResponse) -> Result<TxResponse, GraphStoreError> {
    if response.errors.is_empty() {
        return Ok(response);
    }
    let error = response.errors.swap_remove(0);
    Err(GraphStoreError::QueryError {
        code: error.code,
        message: error.message,
    })
}

/// One fragment per returned row.
fn to_fragments(response: TxResponse) -> Vec<GraphFragment> {
    response
        .results
        .into_iter()
        .flat_map(|result| result.data)
        .filter_map(|row| row.graph)
        .map(|graph| GraphFragment {
            nodes: graph
                .nodes
                .into_iter()
                .map(|n| GraphNode {
                    id: n.id,
                    labels: n.labels,
                    properties: n.properties,
                })
                .collect(),
            links: graph
                .relationships
                .into_iter()
                .map(|r| GraphLink {
                    id: r.id,
                    source: r.start_node,
                    target: r.end_node,
                    link_type: r.rel_type,
                })
                .collect(),
        })
        .collect()
}

fn plan_parameters(plan: &CitationGraphPlan) -> (serde_json::Value, serde_json::Value) {
    let cited: Vec<serde_json::Value> = plan
        .cited
        .iter()
        .map(|c| {
            json!({
                "order": c.order,
                "title": c.title,
                "authors": c.authors,
                "year": c.year,
                "url": c.url,
            })
        })
        .collect();
    let origins: Vec<serde_json::Value> = plan
        .origins
        .iter()
        .map(|o| {
            json!({
                "chunk_id": o.origin.chunk_id,
                "content": o.origin.content,
                "cited_orders": o.cited_orders,
            })
        })
        .collect();

    (
        json!({ "task_id": plan.task.task_id, "cited": cited }),
        json!({ "task_id": plan.task.task_id, "origins": origins }),
    )
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn write_plan(
        &self,
        plan: &CitationGraphPlan,
    ) -> Result<GraphWriteSummary, GraphStoreError> {
        let (cited_params, origin_params) = plan_parameters(plan);
        let statements = vec![
            Statement::new(CREATE_TASK, json!({ "task_id": plan.task.task_id })),
            Statement::new(CREATE_CITED, cited_params),
            Statement::new(CREATE_ORIGINS, origin_params),
        ];

        self.commit(statements).await?;

        let summary = GraphWriteSummary {
            cited_nodes: plan.cited.len(),
            origin_nodes: plan.origins.len(),
            cited_edges: plan.edge_count(),
        };
        debug!(task_id = %plan.task.task_id, ?summary, "citation graph written");
        Ok(summary)
    }

    async fn fetch_run_graph(&self, task_id: &str) -> Result<Vec<GraphFragment>, GraphStoreError> {
        let response = self
            .commit(vec![Statement::graph(FETCH_RUN, json!({ "task_id": task_id }))])
            .await?;

        Ok(to_fragments(response))
    }

    async fn delete_run(&self, task_id: &str) -> Result<(), GraphStoreError> {
        self.commit(vec![Statement::new(DELETE_RUN, json!({ "task_id": task_id }))])
            .await?;
        Ok(())
    }
}
