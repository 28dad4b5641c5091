use serde::{Deserialize, Serialize};

use crate::domain::entities::citation_graph::{CITED_LABEL, ORIGIN_LABEL, TASK_LABEL};
use crate::domain::entities::{CitationGraph, GraphLink, GraphNode};

const TASK_COLOR: &str = "#daed97";
const ORIGIN_COLOR: &str = "#c0ddbf";
const CITED_COLOR: &str = "#ff9fd0";
const DEFAULT_COLOR: &str = "#f5f5f5";

pub fn node_color(label: Option<&str>) -> &'static str {
    match label {
        Some(TASK_LABEL) => TASK_COLOR,
        Some(ORIGIN_LABEL) => ORIGIN_COLOR,
        Some(CITED_LABEL) => CITED_COLOR,
        _ => DEFAULT_COLOR,
    }
}

#[derive(Debug, Serialize)]
pub struct GraphNodeDto {
    pub id: String,
    pub label: Option<String>,
    pub color: &'static str,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct GraphLinkDto {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
}

/// Force-graph friendly shape: `nodes` plus `links` keyed by node id.
#[derive(Debug, Serialize)]
pub struct CitationGraphDto {
    pub task_id: String,
    pub nodes: Vec<GraphNodeDto>,
    pub links: Vec<GraphLinkDto>,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileQuery {
    pub namespace: Option<String>,
}

impl From<GraphNode> for GraphNodeDto {
    fn from(node: GraphNode) -> Self {
        let label = node.primary_label().map(str::to_string);
        Self {
            id: node.id,
            color: node_color(label.as_deref()),
            label,
            properties: node.properties,
        }
    }
}

impl From<GraphLink> for GraphLinkDto {
    fn from(link: GraphLink) -> Self {
        Self {
            id: link.id,
            source: link.source,
            target: link.target,
            label: link.link_type,
        }
    }
}

impl CitationGraphDto {
    pub fn new(task_id: String, graph: CitationGraph) -> Self {
        Self {
            task_id,
            nodes: graph.nodes.into_iter().map(GraphNodeDto::from).collect(),
            links: graph.links.into_iter().map(GraphLinkDto::from).collect(),
        }
    }
}
