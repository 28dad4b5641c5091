use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const TASK_LABEL: &str = "Task";
pub const ORIGIN_LABEL: &str = "Origin";
pub const CITED_LABEL: &str = "Cited";

/// One node per ingestion run, keyed by the segmentation job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub task_id: String,
}

/// A chunk that carries at least one citation marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginNode {
    pub chunk_id: String,
    pub content: String,
}

/// One bibliography entry of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedNode {
    pub order: u32,
    pub title: String,
    pub authors: String,
    pub year: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginCitations {
    pub origin: OriginNode,
    /// Orders of the `Cited` nodes this origin links to; all exist in the plan.
    pub cited_orders: Vec<u32>,
}

/// Everything the graph store must create for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationGraphPlan {
    pub task: TaskNode,
    pub cited: Vec<CitedNode>,
    pub origins: Vec<OriginCitations>,
}

impl CitationGraphPlan {
    pub fn edge_count(&self) -> usize {
        self.origins.iter().map(|o| o.cited_orders.len()).sum()
    }

    /// True when every CITED edge points at a `Cited` node of this plan.
    pub fn edge_targets_exist(&self) -> bool {
        let orders: HashSet<u32> = self.cited.iter().map(|c| c.order).collect();
        self.origins
            .iter()
            .flat_map(|o| o.cited_orders.iter())
            .all(|order| orders.contains(order))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphWriteSummary {
    pub cited_nodes: usize,
    pub origin_nodes: usize,
    pub cited_edges: usize,
}

/// Node as read back from the graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl GraphNode {
    pub fn primary_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Stable serialisation of every attribute; equal keys mean equal nodes.
    fn identity_key(&self) -> String {
        let properties: BTreeMap<&String, &serde_json::Value> = self.properties.iter().collect();
        let mut labels = self.labels.clone();
        labels.sort();

        serde_json::json!({
            "id": self.id,
            "labels": labels,
            "properties": properties,
        })
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub id: String,
    pub source: String,
    pub target: String,
    pub link_type: String,
}

/// Raw result of one read query; fragments may overlap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphFragment {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl CitationGraph {
    /// Merges fragments, keeping first-seen order and dropping duplicate nodes and links.
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = GraphFragment>,
    {
        let mut seen_nodes = HashSet::new();
        let mut seen_links = HashSet::new();
        let mut graph = CitationGraph::default();

        for fragment in fragments {
            for node in fragment.nodes {
                if seen_nodes.insert(node.identity_key()) {
                    graph.nodes.push(node);
                }
            }
            for link in fragment.links {
                let key = (
                    link.id.clone(),
                    link.source.clone(),
                    link.target.clone(),
                    link.link_type.clone(),
                );
                if seen_links.insert(key) {
                    graph.links.push(link);
                }
            }
        }

        graph
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
impl CitationGraph {
    pub fn nodes_with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.labels.iter().any(|l| l == label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, label: &str, props: serde_json::Value) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            labels: vec![label.to_string()],
            properties: props.as_object().cloned().unwrap_or_default(),
        }
    }

    fn link(id: &str, source: &str, target: &str, link_type: &str) -> GraphLink {
        GraphLink {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            link_type: link_type.to_string(),
        }
    }

    #[test]
    fn test_merge_deduplicates_identical_nodes() {
        let task = node("n0", TASK_LABEL, serde_json::json!({"task_id": "t1"}));
        let cited = node("n2", CITED_LABEL, serde_json::json!({"order": 1, "title": "A"}));

        let graph = CitationGraph::from_fragments(vec![
            GraphFragment {
                nodes: vec![task.clone(), node("n1", ORIGIN_LABEL, serde_json::json!({}))],
                links: vec![link("r0", "n0", "n1", "HAS_ORIGIN")],
            },
            GraphFragment {
                nodes: vec![task.clone(), cited.clone()],
                links: vec![link("r0", "n0", "n1", "HAS_ORIGIN"), link("r1", "n1", "n2", "CITED")],
            },
            GraphFragment {
                nodes: vec![cited],
                links: Vec::new(),
            },
        ]);

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.links.len(), 2);
        assert_eq!(graph.nodes_with_label(CITED_LABEL).count(), 1);
    }

    #[test]
    fn test_nodes_differing_in_any_field_are_kept() {
        let a = node("n1", CITED_LABEL, serde_json::json!({"order": 1, "title": "A"}));
        let b = node("n1", CITED_LABEL, serde_json::json!({"order": 1, "title": "B"}));

        let graph = CitationGraph::from_fragments(vec![GraphFragment {
            nodes: vec![a, b],
            links: Vec::new(),
        }]);

        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_plan_edge_target_check() {
        let mut plan = CitationGraphPlan {
            task: TaskNode { task_id: "t".to_string() },
            cited: vec![CitedNode {
                order: 1,
                title: "A".to_string(),
                authors: String::new(),
                year: None,
                url: None,
            }],
            origins: vec![OriginCitations {
                origin: OriginNode {
                    chunk_id: "c".to_string(),
                    content: "text".to_string(),
                },
                cited_orders: vec![1],
            }],
        };

        assert!(plan.edge_targets_exist());
        assert_eq!(plan.edge_count(), 1);

        plan.origins[0].cited_orders.push(5);
        assert!(!plan.edge_targets_exist());
    }
}
