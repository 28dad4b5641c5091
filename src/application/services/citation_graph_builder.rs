use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info};

use crate::application::ports::{GraphStore, GraphStoreError};
use crate::domain::entities::{
    CitationGraph, CitationGraphPlan, CitedNode, GraphWriteSummary, OriginCitations, OriginNode,
    Reference, SegmentedChunk, TaskNode,
};

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([\d,\s]+)\]").expect("marker pattern is valid"));

/// Orders named by a citation marker such as `[3, 7]`, deduplicated, in
/// first-seen order. Several bracket groups may appear in one marker.
pub fn parse_citation_orders(marker: &str) -> Vec<u32> {
    let mut seen = HashSet::new();
    MARKER
        .captures_iter(marker)
        .filter_map(|caps| caps.get(1))
        .flat_map(|group| group.as_str().split(',').map(str::trim).collect::<Vec<_>>())
        .filter_map(|n| n.parse::<u32>().ok())
        .filter(|n| seen.insert(*n))
        .collect()
}

/// Pure construction of the nodes and edges for one run. Orders without a
/// matching `Cited` node are dropped.
pub fn plan_graph(
    task_id: &str,
    references: &[Reference],
    chunks: &[SegmentedChunk],
) -> CitationGraphPlan {
    let references = Reference::assign_orders(references.to_vec());
    let cited: Vec<CitedNode> = references
        .iter()
        .map(|r| CitedNode {
            order: r.order,
            title: r.title.clone(),
            authors: r.authors_display(),
            year: r.year.clone(),
            url: r.url.clone(),
        })
        .collect();
    let known: HashSet<u32> = cited.iter().map(|c| c.order).collect();

    let mut origins = Vec::new();
    for chunk in chunks {
        let mut seen = HashSet::new();
        let raw_orders: Vec<u32> = chunk
            .segments
            .iter()
            .filter_map(|s| s.citation_marker.as_deref())
            .flat_map(parse_citation_orders)
            .filter(|n| seen.insert(*n))
            .collect();

        if raw_orders.is_empty() {
            continue;
        }

        let (cited_orders, dropped): (Vec<u32>, Vec<u32>) =
            raw_orders.into_iter().partition(|n| known.contains(n));
        if !dropped.is_empty() {
            debug!(chunk_id = %chunk.chunk_id, ?dropped, "citation orders without a reference");
        }

        origins.push(OriginCitations {
            origin: OriginNode {
                chunk_id: chunk.chunk_id.clone(),
                content: chunk.joined_content(),
            },
            cited_orders,
        });
    }

    CitationGraphPlan {
        task: TaskNode {
            task_id: task_id.to_string(),
        },
        cited,
        origins,
    }
}

pub struct CitationGraphBuilder {
    graph_store: Arc<dyn GraphStore>,
}

impl CitationGraphBuilder {
    pub fn new(graph_store: Arc<dyn GraphStore>) -> Self {
        Self { graph_store }
    }

    pub async fn build(
        &self,
        task_id: &str,
        references: &[Reference],
        chunks: &[SegmentedChunk],
    ) -> Result<GraphWriteSummary, GraphStoreError> {
        let plan = plan_graph(task_id, references, chunks);
        debug_assert!(plan.edge_targets_exist(), "citation edge without a cited node");
        let summary = self.graph_store.write_plan(&plan).await?;

        info!(
            task_id,
            cited = summary.cited_nodes,
            origins = summary.origin_nodes,
            edges = summary.cited_edges,
            "citation graph written"
        );
        Ok(summary)
    }

    pub async fn get_graph(&self, task_id: &str) -> Result<CitationGraph, GraphStoreError> {
        let fragments = self.graph_store.fetch_run_graph(task_id).await?;
        Ok(CitationGraph::from_fragments(fragments))
    }

    pub async fn delete_run(&self, task_id: &str) -> Result<(), GraphStoreError> {
        self.graph_store.delete_run(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_doubles::{InMemoryGraphStore, cited_chunk, reference};
    use crate::domain::entities::citation_graph::{CITED_LABEL, ORIGIN_LABEL, TASK_LABEL};

    #[test]
    fn test_parse_citation_orders() {
        assert_eq!(parse_citation_orders("[3, 7]"), vec![3, 7]);
        assert_eq!(parse_citation_orders("[2,4]"), vec![2, 4]);
        assert_eq!(parse_citation_orders("see [1] and [1, 5]"), vec![1, 5]);
        assert!(parse_citation_orders("[a]").is_empty());
        assert!(parse_citation_orders("no markers").is_empty());
    }

    #[test]
    fn test_out_of_range_orders_are_dropped() {
        let references = vec![reference("A"), reference("B"), reference("C")];
        let chunks = vec![cited_chunk("c1", &["[2,4]"])];

        let plan = plan_graph("task-1", &references, &chunks);

        let orders: Vec<u32> = plan.cited.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(plan.origins.len(), 1);
        assert_eq!(plan.origins[0].cited_orders, vec![2]);
        assert!(plan.edge_targets_exist());
    }

    #[test]
    fn test_edge_targets_always_exist() {
        let marker_sets: [&[&str]; 4] = [&["[1]"], &["[0, 99]"], &["[1,2,3]", "[3]"], &[]];
        for n in 0..5 {
            let references: Vec<Reference> = (0..n).map(|i| reference(&format!("r{}", i))).collect();
            let chunks: Vec<SegmentedChunk> = marker_sets
                .iter()
                .enumerate()
                .map(|(i, markers)| cited_chunk(&format!("c{}", i), markers))
                .collect();

            let plan = plan_graph("t", &references, &chunks);
            assert!(plan.edge_targets_exist(), "dangling edge with {} references", n);
        }
    }

    #[test]
    fn test_chunks_without_markers_have_no_origin() {
        let plan = plan_graph("t", &[reference("A")], &[cited_chunk("c1", &[])]);

        assert!(plan.origins.is_empty());
        assert_eq!(plan.cited.len(), 1);
    }

    #[test]
    fn test_orders_within_a_chunk_are_deduplicated() {
        let references = vec![reference("A"), reference("B")];
        let plan = plan_graph("t", &references, &[cited_chunk("c1", &["[1, 2]", "[2]"])]);

        assert_eq!(plan.origins[0].cited_orders, vec![1, 2]);
        assert_eq!(plan.edge_count(), 2);
    }

    #[tokio::test]
    async fn test_build_and_read_back() {
        let store = Arc::new(InMemoryGraphStore::default());
        let builder = CitationGraphBuilder::new(store.clone());

        let summary = builder
            .build(
                "task-9",
                &[reference("A"), reference("B")],
                &[cited_chunk("c1", &["[1]"]), cited_chunk("c2", &["[1, 2]"])],
            )
            .await
            .unwrap();

        assert_eq!(summary.origin_nodes, 2);
        assert_eq!(summary.cited_edges, 3);

        let graph = builder.get_graph("task-9").await.unwrap();
        assert_eq!(graph.nodes_with_label(TASK_LABEL).count(), 1);
        assert_eq!(graph.nodes_with_label(ORIGIN_LABEL).count(), 2);
        assert_eq!(graph.nodes_with_label(CITED_LABEL).count(), 2);
        assert_eq!(graph.links.len(), 5);

        assert!(builder.get_graph("other").await.unwrap().is_empty());
    }
}
