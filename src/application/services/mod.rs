pub mod citation_graph_builder;
pub mod ingestion_orchestrator;
pub mod metadata_extractor;
pub mod reconciliation;
pub mod reference_extractor;
pub mod retry;
pub mod segment_aggregator;

#[cfg(test)]
pub mod test_doubles;

pub use citation_graph_builder::CitationGraphBuilder;
pub use ingestion_orchestrator::{
    GraphFailurePolicy, IngestionError, IngestionObserver, IngestionOrchestrator,
    IngestionOutcome, IngestionPorts, IngestionRequest, IngestionSettings, IngestionStage,
};
pub use metadata_extractor::MetadataExtractor;
pub use reconciliation::{ReconciliationReport, ReconciliationService};
pub use reference_extractor::ReferenceExtractor;
pub use retry::RetryPolicy;
pub use segment_aggregator::SegmentAggregator;
