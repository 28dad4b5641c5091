pub mod chunk;
pub mod citation_graph;
pub mod document;
pub mod ingestion_run;
pub mod library_entry;
pub mod reference;
pub mod segment;

pub use chunk::Chunk;
pub use citation_graph::{
    CitationGraph, CitationGraphPlan, CitedNode, GraphFragment, GraphLink, GraphNode,
    GraphWriteSummary, OriginCitations, OriginNode, TaskNode,
};
pub use document::DocumentRecord;
pub use ingestion_run::{IngestionRun, RunResult};
pub use library_entry::LibraryEntry;
pub use reference::Reference;
pub use segment::{Segment, SegmentType, SegmentedChunk};
