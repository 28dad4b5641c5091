use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BoundingBox, PageSize};

/// Layout role assigned to a segment by the segmentation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentType {
    Title,
    SectionHeader,
    Text,
    ListItem,
    Table,
    Picture,
    Caption,
    Formula,
    Footnote,
    PageHeader,
    PageFooter,
    Page,
    Other(String),
}

impl SegmentType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Title" => SegmentType::Title,
            "SectionHeader" => SegmentType::SectionHeader,
            "Text" => SegmentType::Text,
            "ListItem" => SegmentType::ListItem,
            "Table" => SegmentType::Table,
            "Picture" => SegmentType::Picture,
            "Caption" => SegmentType::Caption,
            "Formula" => SegmentType::Formula,
            "Footnote" => SegmentType::Footnote,
            "PageHeader" => SegmentType::PageHeader,
            "PageFooter" => SegmentType::PageFooter,
            "Page" => SegmentType::Page,
            other => SegmentType::Other(other.to_string()),
        }
    }

    pub fn is_page_furniture(&self) -> bool {
        matches!(self, SegmentType::PageHeader | SegmentType::PageFooter)
    }
}

/// Atomic OCR output unit. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: String,
    pub bbox: BoundingBox,
    pub page_number: Option<i32>,
    pub page_size: Option<PageSize>,
    pub segment_type: SegmentType,
    pub content: String,
    pub confidence: Option<f64>,
    /// Inline citation annotation such as `[3, 7]`.
    pub citation_marker: Option<String>,
}

/// One chunk as returned by the segmentation service, before aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedChunk {
    pub chunk_id: String,
    /// Embeddable text prepared by the segmentation service.
    pub embed: String,
    pub segments: Vec<Segment>,
}

impl SegmentedChunk {
    /// Segment contents joined with single spaces.
    pub fn joined_content(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.content.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
