use std::collections::HashMap;
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::domain::entities::{Segment, SegmentType, SegmentedChunk};
use crate::domain::value_objects::{BoundingBox, PageDimensions};

pub const DEFAULT_TEXT_BYTE_BUDGET: usize = 20_000;
pub const DEFAULT_TITLE_SCAN_LIMIT: usize = 15;
/// Reserved by the vector index as a record separator.
pub const DEFAULT_RESERVED_DELIMITERS: &[char] = &['\0'];

const SAFETY_MARGIN: f64 = 0.95;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\d{4}|(?:\d{1,2}\s)?(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s?\d{4})",
    )
    .expect("date pattern is valid")
});

#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("Chunk {0} has no segments")]
    EmptyChunk(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedChunk {
    pub chunk_id: String,
    pub text: String,
    pub bbox: BoundingBox,
    pub page: i32,
}

/// Heuristic title and info excerpt taken from the first chunks of a document.
/// Empty strings mean "unknown".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleExcerpt {
    pub title: String,
    pub info: String,
}

#[derive(Debug, Clone, Default)]
pub struct AggregationOutput {
    pub chunks: Vec<AggregatedChunk>,
    pub title_excerpt: TitleExcerpt,
    pub page_dimensions: PageDimensions,
    /// Chunks whose text was empty after sanitising.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct SegmentAggregator {
    byte_budget: usize,
    reserved_delimiters: Vec<char>,
    title_scan_limit: usize,
}

impl Default for SegmentAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_BYTE_BUDGET)
    }
}

impl SegmentAggregator {
    pub fn new(byte_budget: usize) -> Self {
        Self {
            byte_budget,
            reserved_delimiters: DEFAULT_RESERVED_DELIMITERS.to_vec(),
            title_scan_limit: DEFAULT_TITLE_SCAN_LIMIT,
        }
    }

    pub fn aggregate(&self, chunks: &[SegmentedChunk]) -> Result<AggregationOutput, AggregationError> {
        let aggregated = chunks
            .par_iter()
            .map(|chunk| self.aggregate_chunk(chunk))
            .collect::<Result<Vec<_>, _>>()?;

        let total = aggregated.len();
        let chunks_out: Vec<AggregatedChunk> = aggregated.into_iter().flatten().collect();
        let dropped = total - chunks_out.len();
        if dropped > 0 {
            debug!(dropped, "dropped chunks with empty text");
        }

        Ok(AggregationOutput {
            chunks: chunks_out,
            title_excerpt: self.extract_title_and_excerpt(chunks),
            page_dimensions: page_dimensions(chunks),
            dropped,
        })
    }

    /// `Ok(None)` when the chunk's text is empty after sanitising.
    fn aggregate_chunk(
        &self,
        chunk: &SegmentedChunk,
    ) -> Result<Option<AggregatedChunk>, AggregationError> {
        let bbox = aggregate_bbox(&chunk.segments)
            .ok_or_else(|| AggregationError::EmptyChunk(chunk.chunk_id.clone()))?;

        let raw = if chunk.embed.trim().is_empty() {
            chunk.joined_content()
        } else {
            chunk.embed.clone()
        };

        let text = self.sanitize_text(&raw);
        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(AggregatedChunk {
            chunk_id: chunk.chunk_id.clone(),
            text,
            bbox,
            page: assign_page(&chunk.segments),
        }))
    }

    /// Strips reserved delimiters, then cuts the text to fit the byte budget.
    /// The result is always a prefix of the stripped input.
    pub fn sanitize_text(&self, raw: &str) -> String {
        let stripped: String = raw
            .chars()
            .filter(|c| !self.reserved_delimiters.contains(c))
            .collect();

        truncate_to_budget(stripped, self.byte_budget)
    }

    pub fn extract_title_and_excerpt(&self, chunks: &[SegmentedChunk]) -> TitleExcerpt {
        let mut title: Option<&str> = None;
        let mut info: Vec<&str> = Vec::new();

        for chunk in chunks.iter().take(self.title_scan_limit) {
            for segment in &chunk.segments {
                if segment.segment_type == SegmentType::Title {
                    if title.is_none() {
                        title = Some(segment.content.trim());
                    }
                } else if segment.segment_type.is_page_furniture()
                    || DATE_PATTERN.is_match(&segment.content)
                {
                    info.push(segment.content.trim());
                    // one info segment per chunk
                    break;
                }
            }
        }

        TitleExcerpt {
            title: title.unwrap_or_default().to_string(),
            info: info
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Minimal axis-aligned box covering every segment of a chunk.
pub fn aggregate_bbox(segments: &[Segment]) -> Option<BoundingBox> {
    BoundingBox::covering(segments.iter().map(|s| &s.bbox))
}

/// Majority vote over segment pages; the first page to reach the winning
/// count wins ties. Pages below 1 do not vote. Defaults to page 1.
pub fn assign_page(segments: &[Segment]) -> i32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    let mut best_page = 1;
    let mut best_count = 0;

    for page in segments
        .iter()
        .filter_map(|s| s.page_number)
        .filter(|&page| page > 0)
    {
        let count = counts.entry(page).or_insert(0);
        *count += 1;
        if *count > best_count {
            best_count = *count;
            best_page = page;
        }
    }

    best_page
}

/// Page number to page size, taken from the first segment seen on each page.
pub fn page_dimensions(chunks: &[SegmentedChunk]) -> PageDimensions {
    let mut dimensions = PageDimensions::new();
    for segment in chunks.iter().flat_map(|c| c.segments.iter()) {
        if let (Some(page), Some(size)) = (segment.page_number, segment.page_size) {
            dimensions.record(page, size);
        }
    }
    dimensions
}

fn truncate_to_budget(text: String, byte_budget: usize) -> String {
    let byte_len = text.len();
    if byte_len <= byte_budget {
        return text;
    }

    let char_count = text.chars().count();
    let ratio = byte_budget as f64 / byte_len as f64;
    let cutoff_chars = (char_count as f64 * ratio * SAFETY_MARGIN).floor() as usize;

    let mut end = text
        .char_indices()
        .nth(cutoff_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(byte_len)
        .min(byte_budget);
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    text[..end].to_string()
}
