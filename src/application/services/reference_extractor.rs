use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::ports::{CompletionRequest, CompletionService, OutputSchema};
use crate::application::services::metadata_extractor::ExtractionError;
use crate::domain::entities::{Reference, SegmentedChunk};

const FALLBACK_CHUNK_COUNT: usize = 3;

const REFERENCE_INSTRUCTION: &str = "Extract every bibliography entry from the academic \
paper content supplied by the user. Return a JSON object with a single key \"references\" \
holding a list of objects, in the order they appear, each shaped like:
{\"title\": \"Attention Is All You Need\", \"authors\": [\"Vaswani, A.\", \"Shazeer, N.\"], \
\"year\": \"2017\", \"url\": \"https://arxiv.org/abs/1706.03762\"}
Use null for a missing year and an empty string when no url is given.";

static SECTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)references").expect("start pattern is valid"));
static SECTION_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bibliograph|appendix").expect("end pattern is valid"));

#[derive(Debug, Deserialize)]
struct ReferenceList {
    #[serde(default)]
    references: Vec<Reference>,
}

pub fn reference_schema() -> OutputSchema {
    OutputSchema {
        name: "references".to_string(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "references": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "authors": { "type": "array", "items": { "type": "string" } },
                            "year": { "type": ["string", "null"] },
                            "url": { "type": "string" }
                        },
                        "required": ["title", "authors", "year", "url"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["references"],
            "additionalProperties": false
        }),
    }
}

/// Locates the bibliography and turns it into an ordered reference list.
pub struct ReferenceExtractor {
    completion: Arc<dyn CompletionService>,
}

impl ReferenceExtractor {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn extract(&self, chunks: &[SegmentedChunk]) -> Result<Vec<Reference>, ExtractionError> {
        let section = locate_reference_section(chunks);
        if section.trim().is_empty() {
            debug!("no reference text to extract from");
            return Ok(Vec::new());
        }

        let request = CompletionRequest::new(section).with_system(REFERENCE_INSTRUCTION);
        let value = self
            .completion
            .complete_structured(request, &reference_schema())
            .await?;

        let list: ReferenceList = serde_json::from_value(value)
            .map_err(|e| ExtractionError::Unparseable(e.to_string()))?;

        let references = Reference::assign_orders(list.references);
        info!(count = references.len(), "extracted references");
        Ok(references)
    }
}

/// Text from the first segment mentioning "references" up to, not including,
/// the first segment mentioning a bibliography or appendix. A stop segment ends
/// the scan even before a start was seen. Without a start, the last three
/// chunks are used instead.
pub fn locate_reference_section(chunks: &[SegmentedChunk]) -> String {
    let mut collected: Vec<&str> = Vec::new();
    let mut found = false;

    'scan: for chunk in chunks {
        for segment in &chunk.segments {
            let content = segment.content.as_str();
            if SECTION_END.is_match(content) {
                break 'scan;
            }
            if found || SECTION_START.is_match(content) {
                found = true;
                collected.push(content);
            }
        }
    }

    if collected.is_empty() {
        let start = chunks.len().saturating_sub(FALLBACK_CHUNK_COUNT);
        collected = chunks[start..]
            .iter()
            .flat_map(|c| c.segments.iter().map(|s| s.content.as_str()))
            .collect();
    }

    collected.join("\n")
}
