use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::application::ports::{CompletionError, CompletionRequest, CompletionService};
use crate::domain::value_objects::DocumentMetadata;

const METADATA_INSTRUCTION: &str = "From the document excerpt below, identify the title, \
the authors, a one or two sentence description, the publication year and an APA style \
in-text citation. Answer with a single JSON object using exactly these keys: title, \
description, authors (a list of names), citations.in_text, year. Use null for any field \
you cannot determine with confidence.

Example:
{\"title\": \"Attention Is All You Need\", \"description\": \"Introduces the Transformer, \
an architecture based solely on attention.\", \"authors\": [\"Vaswani, A.\", \"Shazeer, N.\"], \
\"citations\": {\"in_text\": \"(Vaswani et al., 2017)\"}, \"year\": \"2017\"}

Document excerpt:
";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("Unparseable completion response: {0}")]
    Unparseable(String),
}

impl ExtractionError {
    /// Network and HTTP failures, as opposed to bad model output.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractionError::Completion(CompletionError::NetworkError(_))
                | ExtractionError::Completion(CompletionError::ApiError { .. })
        )
    }
}

/// Asks the completion service for the document's own bibliographic metadata.
pub struct MetadataExtractor {
    completion: Arc<dyn CompletionService>,
    fallback_to_title: bool,
}

impl MetadataExtractor {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            fallback_to_title: false,
        }
    }

    /// On failure, return metadata holding only the heuristic title instead of an error.
    pub fn with_title_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_title = enabled;
        self
    }

    pub async fn extract(
        &self,
        info_excerpt: &str,
        heuristic_title: &str,
    ) -> Result<DocumentMetadata, ExtractionError> {
        if info_excerpt.trim().is_empty() && heuristic_title.trim().is_empty() {
            debug!("no excerpt or title found, metadata stays unknown");
            return Ok(DocumentMetadata::default());
        }

        match self.request_metadata(info_excerpt, heuristic_title).await {
            Ok(metadata) => Ok(metadata),
            Err(e) if self.fallback_to_title => {
                warn!(error = %e, "metadata extraction failed, using heuristic title");
                Ok(DocumentMetadata::from_title(heuristic_title))
            }
            Err(e) => Err(e),
        }
    }

    async fn request_metadata(
        &self,
        info_excerpt: &str,
        heuristic_title: &str,
    ) -> Result<DocumentMetadata, ExtractionError> {
        let mut excerpt = String::new();
        if !heuristic_title.trim().is_empty() {
            excerpt.push_str(heuristic_title.trim());
            excerpt.push('\n');
        }
        excerpt.push_str(info_excerpt.trim());

        let prompt = format!("{}{}", METADATA_INSTRUCTION, excerpt);
        let response = self.completion.complete(CompletionRequest::new(prompt)).await?;

        parse_metadata(&response)
    }
}

/// Parses a JSON object that may be wrapped in a Markdown code fence.
pub fn parse_metadata(response: &str) -> Result<DocumentMetadata, ExtractionError> {
    let body = strip_code_fence(response);
    serde_json::from_str(body).map_err(|e| ExtractionError::Unparseable(e.to_string()))
}

pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
