use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::application::ports::segmentation_service::SegmentationJobState;
use crate::application::ports::{SegmentationError, SegmentationJobStatus, SegmentationService};
use crate::domain::entities::{Segment, SegmentType, SegmentedChunk};
use crate::domain::value_objects::{BoundingBox, PageSize};

#[derive(Debug, Clone)]
pub struct ChunkrClientConfig {
    pub api_url: String,
    pub api_key: String,
    pub target_chunk_length: u32,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    file: &'a str,
    chunk_processing: ChunkProcessing,
}

#[derive(Serialize)]
struct ChunkProcessing {
    target_length: u32,
}

#[derive(Deserialize)]
struct ParseResponse {
    task_id: String,
}

#[derive(Deserialize)]
struct TaskResponse {
    task_id: String,
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    output: Option<TaskOutput>,
}

#[derive(Deserialize)]
struct TaskOutput {
    #[serde(default)]
    chunks: Vec<WireChunk>,
}

#[derive(Deserialize)]
struct WireChunk {
    chunk_id: String,
    #[serde(default)]
    embed: Option<String>,
    #[serde(default)]
    segments: Vec<WireSegment>,
}

#[derive(Deserialize)]
struct WireBbox {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct WireSegment {
    #[serde(default)]
    segment_id: String,
    bbox: WireBbox,
    #[serde(default)]
    page_number: Option<i32>,
    #[serde(default)]
    page_width: Option<f64>,
    #[serde(default)]
    page_height: Option<f64>,
    #[serde(default)]
    segment_type: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    citation: Option<String>,
}

impl From<WireSegment> for Segment {
    fn from(wire: WireSegment) -> Self {
        let page_size = match (wire.page_width, wire.page_height) {
            (Some(page_width), Some(page_height)) => Some(PageSize {
                page_width,
                page_height,
            }),
            _ => None,
        };

        Segment {
            segment_id: wire.segment_id,
            bbox: BoundingBox::new(wire.bbox.left, wire.bbox.top, wire.bbox.width, wire.bbox.height),
            page_number: wire.page_number,
            page_size,
            segment_type: SegmentType::from_tag(&wire.segment_type),
            content: wire.content,
            confidence: wire.confidence,
            citation_marker: wire.citation.filter(|c| !c.trim().is_empty()),
        }
    }
}

impl From<WireChunk> for SegmentedChunk {
    fn from(wire: WireChunk) -> Self {
        SegmentedChunk {
            chunk_id: wire.chunk_id,
            embed: wire.embed.unwrap_or_default(),
            segments: wire.segments.into_iter().map(Segment::from).collect(),
        }
    }
}

/// Chunkr task API: `POST /task/parse` to submit, `GET /task/{id}` to poll.
pub struct ChunkrClient {
    client: Client,
    config: ChunkrClientConfig,
}

impl ChunkrClient {
    pub fn new(config: ChunkrClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }
}

async fn api_error(response: reqwest::Response) -> SegmentationError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    SegmentationError::ApiError {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl SegmentationService for ChunkrClient {
    async fn submit(&self, document_url: &str) -> Result<String, SegmentationError> {
        let body = ParseRequest {
            file: document_url,
            chunk_processing: ChunkProcessing {
                target_length: self.config.target_chunk_length,
            },
        };

        let response = self
            .client
            .post(self.url("task/parse"))
            .header("Authorization", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SegmentationError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: ParseResponse = response
            .json()
            .await
            .map_err(|e| SegmentationError::ParseError(e.to_string()))?;

        debug!(task_id = %parsed.task_id, "segmentation task submitted");
        Ok(parsed.task_id)
    }

    async fn poll(&self, task_id: &str) -> Result<SegmentationJobStatus, SegmentationError> {
        let response = self
            .client
            .get(self.url(&format!("task/{}", task_id)))
            .header("Authorization", &self.config.api_key)
            .send()
            .await
            .map_err(|e| SegmentationError::NetworkError(e.without_url().to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SegmentationError::JobFailed {
                task_id: task_id.to_string(),
                message: "task not found".to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let task: TaskResponse = response
            .json()
            .await
            .map_err(|e| SegmentationError::ParseError(e.to_string()))?;

        Ok(to_status(task))
    }
}

fn to_status(task: TaskResponse) -> SegmentationJobStatus {
    SegmentationJobStatus {
        task_id: task.task_id,
        state: SegmentationJobState::from_wire(&task.status),
        message: task.message,
        chunks: task
            .output
            .map(|o| o.chunks.into_iter().map(SegmentedChunk::from).collect())
            .unwrap_or_default(),
    }
}
