use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::delete_document::DeleteDocumentResponse;
use crate::application::use_cases::list_documents::ChunkPage;
use crate::domain::entities::{Chunk, DocumentRecord};
use crate::domain::value_objects::{BoundingBox, PageDimensions};

#[derive(Debug, Deserialize)]
pub struct PaginationDto {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UserDocumentsQuery {
    pub user_id: String,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentLookupQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentDto {
    pub id: Uuid,
    pub user_id: String,
    pub namespace: String,
    pub title: String,
    pub description: String,
    pub file_url: String,
    pub page_dimensions: PageDimensions,
    pub task_id: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ChunkDto {
    pub id: String,
    pub text: String,
    pub bbox: BoundingBox,
    pub page: i32,
    pub word_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ChunkPageDto {
    pub namespace: String,
    pub chunks: Vec<ChunkDto>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteDocumentResponseDto {
    pub document_id: Uuid,
    pub namespace: String,
    pub chunk_rows_deleted: i64,
}

impl From<DocumentRecord> for DocumentDto {
    fn from(document: DocumentRecord) -> Self {
        Self {
            id: document.id(),
            user_id: document.user_id().to_string(),
            namespace: document.namespace().to_string(),
            title: document.title().to_string(),
            description: document.description().to_string(),
            file_url: document.file_url().to_string(),
            page_dimensions: document.page_dimensions().clone(),
            task_id: document.task_id().to_string(),
            created_at: document.created_at().to_rfc3339(),
        }
    }
}

impl From<&Chunk> for ChunkDto {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id().to_string(),
            text: chunk.text().to_string(),
            bbox: *chunk.bbox(),
            page: chunk.page(),
            word_count: chunk.word_count(),
        }
    }
}

impl ChunkPageDto {
    pub fn new(page: ChunkPage, skip: i64, limit: i64) -> Self {
        Self {
            namespace: page.namespace.to_string(),
            chunks: page.chunks.iter().map(ChunkDto::from).collect(),
            total: page.total,
            skip,
            limit,
        }
    }
}

impl From<DeleteDocumentResponse> for DeleteDocumentResponseDto {
    fn from(response: DeleteDocumentResponse) -> Self {
        Self {
            document_id: response.document_id,
            namespace: response.namespace,
            chunk_rows_deleted: response.chunk_rows_deleted,
        }
    }
}
