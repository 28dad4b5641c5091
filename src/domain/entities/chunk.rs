use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BoundingBox, Namespace};

/// Persisted and indexed unit of document text. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    id: String,
    namespace: Namespace,
    text: String,
    bbox: BoundingBox,
    page: i32,
    created_at: DateTime<Utc>,
}

impl Chunk {
    pub fn new(id: String, namespace: Namespace, text: String, bbox: BoundingBox, page: i32) -> Self {
        Self {
            id,
            namespace,
            text,
            bbox,
            page,
            created_at: Utc::now(),
        }
    }

    pub fn from_database(
        id: String,
        namespace: Namespace,
        text: String,
        bbox: BoundingBox,
        page: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            namespace,
            text,
            bbox,
            page,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn page(&self) -> i32 {
        self.page
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
