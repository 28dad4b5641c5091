use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::DocumentMetadata;

/// Row in the shared library catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub title: String,
    pub description: String,
    pub metadata: LibraryMetadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryMetadata {
    pub title: Option<String>,
    pub file_url: String,
    pub authors: Vec<String>,
    pub in_text_citation: Option<String>,
    pub year: Option<String>,
}

impl LibraryEntry {
    pub fn new(
        user_id: Option<String>,
        title: String,
        description: String,
        file_url: &str,
        metadata: &DocumentMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            metadata: LibraryMetadata {
                title: metadata.title.clone(),
                file_url: file_url.to_string(),
                authors: metadata.authors.clone(),
                in_text_citation: metadata.in_text_citation().map(str::to_string),
                year: metadata.year.clone(),
            },
            created_at: Utc::now(),
        }
    }
}
