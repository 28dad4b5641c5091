use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Namespace, PageDimensions};

/// File record of an ingested document. Written last, once every chunk and
/// vector for its namespace is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    id: Uuid,
    user_id: String,
    namespace: Namespace,
    title: String,
    description: String,
    file_url: String,
    page_dimensions: PageDimensions,
    task_id: String,
    created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(
        user_id: String,
        namespace: Namespace,
        title: String,
        description: String,
        file_url: String,
        page_dimensions: PageDimensions,
        task_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            namespace,
            title,
            description,
            file_url,
            page_dimensions,
            task_id,
            created_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        user_id: String,
        namespace: Namespace,
        title: String,
        description: String,
        file_url: String,
        page_dimensions: PageDimensions,
        task_id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            namespace,
            title,
            description,
            file_url,
            page_dimensions,
            task_id,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn file_url(&self) -> &str {
        &self.file_url
    }

    pub fn page_dimensions(&self) -> &PageDimensions {
        &self.page_dimensions
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
