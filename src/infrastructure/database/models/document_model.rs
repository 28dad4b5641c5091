use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::DocumentRecord;
use crate::domain::value_objects::{Namespace, PageDimensions};
use crate::infrastructure::database::schema::documents;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Identifiable, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: Uuid,
    pub user_id: String,
    pub namespace: String,
    pub title: String,
    pub description: String,
    pub file_url: String,
    pub page_dimensions: serde_json::Value,
    pub task_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentRecord> for DocumentModel {
    fn from(document: &DocumentRecord) -> Self {
        Self {
            id: document.id(),
            user_id: document.user_id().to_string(),
            namespace: document.namespace().to_string(),
            title: document.title().to_string(),
            description: document.description().to_string(),
            file_url: document.file_url().to_string(),
            page_dimensions: document.page_dimensions().clone().into(),
            task_id: document.task_id().to_string(),
            created_at: document.created_at(),
        }
    }
}

impl TryFrom<DocumentModel> for DocumentRecord {
    type Error = String;

    fn try_from(model: DocumentModel) -> Result<Self, Self::Error> {
        let page_dimensions: PageDimensions = if model.page_dimensions.is_null() {
            PageDimensions::new()
        } else {
            serde_json::from_value(model.page_dimensions)
                .map_err(|e| format!("Invalid page dimensions for {}: {}", model.id, e))?
        };

        Ok(DocumentRecord::from_database(
            model.id,
            model.user_id,
            Namespace::new(model.namespace)?,
            model.title,
            model.description,
            model.file_url,
            page_dimensions,
            model.task_id,
            model.created_at,
        ))
    }
}
