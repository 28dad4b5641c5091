use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::LibraryEntry;
use crate::infrastructure::database::schema::library_entries;

#[derive(Debug, Insertable)]
#[diesel(table_name = library_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewLibraryEntryModel {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub title: String,
    pub description: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&LibraryEntry> for NewLibraryEntryModel {
    type Error = String;

    fn try_from(entry: &LibraryEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entry.id,
            user_id: entry.user_id.clone(),
            title: entry.title.clone(),
            description: entry.description.clone(),
            metadata: serde_json::to_value(&entry.metadata)
                .map_err(|e| format!("Failed to encode library metadata: {}", e))?,
            created_at: entry.created_at,
        })
    }
}
