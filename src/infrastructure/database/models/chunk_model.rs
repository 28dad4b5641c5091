use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::domain::entities::Chunk;
use crate::domain::value_objects::{BoundingBox, Namespace};
use crate::infrastructure::database::schema::chunks;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Identifiable)]
#[diesel(table_name = chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChunkModel {
    pub id: String,
    pub namespace: String,
    pub text: String,
    pub bbox: serde_json::Value,
    pub page: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChunkModel {
    pub id: String,
    pub namespace: String,
    pub text: String,
    pub bbox: serde_json::Value,
    pub page: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Chunk> for NewChunkModel {
    type Error = String;

    fn try_from(chunk: &Chunk) -> Result<Self, Self::Error> {
        Ok(Self {
            id: chunk.id().to_string(),
            namespace: chunk.namespace().to_string(),
            text: chunk.text().to_string(),
            bbox: serde_json::to_value(chunk.bbox())
                .map_err(|e| format!("Failed to encode bbox: {}", e))?,
            page: chunk.page(),
            created_at: chunk.created_at(),
        })
    }
}

impl TryFrom<ChunkModel> for Chunk {
    type Error = String;

    fn try_from(model: ChunkModel) -> Result<Self, Self::Error> {
        let bbox: BoundingBox = serde_json::from_value(model.bbox)
            .map_err(|e| format!("Invalid bbox for chunk {}: {}", model.id, e))?;

        Ok(Chunk::from_database(
            model.id,
            Namespace::new(model.namespace)?,
            model.text,
            bbox,
            model.page,
            model.created_at,
        ))
    }
}
