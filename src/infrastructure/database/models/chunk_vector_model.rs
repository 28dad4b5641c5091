use diesel::prelude::*;
use pgvector::Vector;

use crate::infrastructure::database::schema::chunk_vectors;

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = chunk_vectors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChunkVectorModel {
    pub namespace: String,
    pub id: String,
    pub text: String,
    pub page: i32,
    pub embedding: Vector,
}
