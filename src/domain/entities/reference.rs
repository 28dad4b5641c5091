use serde::{Deserialize, Serialize};

use crate::domain::value_objects::document_metadata::{authors_or_empty, loose_string};

/// One cited work as extracted from the bibliography section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "authors_or_empty")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub url: Option<String>,
    /// 1-based position in the extracted list; 0 until assigned.
    #[serde(default)]
    pub order: u32,
}

impl Reference {
    /// Assigns contiguous 1-based orders matching list position.
    pub fn assign_orders(references: Vec<Reference>) -> Vec<Reference> {
        references
            .into_iter()
            .enumerate()
            .map(|(index, mut reference)| {
                reference.order = index as u32 + 1;
                reference
            })
            .collect()
    }

    pub fn authors_display(&self) -> String {
        self.authors.join(", ")
    }
}
