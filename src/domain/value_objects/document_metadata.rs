use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InTextCitation {
    #[serde(default)]
    pub in_text: Option<String>,
}

/// Bibliographic metadata of an ingested document, as returned by the completion service.
/// Missing fields mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "authors_or_empty")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub citations: Option<InTextCitation>,
    #[serde(default, deserialize_with = "loose_string")]
    pub year: Option<String>,
}

impl DocumentMetadata {
    /// Metadata carrying only the heuristic title, used when extraction is skipped or falls back.
    pub fn from_title(title: &str) -> Self {
        Self {
            title: (!title.trim().is_empty()).then(|| title.trim().to_string()),
            ..Self::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.title.is_none() && self.authors.is_empty() && self.year.is_none()
    }

    pub fn in_text_citation(&self) -> Option<&str> {
        self.citations.as_ref().and_then(|c| c.in_text.as_deref())
    }
}

/// Accepts a string, a number or null and yields an optional string.
pub fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts a list of names, a single name or null.
pub fn authors_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}
