use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_SLUG_LEN: usize = 48;
const SUFFIX_LEN: usize = 10;

/// Partition key shared by a document's chunk rows, vectors and file record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Namespace(String);

impl Namespace {
    /// Shared namespace used by library-mode runs.
    pub const LIBRARY: &'static str = "library";

    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err("Namespace cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn library() -> Self {
        Self(Self::LIBRARY.to_string())
    }

    /// Title slug plus a random suffix, e.g. `attention-is-all-you-need-3f9a0c7e21`.
    pub fn generate(title: &str) -> Self {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(SUFFIX_LEN)
            .collect();

        Self(format!("{}-{}", slugify(title), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_library(&self) -> bool {
        self.0 == Self::LIBRARY
    }
}

fn slugify(title: &str) -> String {
    let slug = title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        "document".to_string()
    } else {
        slug.to_string()
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Namespace> for String {
    fn from(namespace: Namespace) -> Self {
        namespace.0
    }
}
