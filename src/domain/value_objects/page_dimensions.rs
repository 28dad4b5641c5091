use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub page_width: f64,
    pub page_height: f64,
}

/// Page number to page size, needed to rescale chunk boxes at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageDimensions(BTreeMap<i32, PageSize>);

impl PageDimensions {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Records the first size seen for a page; later sightings are ignored.
    pub fn record(&mut self, page: i32, size: PageSize) {
        self.0.entry(page).or_insert(size);
    }

    pub fn get(&self, page: i32) -> Option<&PageSize> {
        self.0.get(&page)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<PageDimensions> for serde_json::Value {
    fn from(dimensions: PageDimensions) -> Self {
        serde_json::to_value(dimensions.0).unwrap_or(serde_json::Value::Null)
    }
}

impl TryFrom<serde_json::Value> for PageDimensions {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(|e| format!("Invalid page dimensions: {}", e))
    }
}
