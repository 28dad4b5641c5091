pub mod bounding_box;
pub mod document_metadata;
pub mod namespace;
pub mod page_dimensions;
pub mod run_status;
pub mod url_fingerprint;

pub use bounding_box::BoundingBox;
pub use document_metadata::DocumentMetadata;
pub use namespace::Namespace;
pub use page_dimensions::{PageDimensions, PageSize};
pub use run_status::{GraphStatus, RunStatus};
pub use url_fingerprint::UrlFingerprint;
