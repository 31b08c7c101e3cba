// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod extract;
pub mod metrics;
pub mod record;
pub mod replies;
pub mod store;
pub mod taxonomy;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::extract::{today, Extractor};
pub use crate::record::{
    EventRecord, Extracted, Extraction, ExtractionInput, FieldOrigin, PartialEvent,
    PartialResource, RecordKind, ResourceRecord,
};
pub use crate::taxonomy::{Taxonomy, TaxonomyHandle};
