//! Hotfix catalog: the record store, its distinct-value index and the loaders
//! that (re)populate it.
//!
//! The catalog is written only by [`Catalog::reload`]; every reader works on an
//! immutable [`Generation`] snapshot, so queries never take a lock for longer
//! than it takes to clone an `Arc`.

mod error;
mod index;
mod source;
mod store;

pub use error::{CatalogError, CatalogResult};
pub use index::DistinctValueIndex;
pub use source::{FileRecordSource, RecordSource, SourceFormat, StaticRecordSource};
pub use store::{Catalog, Generation, GenerationStats};
