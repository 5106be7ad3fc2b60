//! Decision record retrieval: parse record files, filter them on their
//! front matter, and index the pull requests that touched them.

pub mod draft;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod format;
pub mod host;
pub mod index;
pub mod markdown;
pub mod parser;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use draft::{DraftRequest, RecordDrafter};
pub use fetch::{ParseFailurePolicy, RecordFetcher};
pub use host::{RepoRef, RepositoryHost};
pub use index::ChangeRequestIndexBuilder;
pub use types::FilterCriteria;
