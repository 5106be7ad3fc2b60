use async_trait::async_trait;

use super::error::Result;
use super::types::{ChangeRequestPage, DirectoryEntry};

/// Owner/name pair identifying a repository on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The two repository-host calls the record pipeline relies on.
///
/// Implementations map every transport, auth or lookup failure to
/// [`AdrError::Collaborator`](super::error::AdrError::Collaborator) and a
/// response missing the expected nesting to
/// [`AdrError::MalformedResponse`](super::error::AdrError::MalformedResponse).
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Every entry of the tree at `expression` (`<ref>:<path>`), with blob text, in one call.
    async fn fetch_directory_listing(
        &self,
        repo: &RepoRef,
        expression: &str,
    ) -> Result<Vec<DirectoryEntry>>;

    /// One page of pull requests ordered by most recently updated. `cursor`
    /// is the previous page's start cursor, `None` for the first call.
    async fn fetch_change_request_page(
        &self,
        repo: &RepoRef,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ChangeRequestPage>;
}
