use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{AdrError, Result};
use super::host::RepositoryHost;
use super::types::ChangeRequestIndex;
use crate::config::AdrConfig;

/// Walks pull request history, newest-updated first, and groups pull
/// requests by the record files they touched.
pub struct ChangeRequestIndexBuilder {
    host: Arc<dyn RepositoryHost>,
    config: Arc<AdrConfig>,
    page_size: u32,
    max_pages: u32,
}

impl ChangeRequestIndexBuilder {
    pub fn new(host: Arc<dyn RepositoryHost>, config: Arc<AdrConfig>) -> Self {
        Self {
            host,
            config,
            page_size: 100,
            max_pages: 50,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Pages are requested one at a time until the host reports no older
    /// page, or `max_pages` pages have been read (the index is then marked
    /// truncated). A pull request touching several records is listed under
    /// each of them. Any host error discards the partial index.
    pub async fn build_index(&self) -> Result<ChangeRequestIndex> {
        let mut index = ChangeRequestIndex::default();
        let mut cursor: Option<String> = None;

        loop {
            if index.pages >= self.max_pages as usize {
                index.truncated = true;
                warn!(
                    repo = %self.config.repo,
                    pages = index.pages,
                    "pull request history truncated at page cap"
                );
                break;
            }

            let page = self
                .host
                .fetch_change_request_page(&self.config.repo, cursor.as_deref(), self.page_size)
                .await?;
            index.pages += 1;

            debug!(
                page = index.pages,
                items = page.items.len(),
                has_previous_page = page.has_previous_page,
                "pull request page received"
            );

            for summary in &page.items {
                for path in &summary.files {
                    if !self.config.path_pattern.is_match(path) {
                        continue;
                    }
                    let file_name = path.rsplit('/').next().unwrap_or(path);
                    index.push(file_name, summary.clone());
                }
            }

            if !page.has_previous_page {
                break;
            }
            // Without a cursor the next request would restart at the newest page.
            match page.start_cursor {
                Some(start) => cursor = Some(start),
                None => {
                    return Err(AdrError::MalformedResponse(
                        "pageInfo.startCursor".to_string(),
                    ))
                }
            }
        }

        Ok(index)
    }
}
