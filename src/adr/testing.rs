use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::error::{AdrError, Result};
use super::host::{RepoRef, RepositoryHost};
use super::types::{ChangeRequestPage, ChangeRequestState, ChangeRequestSummary, DirectoryEntry};

/// In-memory [`RepositoryHost`] serving canned responses and recording calls.
#[derive(Default)]
pub struct FakeHost {
    /// `None` simulates a response without a tree object.
    pub listing: Option<Vec<DirectoryEntry>>,
    pub listing_error: Option<String>,
    pub pages: Vec<ChangeRequestPage>,
    /// Page index (0-based) whose request fails.
    pub page_error_at: Option<usize>,
    /// Past the canned pages, keep answering with empty pages that claim more history.
    pub endless: bool,
    pub listing_calls: Mutex<Vec<(String, String)>>,
    pub page_calls: Mutex<Vec<(Option<String>, u32)>>,
}

impl FakeHost {
    pub fn with_listing(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            listing: Some(entries),
            ..Default::default()
        }
    }

    pub fn with_pages(pages: Vec<ChangeRequestPage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn page_call_count(&self) -> usize {
        self.page_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn fetch_directory_listing(
        &self,
        repo: &RepoRef,
        expression: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        self.listing_calls
            .lock()
            .unwrap()
            .push((repo.to_string(), expression.to_string()));
        if let Some(message) = &self.listing_error {
            return Err(AdrError::Collaborator(message.clone()));
        }
        self.listing
            .clone()
            .ok_or_else(|| AdrError::MalformedResponse("repository.object".to_string()))
    }

    async fn fetch_change_request_page(
        &self,
        _repo: &RepoRef,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ChangeRequestPage> {
        let index = {
            let mut calls = self.page_calls.lock().unwrap();
            calls.push((cursor.map(str::to_string), page_size));
            calls.len() - 1
        };
        if self.page_error_at == Some(index) {
            return Err(AdrError::Collaborator("rate limited".to_string()));
        }
        match self.pages.get(index) {
            Some(canned) => Ok(canned.clone()),
            None if self.endless => Ok(page(vec![], true, &format!("cursor-{index}"))),
            None => Err(AdrError::Collaborator(format!("unexpected page request #{index}"))),
        }
    }
}

pub fn entry(name: &str, text: &str) -> DirectoryEntry {
    DirectoryEntry {
        name: name.to_string(),
        text: Some(text.to_string()),
    }
}

/// Record text with front matter built from `key: value` lines.
pub fn record_text(title: &str, front_matter: &str) -> String {
    format!(
        "---\n{front_matter}\n---\n# {title}\n\n## Problem Description\nWhy {title}.\n\n## Accepted Solution\nDo {title}.\n"
    )
}

pub fn pull_request(number: u32, files: &[&str]) -> ChangeRequestSummary {
    ChangeRequestSummary {
        title: format!("PR {number}"),
        url: format!("https://github.com/test-user/test-repo/pull/{number}"),
        body: String::new(),
        created_at: Utc.with_ymd_and_hms(2024, 1, number.clamp(1, 28), 0, 0, 0).unwrap(),
        closed_at: None,
        state: ChangeRequestState::Merged,
        files: files.iter().map(|f| f.to_string()).collect(),
    }
}

pub fn page(items: Vec<ChangeRequestSummary>, has_previous_page: bool, cursor: &str) -> ChangeRequestPage {
    ChangeRequestPage {
        items,
        has_previous_page,
        start_cursor: Some(cursor.to_string()),
    }
}
