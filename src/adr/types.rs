use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed form of one decision record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Text of the first depth-1 heading.
    pub title: Option<String>,
    /// Depth-2 heading text -> first inline text of the paragraph right after it.
    pub sections: HashMap<String, String>,
    /// `None` when the document has no front matter, `Some(Value::Null)` when
    /// the block exists but is blank.
    pub metadata: Option<Value>,
}

impl NormalizedRecord {
    pub fn section(&self, heading: &str) -> Option<&str> {
        self.sections.get(heading).map(String::as_str)
    }

    /// Look up a metadata field, if the metadata is a mapping.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }
}

/// A decision record as returned to the chat layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// File name inside the records directory, e.g. `0001-use-postgres.md`.
    pub name: String,
    /// Browsable link to the file on the repository host.
    pub url: String,
    pub data: NormalizedRecord,
}

/// Caller-supplied predicates. A field left as `None` is inactive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub status: Option<Vec<String>>,
    pub impact: Option<Vec<String>>,
    /// Matched with OR semantics against the record's tags.
    pub tags: Option<Vec<String>>,
    pub committed_after: Option<DateTime<Utc>>,
    pub decide_before: Option<DateTime<Utc>>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.impact.is_none()
            && self.tags.is_none()
            && self.committed_after.is_none()
            && self.decide_before.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeRequestState {
    Open,
    Closed,
    Merged,
}

impl std::fmt::Display for ChangeRequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChangeRequestState::Open => "open",
            ChangeRequestState::Closed => "closed",
            ChangeRequestState::Merged => "merged",
        };
        f.write_str(label)
    }
}

/// One pull request and the files it touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequestSummary {
    pub title: String,
    pub url: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub state: ChangeRequestState,
    pub files: Vec<String>,
}

/// A single page of pull request history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRequestPage {
    pub items: Vec<ChangeRequestSummary>,
    pub has_previous_page: bool,
    /// Cursor to pass back for the next (older) page.
    pub start_cursor: Option<String>,
}

/// One entry of the records directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub name: String,
    /// Blob text; `None` for sub-trees and binary blobs.
    pub text: Option<String>,
}

/// Record file name -> pull requests that touched it, newest-updated first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeRequestIndex {
    pub by_file: BTreeMap<String, Vec<ChangeRequestSummary>>,
    /// Number of history pages consumed.
    pub pages: usize,
    /// Set when the page cap was hit while the host still reported older pages.
    pub truncated: bool,
}

impl ChangeRequestIndex {
    pub fn get(&self, file_name: &str) -> &[ChangeRequestSummary] {
        self.by_file
            .get(file_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn push(&mut self, file_name: &str, summary: ChangeRequestSummary) {
        self.by_file
            .entry(file_name.to_string())
            .or_default()
            .push(summary);
    }
}
