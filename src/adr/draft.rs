//! Preparing a new decision record from the repository's template.
//!
//! The drafter picks the next free record number and fills the template's
//! title and front matter. Creating the branch and opening the pull request
//! is left to the author.

use std::sync::Arc;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::error::{AdrError, Result};
use super::host::RepositoryHost;
use super::markdown::split_front_matter;
use crate::config::AdrConfig;

/// Every new record starts out open.
pub const DRAFT_STATUS: &str = "open";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    pub title: String,
    /// Branch the record will be proposed on; also the file name slug.
    pub branch: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    /// File name, e.g. `0006-new-branch.md`.
    pub name: String,
    /// Repository path of the new file.
    pub path: String,
    pub content: String,
}

pub struct RecordDrafter {
    host: Arc<dyn RepositoryHost>,
    config: Arc<AdrConfig>,
}

impl RecordDrafter {
    pub fn new(host: Arc<dyn RepositoryHost>, config: Arc<AdrConfig>) -> Self {
        Self { host, config }
    }

    /// One directory listing supplies both the template text and the
    /// existing record names.
    pub async fn draft(&self, request: &DraftRequest) -> Result<RecordDraft> {
        validate_branch(&request.branch)?;

        let expression = self.config.directory_expression();
        let entries = self
            .host
            .fetch_directory_listing(&self.config.repo, &expression)
            .await?;

        let template = entries
            .iter()
            .find(|e| e.name == self.config.template)
            .ok_or_else(|| {
                AdrError::InvalidDraft(format!(
                    "template {} not found in {}",
                    self.config.template, self.config.path
                ))
            })?;
        let text = template.text.as_deref().ok_or_else(|| {
            AdrError::MalformedResponse(format!("object.text for {}", template.name))
        })?;

        let number = next_record_number(
            entries.iter().map(|e| e.name.as_str()),
            &self.config.file_pattern,
        );
        let name = record_file_name(number, &request.branch);
        let content = fill_template(text, &request.title, &request.impact, DRAFT_STATUS)?;

        debug!(
            repo = %self.config.repo,
            name = %name,
            listed = entries.len(),
            "decision record drafted"
        );
        Ok(RecordDraft {
            path: format!("{}/{}", self.config.path, name),
            name,
            content,
        })
    }
}

/// Highest leading number among names matching `pattern`, plus one.
/// Starts at 1 when no record is numbered yet.
pub fn next_record_number<'a>(names: impl IntoIterator<Item = &'a str>, pattern: &Regex) -> u32 {
    names
        .into_iter()
        .filter(|name| pattern.is_match(name))
        .filter_map(leading_number)
        .max()
        .map_or(1, |n| n.saturating_add(1))
}

pub fn record_file_name(number: u32, slug: &str) -> String {
    format!("{number:04}-{slug}.md")
}

fn leading_number(name: &str) -> Option<u32> {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    name[..digits].parse().ok()
}

/// The branch doubles as a file name, so it is held to a conservative
/// character set.
fn validate_branch(branch: &str) -> Result<()> {
    let valid_chars = branch
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if branch.is_empty()
        || !valid_chars
        || branch.starts_with(['-', '.'])
        || branch.ends_with('.')
        || branch.contains("..")
    {
        return Err(AdrError::InvalidDraft(format!(
            "branch `{}` must use letters, digits, '-', '_' or '.'",
            branch
        )));
    }
    Ok(())
}

/// Replace the title and set `impact` and `status` in the front matter,
/// keeping every other key in place. A template without front matter gets
/// one; a template without a depth-1 heading gets the title prepended.
pub fn fill_template(template: &str, title: &str, impact: &str, status: &str) -> Result<String> {
    let (raw, body) = match split_front_matter(template) {
        Some((raw, body)) => (Some(raw), body),
        None => (None, template),
    };

    let mut front_matter = match raw.filter(|r| !r.trim().is_empty()) {
        Some(raw) => match serde_yaml::from_str::<Value>(raw)? {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => {
                return Err(AdrError::InvalidDraft(
                    "template front matter is not a mapping".to_string(),
                ))
            }
        },
        None => Mapping::new(),
    };
    front_matter.insert("impact".into(), impact.into());
    front_matter.insert("status".into(), status.into());
    let yaml = serde_yaml::to_string(&front_matter)?;

    Ok(format!("---\n{}---\n{}", yaml, set_title(body, title)))
}

/// Rewrites the inline content of the first depth-1 heading.
fn set_title(body: &str, title: &str) -> String {
    let mut heading: Option<std::ops::Range<usize>> = None;
    let mut content: Option<std::ops::Range<usize>> = None;

    for (event, range) in Parser::new(body).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) if heading.is_none() => heading = Some(range),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if heading.is_some() => break,
            _ if heading.is_some() => {
                content = Some(match content {
                    Some(seen) => seen.start.min(range.start)..seen.end.max(range.end),
                    None => range,
                });
            }
            _ => {}
        }
    }

    match (heading, content) {
        (_, Some(content)) => format!(
            "{}{}{}",
            &body[..content.start],
            title,
            &body[content.end..]
        ),
        (Some(heading), None) => {
            let newline = if body[heading.clone()].ends_with('\n') { "\n" } else { "" };
            format!(
                "{}# {}{}{}",
                &body[..heading.start],
                title,
                newline,
                &body[heading.end..]
            )
        }
        (None, None) => format!("# {}\n\n{}", title, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adr::markdown::{tokenize, Block};
    use crate::adr::parser::parse_document;
    use crate::adr::testing::{entry, FakeHost};
    use crate::adr::types::DirectoryEntry;
    use serde_json::json;

    const TEMPLATE: &str = "---\nstatus: TBD\nimpact: TBD\ntags: []\n---\n# {{TITLE}}\n\n## Problem Description\nDescribe the problem.\n";

    fn pattern() -> Regex {
        Regex::new(r"\d{4}-.*\.md").unwrap()
    }

    fn config() -> Arc<AdrConfig> {
        Arc::new(
            AdrConfig::new("test-user", "test-repo", "main", "docs/decisions", r"\d{4}-.*\.md")
                .unwrap(),
        )
    }

    fn request(branch: &str) -> DraftRequest {
        DraftRequest {
            title: "New Decision".to_string(),
            branch: branch.to_string(),
            impact: "medium".to_string(),
        }
    }

    #[test]
    fn test_next_number_follows_highest_record() {
        let names = ["0001-first-adr.md", "0005-fifth-adr.md", "0003-third-adr.md", "README.md"];
        assert_eq!(next_record_number(names, &pattern()), 6);
        assert_eq!(record_file_name(6, "new-branch"), "0006-new-branch.md");
    }

    #[test]
    fn test_next_number_skips_unmatched_names() {
        let names = ["0001-existing-adr.md", "0002-another-adr.md", "9999-notes.txt"];
        assert_eq!(next_record_number(names, &pattern()), 3);
    }

    #[test]
    fn test_next_number_starts_at_one() {
        assert_eq!(next_record_number(Vec::<&str>::new(), &pattern()), 1);
        assert_eq!(next_record_number(["decision-template.md"], &pattern()), 1);
    }

    #[test]
    fn test_next_number_ignores_names_without_leading_digits() {
        let names = ["draft-0009-x.md", "0002-b.md"];
        assert_eq!(next_record_number(names, &pattern()), 3);
    }

    #[test]
    fn test_fill_template_sets_title_and_front_matter() {
        let filled = fill_template(TEMPLATE, "Test Decision", "high", DRAFT_STATUS).unwrap();
        let record = parse_document(&filled).unwrap();

        assert_eq!(record.title.as_deref(), Some("Test Decision"));
        assert_eq!(record.field("impact"), Some(&json!("high")));
        assert_eq!(record.field("status"), Some(&json!("open")));
        assert_eq!(record.field("tags"), Some(&json!([])));
        assert_eq!(record.section("Problem Description"), Some("Describe the problem."));
    }

    #[test]
    fn test_fill_template_keeps_key_order() {
        let filled = fill_template(TEMPLATE, "T", "low", "open").unwrap();
        assert!(filled.starts_with("---\nstatus: open\nimpact: low\ntags: []\n---\n# T\n"));
    }

    #[test]
    fn test_fill_template_without_front_matter() {
        let filled = fill_template("# Old\n\nBody text.\n", "New", "low", "open").unwrap();
        let blocks = tokenize(&filled);
        assert!(matches!(blocks[0], Block::Metadata(_)));
        assert_eq!(blocks[1], Block::heading(1, "New"));
        assert_eq!(blocks[2], Block::paragraph("Body text."));
    }

    #[test]
    fn test_fill_template_without_title_prepends_one() {
        let filled = fill_template("---\nimpact: TBD\n---\nJust text.\n", "Added", "low", "open")
            .unwrap();
        let record = parse_document(&filled).unwrap();
        assert_eq!(record.title.as_deref(), Some("Added"));
        assert!(filled.ends_with("# Added\n\nJust text.\n"));
    }

    #[test]
    fn test_fill_template_replaces_styled_title() {
        let filled = fill_template("# The *old* title\n", "Plain", "low", "open").unwrap();
        assert!(filled.ends_with("# Plain\n"));
    }

    #[test]
    fn test_fill_template_only_touches_first_title() {
        let filled = fill_template("# One\n\n# Two\n", "New", "low", "open").unwrap();
        assert!(filled.ends_with("# New\n\n# Two\n"));
    }

    #[test]
    fn test_fill_template_rejects_malformed_front_matter() {
        let err = fill_template("---\nimpact: [x\n---\n# T\n", "T", "low", "open").unwrap_err();
        assert!(matches!(err, AdrError::MalformedMetadata(_)));

        let err = fill_template("---\n- a\n- b\n---\n# T\n", "T", "low", "open").unwrap_err();
        assert!(matches!(err, AdrError::InvalidDraft(_)));
    }

    #[test]
    fn test_branch_validation() {
        assert!(validate_branch("new-branch").is_ok());
        assert!(validate_branch("db_migration.v2").is_ok());
        for bad in ["", "has space", "../escape", "a/b", "-flag", ".hidden", "trailing."] {
            assert!(validate_branch(bad).is_err(), "branch = {bad:?}");
        }
    }

    #[tokio::test]
    async fn test_draft_from_listing() {
        let host = Arc::new(FakeHost::with_listing(vec![
            entry("0001-first-adr.md", "# First\n"),
            entry("0005-fifth-adr.md", "# Fifth\n"),
            entry("0003-third-adr.md", "# Third\n"),
            entry("README.md", "# Readme\n"),
            entry("decision-template.md", TEMPLATE),
        ]));
        let drafter = RecordDrafter::new(host.clone(), config());

        let draft = drafter.draft(&request("new-branch")).await.unwrap();

        assert_eq!(draft.name, "0006-new-branch.md");
        assert_eq!(draft.path, "docs/decisions/0006-new-branch.md");
        let record = parse_document(&draft.content).unwrap();
        assert_eq!(record.title.as_deref(), Some("New Decision"));
        assert_eq!(record.field("impact"), Some(&json!("medium")));
        assert_eq!(record.field("status"), Some(&json!("open")));
        assert_eq!(host.listing_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_draft_without_template_fails() {
        let host = Arc::new(FakeHost::with_listing(vec![entry("0001-a.md", "# A\n")]));
        let drafter = RecordDrafter::new(host, config());

        let err = drafter.draft(&request("b")).await.unwrap_err();
        assert!(matches!(err, AdrError::InvalidDraft(_)));
    }

    #[tokio::test]
    async fn test_template_entry_without_text_is_malformed() {
        let host = Arc::new(FakeHost::with_listing(vec![DirectoryEntry {
            name: "decision-template.md".to_string(),
            text: None,
        }]));
        let drafter = RecordDrafter::new(host, config());

        let err = drafter.draft(&request("b")).await.unwrap_err();
        assert!(matches!(err, AdrError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_invalid_branch_is_rejected_before_listing() {
        let host = Arc::new(FakeHost::with_listing(vec![]));
        let drafter = RecordDrafter::new(host.clone(), config());

        let err = drafter.draft(&request("bad branch")).await.unwrap_err();
        assert!(matches!(err, AdrError::InvalidDraft(_)));
        assert!(host.listing_calls.lock().unwrap().is_empty());
    }
}
