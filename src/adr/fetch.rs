use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use super::error::{AdrError, Result};
use super::filter::matches;
use super::host::RepositoryHost;
use super::parser::parse_document;
use super::types::{FilterCriteria, NormalizedRecord, Record};
use crate::config::AdrConfig;

/// What to do when one record's front matter does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseFailurePolicy {
    /// Abort the whole fetch with the parse error.
    #[default]
    FailFast,
    /// Leave the record out and keep going.
    Skip,
}

impl FromStr for ParseFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail-fast" => Ok(Self::FailFast),
            "skip" => Ok(Self::Skip),
            other => anyhow::bail!("Unknown parse error policy '{}'. Must be fail or skip.", other),
        }
    }
}

impl std::fmt::Display for ParseFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FailFast => f.write_str("fail"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

/// Loads the records directory in one call and returns the records that
/// pass a filter, in listing order.
pub struct RecordFetcher {
    host: Arc<dyn RepositoryHost>,
    config: Arc<AdrConfig>,
    policy: ParseFailurePolicy,
}

impl RecordFetcher {
    pub fn new(host: Arc<dyn RepositoryHost>, config: Arc<AdrConfig>) -> Self {
        Self {
            host,
            config,
            policy: ParseFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ParseFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Entries whose name does not match the configured file pattern are
    /// ignored. Each remaining entry is parsed and filtered before the next
    /// one is looked at.
    pub async fn fetch_records(&self, criteria: &FilterCriteria) -> Result<Vec<Record>> {
        let expression = self.config.directory_expression();
        let entries = self
            .host
            .fetch_directory_listing(&self.config.repo, &expression)
            .await?;

        let listed = entries.len();
        let mut records = Vec::new();

        for entry in entries {
            if !self.config.file_pattern.is_match(&entry.name) {
                continue;
            }

            let text = entry.text.as_deref().ok_or_else(|| {
                AdrError::MalformedResponse(format!("object.text for {}", entry.name))
            })?;

            let Some(data) = self.apply_policy(&entry.name, parse_document(text))? else {
                continue;
            };

            if matches(data.metadata.as_ref(), criteria) {
                let url = self.config.record_url(&entry.name);
                records.push(Record {
                    name: entry.name,
                    url,
                    data,
                });
            }
        }

        debug!(
            repo = %self.config.repo,
            expression = %expression,
            listed,
            matched = records.len(),
            "decision records fetched"
        );
        Ok(records)
    }

    /// Names of the record files in the directory, in listing order. Nothing
    /// is parsed, so a malformed record does not hide the others.
    pub async fn record_names(&self) -> Result<Vec<String>> {
        let entries = self
            .host
            .fetch_directory_listing(&self.config.repo, &self.config.directory_expression())
            .await?;
        Ok(entries
            .into_iter()
            .map(|entry| entry.name)
            .filter(|name| self.config.file_pattern.is_match(name))
            .collect())
    }

    fn apply_policy(
        &self,
        name: &str,
        parsed: Result<NormalizedRecord>,
    ) -> Result<Option<NormalizedRecord>> {
        match (parsed, self.policy) {
            (Ok(record), _) => Ok(Some(record)),
            (Err(e), ParseFailurePolicy::FailFast) => Err(e),
            (Err(e), ParseFailurePolicy::Skip) => {
                debug!(name, error = %e, "skipping unparseable decision record");
                Ok(None)
            }
        }
    }
}
