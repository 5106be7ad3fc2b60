use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::adr::{ParseFailurePolicy, RepoRef};

const DEFAULT_BRANCH: &str = "main";
const DEFAULT_PATH: &str = "docs/decisions";
const DEFAULT_PATTERN: &str = r"\d{4}-.*\.md";
const DEFAULT_TEMPLATE: &str = "decision-template.md";
const WEB_BASE: &str = "https://github.com";

/// Where decision records live and how they are recognised.
#[derive(Debug, Clone)]
pub struct AdrConfig {
    pub repo: RepoRef,
    pub branch: String,
    /// Directory holding the records, relative to the repository root.
    pub path: String,
    /// Matches bare record file names in a directory listing.
    pub file_pattern: Regex,
    /// Matches full repository paths of records in pull request file lists.
    pub path_pattern: Regex,
    /// File name of the record template, inside the records directory.
    pub template: String,
}

impl AdrConfig {
    pub fn new(owner: &str, repo: &str, branch: &str, path: &str, pattern: &str) -> Result<Self> {
        if owner.is_empty() || repo.is_empty() {
            bail!("repository owner and name must be non-empty");
        }
        let path = path.trim_matches('/').to_string();
        let file_pattern = Regex::new(pattern)
            .with_context(|| format!("Invalid record file pattern: {}", pattern))?;
        let path_pattern = Regex::new(&format!("{}/{}", regex::escape(&path), pattern))
            .with_context(|| format!("Invalid record path pattern for {}", path))?;

        Ok(Self {
            repo: RepoRef {
                owner: owner.to_string(),
                name: repo.to_string(),
            },
            branch: branch.to_string(),
            path,
            file_pattern,
            path_pattern,
            template: DEFAULT_TEMPLATE.to_string(),
        })
    }

    /// Accepts a bare file name or a repository path inside the records
    /// directory, e.g. `docs/decisions/decision-template.md`.
    pub fn with_template(mut self, template: &str) -> Result<Self> {
        let template = template.trim_matches('/');
        let name = match template.rsplit_once('/') {
            Some((dir, name)) if dir == self.path => name,
            Some(_) => bail!(
                "record template {} must live in the records directory {}",
                template,
                self.path
            ),
            None => template,
        };
        if name.is_empty() {
            bail!("record template name must be non-empty");
        }
        self.template = name.to_string();
        Ok(self)
    }

    pub fn from_env() -> Result<Self> {
        let owner = dotenv::var("GITHUB_USER").context("GITHUB_USER required")?;
        let repo = dotenv::var("GITHUB_REPO").context("GITHUB_REPO required")?;
        let branch =
            dotenv::var("GITHUB_DEFAULT_BRANCH").unwrap_or_else(|_| DEFAULT_BRANCH.to_string());
        let path = dotenv::var("GITHUB_PATH_TO_ADRS").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let pattern =
            dotenv::var("GITHUB_ADR_REGEX").unwrap_or_else(|_| DEFAULT_PATTERN.to_string());
        let config = Self::new(&owner, &repo, &branch, &path, &pattern)?;
        match dotenv::var("GITHUB_ADR_TEMPLATE") {
            Ok(template) => config.with_template(&template),
            Err(_) => Ok(config),
        }
    }

    /// Tree expression for the records directory, e.g. `main:docs/decisions`.
    pub fn directory_expression(&self) -> String {
        format!("{}:{}", self.branch, self.path)
    }

    /// Browsable link to a record file.
    pub fn record_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}/{}/blob/{}/{}/{}",
            WEB_BASE, self.repo.owner, self.repo.name, self.branch, self.path, file_name
        )
    }
}

/// Per-request limits; admins can change them at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Pull requests (and files per pull request) requested per page.
    pub page_size: u32,
    /// Safety cap on pull request history pages.
    pub max_pages: u32,
    pub on_parse_error: ParseFailurePolicy,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 50,
            on_parse_error: ParseFailurePolicy::FailFast,
        }
    }
}

impl FetchLimits {
    pub fn from_env() -> Result<Self> {
        let mut limits = Self::default();
        if let Ok(v) = dotenv::var("ADR_PR_PAGE_SIZE") {
            limits.page_size = v.parse().context("ADR_PR_PAGE_SIZE must be a number")?;
        }
        if let Ok(v) = dotenv::var("ADR_MAX_PR_PAGES") {
            limits.max_pages = v.parse().context("ADR_MAX_PR_PAGES must be a number")?;
        }
        if let Ok(v) = dotenv::var("ADR_ON_PARSE_ERROR") {
            limits.on_parse_error = v.parse()?;
        }
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.page_size) {
            bail!("page size must be between 1 and 100");
        }
        if self.max_pages == 0 {
            bail!("max pages must be > 0");
        }
        Ok(())
    }
}
