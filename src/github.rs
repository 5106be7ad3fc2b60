use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::adr::error::{AdrError, Result};
use crate::adr::types::{ChangeRequestPage, ChangeRequestState, ChangeRequestSummary, DirectoryEntry};
use crate::adr::{RepoRef, RepositoryHost};

const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

/// Tree entries of one directory, with blob text.
const DIRECTORY_QUERY: &str = r#"
query ($repo: String!, $owner: String!, $expression: String!) {
  repository(name: $repo, owner: $owner) {
    object(expression: $expression) {
      ... on Tree {
        entries {
          name
          object {
            ... on Blob {
              text
            }
          }
        }
      }
    }
  }
}
"#;

/// Pull requests, most recently updated first, paged backwards.
const PULL_REQUESTS_QUERY: &str = r#"
query ($repo: String!, $owner: String!, $cursor: String, $pageSize: Int!) {
  repository(name: $repo, owner: $owner) {
    pullRequests(last: $pageSize, before: $cursor, orderBy: {field: UPDATED_AT, direction: DESC}) {
      edges {
        node {
          title
          body
          url
          state
          createdAt
          closedAt
          files(last: $pageSize) {
            edges {
              node {
                path
              }
            }
          }
        }
      }
      pageInfo {
        hasPreviousPage
        startCursor
      }
    }
  }
}
"#;

pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let token = dotenv::var("GITHUB_TOKEN").context("GITHUB_TOKEN required")?;
        let api_url =
            dotenv::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(api_url, token)
    }

    pub fn new(api_url: String, token: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("adr-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// POST a GraphQL query and return its `data` object.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> anyhow::Result<Option<T>> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("GitHub request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read GitHub response")?;
        if !status.is_success() {
            bail!("GitHub returned {}: {}", status, text.trim());
        }

        let parsed: GraphQlResponse<T> =
            serde_json::from_str(&text).context("Failed to parse GitHub JSON")?;
        if !parsed.errors.is_empty() {
            let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
            bail!("GitHub GraphQL error: {}", messages.join("; "));
        }
        Ok(parsed.data)
    }
}

fn collaborator(err: anyhow::Error) -> AdrError {
    AdrError::Collaborator(format!("{:#}", err))
}

fn missing(path: &str) -> AdrError {
    AdrError::MalformedResponse(path.to_string())
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn fetch_directory_listing(
        &self,
        repo: &RepoRef,
        expression: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        let variables = serde_json::json!({
            "owner": repo.owner,
            "repo": repo.name,
            "expression": expression,
        });
        let data: Option<TreeData> = self
            .graphql(DIRECTORY_QUERY, variables)
            .await
            .map_err(collaborator)?;

        let entries = directory_entries(data)?;
        debug!(%repo, expression, entries = entries.len(), "directory listing received");
        Ok(entries)
    }

    async fn fetch_change_request_page(
        &self,
        repo: &RepoRef,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ChangeRequestPage> {
        let variables = serde_json::json!({
            "owner": repo.owner,
            "repo": repo.name,
            "cursor": cursor,
            "pageSize": page_size,
        });
        let data: Option<PullRequestData> = self
            .graphql(PULL_REQUESTS_QUERY, variables)
            .await
            .map_err(collaborator)?;

        change_request_page(data)
    }
}

fn directory_entries(data: Option<TreeData>) -> Result<Vec<DirectoryEntry>> {
    let entries = data
        .ok_or_else(|| missing("data"))?
        .repository
        .ok_or_else(|| missing("repository"))?
        .object
        .ok_or_else(|| missing("repository.object"))?
        .entries
        .ok_or_else(|| missing("repository.object.entries"))?;

    Ok(entries
        .into_iter()
        .map(|e| DirectoryEntry {
            name: e.name,
            text: e.object.and_then(|o| o.text),
        })
        .collect())
}

fn change_request_page(data: Option<PullRequestData>) -> Result<ChangeRequestPage> {
    let connection = data
        .ok_or_else(|| missing("data"))?
        .repository
        .ok_or_else(|| missing("repository"))?
        .pull_requests
        .ok_or_else(|| missing("repository.pullRequests"))?;

    let items = connection
        .edges
        .into_iter()
        .map(|edge| {
            let node = edge.node;
            ChangeRequestSummary {
                title: node.title,
                url: node.url,
                body: node.body.unwrap_or_default(),
                created_at: node.created_at,
                closed_at: node.closed_at,
                state: node.state,
                files: node
                    .files
                    .map(|f| f.edges.into_iter().map(|e| e.node.path).collect())
                    .unwrap_or_default(),
            }
        })
        .collect();

    Ok(ChangeRequestPage {
        items,
        has_previous_page: connection.page_info.has_previous_page,
        start_cursor: connection.page_info.start_cursor,
    })
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TreeData {
    repository: Option<TreeRepository>,
}

#[derive(Debug, Deserialize)]
struct TreeRepository {
    object: Option<TreeObject>,
}

/// `entries` is absent when the expression resolves to a blob instead of a tree.
#[derive(Debug, Deserialize)]
struct TreeObject {
    entries: Option<Vec<TreeEntry>>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    name: String,
    object: Option<BlobObject>,
}

#[derive(Debug, Deserialize)]
struct BlobObject {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRequestData {
    repository: Option<PullRequestRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestRepository {
    pull_requests: Option<PullRequestConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestConnection {
    edges: Vec<PullRequestEdge>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct PullRequestEdge {
    node: PullRequestNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode {
    title: String,
    url: String,
    body: Option<String>,
    state: ChangeRequestState,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    files: Option<FileConnection>,
}

#[derive(Debug, Deserialize)]
struct FileConnection {
    edges: Vec<FileEdge>,
}

#[derive(Debug, Deserialize)]
struct FileEdge {
    node: FileNode,
}

#[derive(Debug, Deserialize)]
struct FileNode {
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_previous_page: bool,
    start_cursor: Option<String>,
}
