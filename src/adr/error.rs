use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdrError {
    /// The front matter block is not valid YAML.
    #[error("malformed front matter: {0}")]
    MalformedMetadata(#[from] serde_yaml::Error),

    /// The repository host call itself failed (network, auth, not found, GraphQL errors).
    #[error("repository host request failed: {0}")]
    Collaborator(String),

    /// The host answered, but a field the query asks for is missing.
    #[error("unexpected response shape: missing `{0}`")]
    MalformedResponse(String),

    /// A new record cannot be prepared from the request or the template.
    #[error("cannot draft record: {0}")]
    InvalidDraft(String),
}

pub type Result<T> = std::result::Result<T, AdrError>;
