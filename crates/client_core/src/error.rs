use shared::error::GraphQlException;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReducerError {
    #[error("unrecognized action type '{0}'")]
    UnknownAction(String),
    #[error("malformed action: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Shown to the user as a blocking alert; nothing else happens.
    #[error("Please create a comment")]
    EmptyComment,
    #[error("failed to update cached comments: {0:#}")]
    Cache(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid graphql endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        source: url::ParseError,
    },
    #[error("graphql request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        source: serde_json::Error,
    },
    #[error(transparent)]
    GraphQl(#[from] GraphQlException),
}
