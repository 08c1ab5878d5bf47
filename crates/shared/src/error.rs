use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlLocation {
    pub line: u32,
    pub column: u32,
}

/// One entry of a GraphQL response `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GraphQlLocation>,
}

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            path: Vec::new(),
            locations: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
#[error("graphql {operation} failed: {}", summarize(.errors))]
pub struct GraphQlException {
    pub operation: &'static str,
    pub errors: Vec<GraphQlError>,
}

impl GraphQlException {
    pub fn new(operation: &'static str, errors: Vec<GraphQlError>) -> Self {
        Self { operation, errors }
    }
}

fn summarize(errors: &[GraphQlError]) -> String {
    if errors.is_empty() {
        return "response carried no data".to_string();
    }
    errors
        .iter()
        .map(|err| match &err.error_type {
            Some(kind) => format!("{kind}: {}", err.message),
            None => err.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
