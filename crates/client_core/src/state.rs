use serde::{Deserialize, Serialize};
use shared::domain::Comment;

use crate::error::ReducerError;

const ACTION_TYPES: [&str; 4] = ["set", "add", "error", "setLoading"];

/// What a talk thread shows. `comments` keeps insertion order; display order
/// is derived at render time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub loading: bool,
    pub loaded: bool,
    pub comments: Vec<Comment>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Set { comments: Vec<Comment> },
    Add { comment: Comment },
    Error { error: String },
    SetLoading,
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Set { .. } => "set",
            Action::Add { .. } => "add",
            Action::Error { .. } => "error",
            Action::SetLoading => "setLoading",
        }
    }

    /// Decodes a `type`-tagged action. Tags outside the four known kinds are
    /// rejected as unknown rather than malformed.
    pub fn from_json(raw: &str) -> Result<Self, ReducerError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(ReducerError::Malformed)?;
        match value.get("type").and_then(serde_json::Value::as_str) {
            Some(kind) if ACTION_TYPES.contains(&kind) => {}
            Some(kind) => return Err(ReducerError::UnknownAction(kind.to_string())),
            None => return Err(ReducerError::UnknownAction(String::new())),
        }
        serde_json::from_value(value).map_err(ReducerError::Malformed)
    }
}

pub fn reduce(mut state: ViewState, action: Action) -> ViewState {
    match action {
        Action::Set { comments } => {
            state.comments = comments;
            state.loading = false;
            state.loaded = true;
        }
        Action::Add { comment } => {
            state.comments.insert(0, comment);
        }
        Action::Error { error } => {
            state.error = Some(error);
        }
        Action::SetLoading => {
            state.loading = true;
        }
    }
    state
}

/// Applies an encoded action; anything that does not decode to a known
/// action fails without touching the state.
pub fn reduce_json(state: ViewState, raw: &str) -> Result<ViewState, ReducerError> {
    let action = Action::from_json(raw)?;
    Ok(reduce(state, action))
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
