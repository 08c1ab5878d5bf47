use serde::{Deserialize, Serialize};

use crate::{
    domain::{Comment, TalkId},
    error::GraphQlError,
};

pub const LIST_COMMENTS_FOR_TALK: &str = r#"query ListCommentsForTalk($talkId: ID!) {
  listCommentsForTalk(talkId: $talkId) {
    items {
      id
      talkId
      text
      clientId
      createdAt
      createdBy
    }
  }
}"#;

pub const CREATE_COMMENT: &str = r#"mutation CreateComment($input: CreateCommentInput!) {
  createComment(input: $input) {
    id
    talkId
    text
    clientId
    createdAt
    createdBy
  }
}"#;

#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<V> {
    pub query: &'static str,
    pub variables: V,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<D> {
    pub data: Option<D>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsForTalkVariables {
    pub talk_id: TalkId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsForTalkData {
    pub list_comments_for_talk: CommentConnection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentConnection {
    #[serde(default)]
    pub items: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentVariables {
    pub input: Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentData {
    pub create_comment: Option<Comment>,
}

pub fn list_comments_for_talk(
    talk_id: TalkId,
) -> GraphQlRequest<ListCommentsForTalkVariables> {
    GraphQlRequest {
        query: LIST_COMMENTS_FOR_TALK,
        variables: ListCommentsForTalkVariables { talk_id },
    }
}

pub fn create_comment(input: Comment) -> GraphQlRequest<CreateCommentVariables> {
    GraphQlRequest {
        query: CREATE_COMMENT,
        variables: CreateCommentVariables { input },
    }
}
