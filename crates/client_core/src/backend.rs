use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Comment, TalkId},
    error::GraphQlException,
    protocol::{
        self, CreateCommentData, GraphQlRequest, GraphQlResponse, ListCommentsForTalkData,
    },
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

const API_KEY_HEADER: &str = "x-api-key";

/// Remote list-and-create API for talk comments.
#[async_trait]
pub trait CommentsBackend: Send + Sync {
    async fn list_comments_for_talk(&self, talk_id: &TalkId) -> Result<Vec<Comment>>;
    /// Returns the stored record when the backend echoes one back.
    async fn create_comment(&self, comment: &Comment) -> Result<Option<Comment>>;
}

pub struct MissingCommentsBackend;

#[async_trait]
impl CommentsBackend for MissingCommentsBackend {
    async fn list_comments_for_talk(&self, talk_id: &TalkId) -> Result<Vec<Comment>> {
        Err(anyhow!(
            "comments backend unavailable; cannot list comments for talk {talk_id}"
        ))
    }

    async fn create_comment(&self, comment: &Comment) -> Result<Option<Comment>> {
        Err(anyhow!(
            "comments backend unavailable; cannot create comment for talk {}",
            comment.talk_id
        ))
    }
}

/// GraphQL-over-HTTP client for an AppSync-style endpoint.
pub struct GraphQlBackend {
    http: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GraphQlBackend {
    pub fn new(endpoint: &str, api_key: Option<String>) -> std::result::Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint).map_err(|source| ClientError::InvalidEndpoint {
            url: endpoint.to_string(),
            source,
        })?;
        Ok(Self {
            http: Client::new(),
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn execute<V, D>(
        &self,
        operation: &'static str,
        request: &GraphQlRequest<V>,
    ) -> std::result::Result<D, ClientError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let mut builder = self.http.post(self.endpoint.clone()).json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, api_key);
        }
        let body = builder.send().await?.error_for_status()?.bytes().await?;
        debug!(operation, bytes = body.len(), "graphql response received");

        let response: GraphQlResponse<D> = serde_json::from_slice(&body)
            .map_err(|source| ClientError::Decode { operation, source })?;
        if !response.errors.is_empty() {
            return Err(GraphQlException::new(operation, response.errors).into());
        }
        response
            .data
            .ok_or_else(|| GraphQlException::new(operation, Vec::new()).into())
    }

    pub async fn list_comments(
        &self,
        talk_id: &TalkId,
    ) -> std::result::Result<Vec<Comment>, ClientError> {
        let data: ListCommentsForTalkData = self
            .execute(
                "listCommentsForTalk",
                &protocol::list_comments_for_talk(talk_id.clone()),
            )
            .await?;
        Ok(data.list_comments_for_talk.items)
    }

    pub async fn put_comment(
        &self,
        comment: &Comment,
    ) -> std::result::Result<Option<Comment>, ClientError> {
        let data: CreateCommentData = self
            .execute("createComment", &protocol::create_comment(comment.clone()))
            .await?;
        Ok(data.create_comment)
    }
}

#[async_trait]
impl CommentsBackend for GraphQlBackend {
    async fn list_comments_for_talk(&self, talk_id: &TalkId) -> Result<Vec<Comment>> {
        Ok(self.list_comments(talk_id).await?)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<Option<Comment>> {
        Ok(self.put_comment(comment).await?)
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
