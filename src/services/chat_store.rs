// src/services/chat_store.rs
//! Persistence of generated titles in the external GraphQL data service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

pub const ADMIN_SECRET_HEADER: &str = "x-hasura-admin-secret";

pub const UPDATE_CHAT_TITLE: &str = r#"
mutation UpdateChatTitle($chatId: uuid!, $title: String!) {
  update_chats_by_pk(pk_columns: { id: $chatId }, _set: { title: $title }) {
    id
    title
  }
}
"#;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("GraphQL request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GraphQL endpoint returned {status}")]
    Status { status: StatusCode },

    #[error("unreadable GraphQL response: {0}")]
    Decode(String),

    #[error("GraphQL mutation rejected: {}", first_message(.0))]
    GraphQl(Vec<GraphQlError>),
}

impl StoreError {
    /// True when the service answered but refused the mutation.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::GraphQl(_))
    }
}

fn first_message(errors: &[GraphQlError]) -> &str {
    errors
        .first()
        .map(|e| e.message.as_str())
        .unwrap_or("no error detail")
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn update_chat_title(&self, chat_id: &str, title: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct HasuraClient {
    client: Client,
    endpoint: String,
    admin_secret: String,
}

impl HasuraClient {
    pub fn new(endpoint: impl Into<String>, admin_secret: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            admin_secret: admin_secret.into(),
        }
    }
}

#[async_trait]
impl ChatStore for HasuraClient {
    async fn update_chat_title(&self, chat_id: &str, title: &str) -> Result<(), StoreError> {
        let body = json!({
            "query": UPDATE_CHAT_TITLE,
            "variables": { "chatId": chat_id, "title": title },
        });

        debug!(chat_id, "sending UpdateChatTitle mutation");
        let response = self
            .client
            .post(&self.endpoint)
            .header(ADMIN_SECRET_HEADER, &self.admin_secret)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let parsed: GraphQlResponse = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        // GraphQL errors win over the transport status: Hasura reports
        // validation and permission failures with a JSON error list.
        match parsed.errors {
            Some(errors) if !errors.is_empty() => Err(StoreError::GraphQl(errors)),
            _ if !status.is_success() => Err(StoreError::Status { status }),
            _ => Ok(()),
        }
    }
}
