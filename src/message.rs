// src/message.rs
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct ReplyRequest {
    pub message: Option<String>,
}

impl ReplyRequest {
    pub fn into_message(self) -> Result<String, AppError> {
        required(self.message)
            .ok_or_else(|| AppError::Validation("Message is required".to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub reply: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleRequest {
    pub chat_id: Option<String>,
    pub first_message: Option<String>,
}

impl TitleRequest {
    /// Returns `(chat_id, first_message)` when both are present and non-empty.
    pub fn into_parts(self) -> Result<(String, String), AppError> {
        match (required(self.chat_id), required(self.first_message)) {
            (Some(chat_id), Some(first_message)) => Ok((chat_id, first_message)),
            _ => Err(AppError::Validation("chatId and firstMessage are required".to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleResponse {
    pub chat_id: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
