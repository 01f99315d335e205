use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

use crate::{
    error::{AppError, Operation},
    message::{ReplyRequest, ReplyResponse, TitleRequest, TitleResponse},
    services::completion::{COMPLETION_MODEL, ChatMessage, TITLE_INSTRUCTION},
    state::SharedState,
};

/// A body sent without a JSON content type is read as an empty object, so the
/// endpoint's own missing-field message applies.
fn json_or_empty<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

pub async fn generate_reply_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> Result<Json<ReplyResponse>, AppError> {
    let message = json_or_empty(payload)?.into_message()?;

    let reply = state
        .completion
        .complete(COMPLETION_MODEL, vec![ChatMessage::user(message)])
        .await
        .map_err(AppError::from_reply_failure)?;

    Ok(Json(ReplyResponse { reply }))
}

/// Generate a title from the first message, then persist it. A failed
/// persist discards the generated title.
pub async fn generate_title_handler(
    State(state): State<SharedState>,
    payload: Result<Json<TitleRequest>, JsonRejection>,
) -> Result<Json<TitleResponse>, AppError> {
    let (chat_id, first_message) = json_or_empty(payload)?.into_parts()?;

    let messages = vec![
        ChatMessage::system(TITLE_INSTRUCTION),
        ChatMessage::user(first_message),
    ];
    let generated = state
        .completion
        .complete(COMPLETION_MODEL, messages)
        .await
        .map_err(|e| AppError::upstream(Operation::Title, e))?;
    let title = generated.trim().to_string();

    state
        .chat_store
        .update_chat_title(&chat_id, &title)
        .await
        .map_err(AppError::from_store_failure)?;

    info!(chat_id = %chat_id, "chat title updated");
    Ok(Json(TitleResponse { chat_id, title }))
}
