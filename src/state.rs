// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::chat_store::{ChatStore, HasuraClient};
use crate::services::completion::{CompletionApi, OpenAiClient};

pub type SharedState = Arc<AppState>;

/// Upstream clients handed to the handlers. Nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<dyn CompletionApi>,
    pub chat_store: Arc<dyn ChatStore>,
}

impl AppState {
    pub fn new(completion: Arc<dyn CompletionApi>, chat_store: Arc<dyn ChatStore>) -> Self {
        Self {
            completion,
            chat_store,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(OpenAiClient::new(&config.openai_api_key, &config.openai_base_url)),
            Arc::new(HasuraClient::new(&config.graphql_endpoint, &config.graphql_admin_secret)),
        )
    }
}
