// src/config.rs
use std::{env, fmt, net::SocketAddr};

use thiserror::Error;

use crate::services::completion::DEFAULT_OPENAI_BASE_URL;

pub const DEFAULT_PORT: u16 = 4000;

/// Browser origins allowed to call the relay. Requests without an `Origin`
/// header are not subject to this list.
pub const ALLOWED_ORIGINS: &[&str] = &[
    "https://chat-bot-lake-chi.vercel.app",
    "https://chat-bot-cypher.netlify.app",
    "http://localhost:3000",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BACKEND_PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),
}

#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub graphql_endpoint: String,
    pub graphql_admin_secret: String,
    pub port: u16,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_base_url", &self.openai_base_url)
            .field("graphql_endpoint", &self.graphql_endpoint)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("BACKEND_PORT") {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => return Err(ConfigError::InvalidPort(raw)),
            },
            None => DEFAULT_PORT,
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            graphql_endpoint: get("HASURA_GRAPHQL_ENDPOINT").unwrap_or_default(),
            graphql_admin_secret: get("HASURA_ADMIN_SECRET").unwrap_or_default(),
            port,
        })
    }

    /// Names of settings that are unset. The relay still starts; calls that
    /// need them fail at the upstream.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("HASURA_GRAPHQL_ENDPOINT", &self.graphql_endpoint),
            ("HASURA_ADMIN_SECRET", &self.graphql_admin_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
