// src/routes/mod.rs
pub mod chat;

use std::sync::Arc;

use crate::{error::AppError, state::SharedState};
use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use chat::{generate_reply_handler, generate_title_handler};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const LIVENESS_MESSAGE: &str = "Backend API is running 🚀";

/// Origins permitted by the relay, parsed once at router construction.
#[derive(Clone, Debug)]
pub struct AllowedOrigins(Arc<Vec<HeaderValue>>);

impl AllowedOrigins {
    pub fn new(origins: &[&str]) -> Self {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("ignoring unparseable allowed origin {origin:?}");
                    None
                }
            })
            .collect();
        Self(Arc::new(parsed))
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        self.0.iter().any(|allowed| allowed == origin)
    }

    fn to_vec(&self) -> Vec<HeaderValue> {
        self.0.as_ref().clone()
    }
}

pub fn create_router(allowed_origins: &[&str]) -> Router<SharedState> {
    let origins = AllowedOrigins::new(allowed_origins);

    let cors = CorsLayer::new()
        .allow_origin(origins.to_vec())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(|| async { LIVENESS_MESSAGE }).fallback(not_found_handler))
        .route("/generate-reply", post(generate_reply_handler).fallback(not_found_handler))
        .route("/generate-title", post(generate_title_handler).fallback(not_found_handler))
        .fallback(not_found_handler)
        .layer(cors)
        .layer(middleware::from_fn_with_state(origins, origin_guard))
        .layer(TraceLayer::new_for_http())
}

async fn origin_guard(
    State(origins): State<AllowedOrigins>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // No Origin header means a non-browser caller (curl, server-side tooling).
    if let Some(origin) = req.headers().get(header::ORIGIN) {
        if !origins.allows(origin) {
            let origin = String::from_utf8_lossy(origin.as_bytes()).into_owned();
            return Err(AppError::OriginRejected(origin));
        }
    }
    Ok(next.run(req).await)
}

pub async fn not_found_handler() -> AppError {
    AppError::NotFound
}
