//! # Concierge Chat Endpoint
//!
//! File: cli/src/commands/serve/handlers.rs
//!
//! ## Overview
//!
//! Request handling for `POST /chat`:
//! - decodes the JSON body (any decoding problem is answered like an empty query),
//! - hands the query to the shared `Responder` on tokio's blocking pool,
//! - maps failures to `{"error": ...}` JSON with a 400 or 500 status.
//!
use crate::common::reply::{ChatReply, Responder};
use crate::core::error::ConciergeError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Message returned for empty, missing or undecodable queries.
const QUERY_REQUIRED: &str = "Query is required";
/// Message returned when the model fails; details stay in the server log.
const GENERATION_FAILED: &str = "Failed to generate a response";

/// State shared by every request.
pub struct AppState {
    pub responder: Responder,
}

/// Body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Errors a chat request can end in, each rendered as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<ConciergeError>() {
            Some(ConciergeError::EmptyQuery) => ApiError::BadRequest(QUERY_REQUIRED.to_string()),
            _ => {
                error!("Failed to answer query: {:#}", err);
                ApiError::Internal(GENERATION_FAILED.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// # Chat Handler (`chat_handler`)
///
/// Answers one query. Greetings and escalations return immediately from the
/// responder; other queries block a pool thread while the model generates.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let query = match payload {
        Ok(Json(request)) => request.query.unwrap_or_default(),
        Err(rejection) => {
            warn!("Rejected chat request body: {}", rejection.body_text());
            return Err(ApiError::BadRequest(QUERY_REQUIRED.to_string()));
        }
    };
    debug!("Received query ({} chars)", query.len());

    let reply = tokio::task::spawn_blocking(move || state.responder.respond(&query))
        .await
        .map_err(|e| {
            error!("Chat worker task failed: {}", e);
            ApiError::Internal(GENERATION_FAILED.to_string())
        })??;

    Ok(Json(reply))
}
