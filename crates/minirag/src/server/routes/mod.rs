//! API routes for the RAG server

pub mod chat;
pub mod debug;
pub mod query;

use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query_passages))
        .route("/chat", post(chat::chat))
        .route("/debug/db", get(debug::debug_db))
}

/// Unwrap a JSON body, reporting any rejection as a bad request
pub(crate) fn parse_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(Error::BadRequest(rejection.body_text()))
        }
    }
}
