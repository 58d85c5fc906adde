//! Passage lookup endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, RetrievedPassage};

use super::parse_body;

/// POST /query - Return the passages closest to a query
pub async fn query_passages(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Vec<RetrievedPassage>>> {
    let request = parse_body(payload)?;
    tracing::debug!("Query: \"{}\"", request.query);

    let passages = state
        .retriever()
        .retrieve(&request.query, state.config().retrieval.query_top_k)
        .await
        .map_err(|e| {
            tracing::error!("Query failed: {}", e);
            e
        })?;

    Ok(Json(passages))
}
