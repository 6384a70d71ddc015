use std::sync::Arc;

use axum::{body::Bytes, extract::State as AxumState, http::StatusCode};
use tracing::error;

use crate::{
    error::AppError,
    state::State,
    utils::{Delivery, ingest},
};

pub async fn health_handler() -> &'static str {
    "ok"
}

/// Stores the feedback and notifies the feedback channel.
pub async fn feedback_handler(
    AxumState(state): AxumState<Arc<State>>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    handle(&state, body, Delivery::Notify).await
}

/// Stores the feedback only, used by the songvoter and pro skyblock frontends.
pub async fn silent_feedback_handler(
    AxumState(state): AxumState<Arc<State>>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    handle(&state, body, Delivery::Silent).await
}

async fn handle(state: &State, body: Bytes, delivery: Delivery) -> Result<StatusCode, AppError> {
    // duplicates also answer 204, the content is already stored
    match ingest(state, body, delivery).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("There was an error when handling feedback: {e}");
            state.metrics.error(e.source_label());
            Err(e)
        }
    }
}
