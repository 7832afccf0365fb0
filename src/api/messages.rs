//! Team messaging endpoints.
//!
//! Reading and posting are both gated on derived team membership. Live
//! updates are served over SSE from the in-process message hub; the
//! messages table remains the durable record and clients deduplicate on
//! message id.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use super::{success, ApiResult};
use crate::auth::Principal;
use crate::errors::AppError;
use crate::membership;
use crate::models::{Message, PostMessageRequest};
use crate::AppState;

/// GET /api/projects/:id/messages - Chat history, oldest first (team only).
pub async fn list_messages(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    principal: Principal,
) -> ApiResult<Vec<Message>> {
    require_team_member(&state, &project_id, &principal).await?;

    let messages = state.repo.list_messages(&project_id).await?;
    success(messages)
}

/// POST /api/projects/:id/messages - Post a message (team only).
pub async fn post_message(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    principal: Principal,
    Json(request): Json<PostMessageRequest>,
) -> ApiResult<Message> {
    let text = request.message.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    require_team_member(&state, &project_id, &principal).await?;

    let message = state
        .repo
        .create_message(&project_id, &principal, text)
        .await?;

    // Fan out after the insert committed so subscribers only ever see
    // durable messages.
    state.hub.publish(message.clone()).await;

    success(message)
}

/// GET /api/projects/:id/messages/stream - SSE stream of newly posted
/// messages (team only).
pub async fn stream_messages(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    principal: Principal,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    require_team_member(&state, &project_id, &principal).await?;

    let receiver = state.hub.subscribe(&project_id).await;

    let stream = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(message) => Event::default()
            .event("message")
            .json_data(&message)
            .ok()
            .map(Ok),
        // A lagged subscriber missed events; it re-syncs via the history
        // endpoint, so just resume the live stream.
        Err(_) => None,
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn require_team_member(
    state: &AppState,
    project_id: &str,
    principal: &Principal,
) -> Result<(), AppError> {
    if membership::is_team_member(&state.repo, project_id, &principal.id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only team members can access this project's chat".to_string(),
        ))
    }
}
