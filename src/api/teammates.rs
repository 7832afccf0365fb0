//! Teammate resolution endpoint.

use axum::extract::{Path, State};

use super::{success, ApiResult};
use crate::auth::Principal;
use crate::membership::{self, Teammate};
use crate::AppState;

/// GET /api/projects/:id/teammates - The teammates the caller may message
/// and rate within a project. Empty for anyone who is neither the owner nor
/// an approved applicant.
pub async fn list_teammates(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    principal: Principal,
) -> ApiResult<Vec<Teammate>> {
    let teammates =
        membership::resolve_teammates(&state.repo, &project_id, &principal.id).await?;
    success(teammates)
}
