//! Application API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::auth::Principal;
use crate::errors::AppError;
use crate::lifecycle;
use crate::membership;
use crate::models::{Application, SubmitApplicationRequest, UpdateStatusRequest};
use crate::AppState;

/// POST /api/projects/:id/applications - Apply to a project.
pub async fn submit_application(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    principal: Principal,
    Json(request): Json<SubmitApplicationRequest>,
) -> ApiResult<Application> {
    let application = lifecycle::submit(&state.repo, &project_id, &principal, &request).await?;
    success(application)
}

/// GET /api/projects/:id/applications - All applications to a project
/// (owner only).
pub async fn list_project_applications(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    principal: Principal,
) -> ApiResult<Vec<Application>> {
    if !membership::can_manage_applications(&state.repo, &project_id, &principal.id).await? {
        return Err(AppError::Forbidden(
            "Only the project owner can view applications".to_string(),
        ));
    }

    let applications = state.repo.list_applications_for_project(&project_id).await?;
    success(applications)
}

/// GET /api/applications - The caller's own applications.
pub async fn list_my_applications(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Vec<Application>> {
    let applications = lifecycle::list_for_applicant(&state.repo, &principal).await?;
    success(applications)
}

/// GET /api/applications/received - Applications to the caller's projects.
pub async fn list_received_applications(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Vec<Application>> {
    let applications = lifecycle::list_for_owner(&state.repo, &principal).await?;
    success(applications)
}

/// PATCH /api/applications/:id/status - Approve or reject an application
/// (project owner only).
pub async fn update_application_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Application> {
    let application = lifecycle::set_status(&state.repo, &id, request.status, &principal).await?;
    success(application)
}
