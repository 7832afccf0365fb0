//! Project API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::auth::Principal;
use crate::errors::AppError;
use crate::models::{CreateProjectRequest, Project, UpdateProjectRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    /// Restrict the listing to one author's projects.
    pub author: Option<String>,
}

/// GET /api/projects - List projects, newest first.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Vec<Project>> {
    let projects = match query.author {
        Some(author_id) => state.repo.list_projects_by_author(&author_id).await?,
        None => state.repo.list_projects().await?,
    };

    success(projects)
}

/// GET /api/projects/:id - Get a single project.
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Project> {
    let project = state
        .repo
        .get_project(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;

    success(project)
}

/// POST /api/projects - Post a new project.
pub async fn create_project(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Project> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    if request.duration.trim().is_empty() {
        return Err(AppError::Validation("Duration is required".to_string()));
    }
    if request.team_size < 1 {
        return Err(AppError::Validation(
            "Team size must be at least 1".to_string(),
        ));
    }

    let project = state
        .repo
        .create_project(&principal, &request.author_role, &request)
        .await?;

    tracing::info!(project_id = %project.id, author_id = %principal.id, "Project created");

    success(project)
}

/// PUT /api/projects/:id - Update a project (owner only).
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Project> {
    let existing = state
        .repo
        .get_project(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;

    if existing.author_id != principal.id {
        return Err(AppError::Forbidden(
            "Only the project owner can edit this project".to_string(),
        ));
    }

    if let Some(team_size) = request.team_size {
        if team_size < 1 {
            return Err(AppError::Validation(
                "Team size must be at least 1".to_string(),
            ));
        }
    }

    let project = state.repo.update_project(&id, &request).await?;

    success(project)
}

/// DELETE /api/projects/:id - Delete a project (owner only). Applications,
/// messages, and ratings for the project are deleted with it.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
) -> ApiResult<()> {
    let existing = state
        .repo
        .get_project(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;

    if existing.author_id != principal.id {
        return Err(AppError::Forbidden(
            "Only the project owner can delete this project".to_string(),
        ));
    }

    state.repo.delete_project(&id).await?;
    state.hub.remove(&id).await;

    tracing::info!(project_id = %id, author_id = %principal.id, "Project deleted");

    success(())
}
