//! Application Lifecycle Manager.
//!
//! State machine per application: pending is the initial state, approved
//! and rejected are terminal. Submission and status transitions live here;
//! handlers only translate HTTP.

use crate::auth::Principal;
use crate::db::Repository;
use crate::errors::AppError;
use crate::membership;
use crate::models::{Application, ApplicationStatus, SubmitApplicationRequest};

/// Submit an application to a project.
///
/// Fails with NotFound if the project is absent, Validation on malformed
/// input or a role the project doesn't need, and Conflict if the applicant
/// already has a pending application for this project.
pub async fn submit(
    repo: &Repository,
    project_id: &str,
    applicant: &Principal,
    request: &SubmitApplicationRequest,
) -> Result<Application, AppError> {
    let role = request.role.trim();
    let message = request.message.trim();

    if role.is_empty() {
        return Err(AppError::Validation("Role is required".to_string()));
    }
    if message.is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let project = repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

    if project.author_id == applicant.id {
        return Err(AppError::Validation(
            "You cannot apply to your own project".to_string(),
        ));
    }

    // Projects that declare open roles only accept applications for one of
    // them; projects without a role list accept freeform roles.
    if !project.roles_needed.is_empty() && !project.roles_needed.iter().any(|r| r == role) {
        return Err(AppError::Validation(format!(
            "Role '{}' is not open on this project",
            role
        )));
    }

    if repo
        .find_pending_application(project_id, &applicant.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "You already have a pending application for this project".to_string(),
        ));
    }

    let application = repo.create_application(project_id, applicant, request).await?;

    tracing::info!(
        application_id = %application.id,
        project_id = %project_id,
        applicant_id = %applicant.id,
        "Application submitted"
    );

    Ok(application)
}

/// Approve or reject a pending application.
///
/// Only the project author may decide (Forbidden otherwise). Terminal
/// states are immutable: re-deciding an already-decided application fails
/// with Conflict. Losing the race against a concurrent decision is also
/// Conflict, since the write is conditioned on the status still being
/// pending.
pub async fn set_status(
    repo: &Repository,
    application_id: &str,
    new_status: ApplicationStatus,
    principal: &Principal,
) -> Result<Application, AppError> {
    if !new_status.is_terminal() {
        return Err(AppError::Validation(
            "Status must be 'approved' or 'rejected'".to_string(),
        ));
    }

    let application = repo
        .get_application(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {} not found", application_id)))?;

    if !membership::can_manage_applications(repo, &application.project_id, &principal.id).await? {
        return Err(AppError::Forbidden(
            "Only the project owner can decide applications".to_string(),
        ));
    }

    if application.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Application has already been {}",
            application.status.as_str()
        )));
    }

    let transitioned = repo
        .set_application_status(application_id, new_status)
        .await?;

    if !transitioned {
        // A concurrent call won the compare-and-set between our read and
        // this write.
        return Err(AppError::Conflict(
            "Application was decided concurrently".to_string(),
        ));
    }

    tracing::info!(
        application_id = %application_id,
        status = new_status.as_str(),
        decided_by = %principal.id,
        "Application decided"
    );

    repo.get_application(application_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Application {} vanished", application_id)))
}

/// The principal's own applications, newest first.
pub async fn list_for_applicant(
    repo: &Repository,
    principal: &Principal,
) -> Result<Vec<Application>, AppError> {
    repo.list_applications_for_applicant(&principal.id).await
}

/// Applications received across the principal's projects, newest first.
pub async fn list_for_owner(
    repo: &Repository,
    principal: &Principal,
) -> Result<Vec<Application>, AppError> {
    repo.list_applications_for_owner(&principal.id).await
}
