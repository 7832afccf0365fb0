//! Membership Resolver.
//!
//! Team membership is derived, never stored. Who counts as a "teammate"
//! within a project is computed from the project row and its approved
//! applications on every call, so authorization is always checked against
//! fresh state. This module is the single place that rule lives; messaging
//! and rating both consult it.

use serde::Serialize;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{Application, ApplicationStatus, Project};

/// Role tag shown for the project author in teammate listings.
pub const PROJECT_OWNER_ROLE: &str = "Project Owner";

/// A principal the requester may message and rate within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teammate {
    pub id: String,
    pub name: String,
    pub role: String,
}

/// Classify a principal's teammates from a consistent snapshot.
///
/// The owner sees every approved applicant tagged with their applied role.
/// An approved applicant sees the owner first, then every other approved
/// applicant. Anyone else has no teammates and, by extension, no access to
/// the project's chat or ratings. The requester never appears in their own
/// result.
pub fn classify_teammates(
    project: &Project,
    approved: &[Application],
    principal_id: &str,
) -> Vec<Teammate> {
    let is_owner = project.author_id == principal_id;
    let is_approved_applicant = approved.iter().any(|a| a.applicant_id == principal_id);

    if !is_owner && !is_approved_applicant {
        return Vec::new();
    }

    let mut teammates = Vec::new();

    if !is_owner {
        teammates.push(Teammate {
            id: project.author_id.clone(),
            name: project.author_name.clone(),
            role: PROJECT_OWNER_ROLE.to_string(),
        });
    }

    teammates.extend(
        approved
            .iter()
            .filter(|a| a.applicant_id != principal_id)
            .map(|a| Teammate {
                id: a.applicant_id.clone(),
                name: a.applicant_name.clone(),
                role: a.role.clone(),
            }),
    );

    teammates
}

/// Resolve the teammates a principal may rate/message within a project.
///
/// Side-effect free; fails with NotFound if the project is absent.
pub async fn resolve_teammates(
    repo: &Repository,
    project_id: &str,
    principal_id: &str,
) -> Result<Vec<Teammate>, AppError> {
    let project = repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

    let approved = repo
        .list_applications_by_status(project_id, ApplicationStatus::Approved)
        .await?;

    Ok(classify_teammates(&project, &approved, principal_id))
}

/// Whether a principal may view and decide applications for a project.
/// Only the project author may.
pub async fn can_manage_applications(
    repo: &Repository,
    project_id: &str,
    principal_id: &str,
) -> Result<bool, AppError> {
    let project = repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

    Ok(project.author_id == principal_id)
}

/// Whether a principal belongs to a project's team: the owner, or any
/// applicant with an approved application.
pub async fn is_team_member(
    repo: &Repository,
    project_id: &str,
    principal_id: &str,
) -> Result<bool, AppError> {
    let project = repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

    if project.author_id == principal_id {
        return Ok(true);
    }

    let approved = repo
        .list_applications_by_status(project_id, ApplicationStatus::Approved)
        .await?;

    Ok(approved.iter().any(|a| a.applicant_id == principal_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(author_id: &str, author_name: &str) -> Project {
        Project {
            id: "p1".to_string(),
            title: "Campus Marketplace".to_string(),
            description: "A marketplace for students".to_string(),
            author_id: author_id.to_string(),
            author_name: author_name.to_string(),
            author_role: "Developer".to_string(),
            skills: vec![],
            roles_needed: vec!["Frontend Developer".to_string()],
            duration: "3 months".to_string(),
            team_size: 4,
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            updated_at: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn approved(applicant_id: &str, applicant_name: &str, role: &str) -> Application {
        Application {
            id: format!("app-{}", applicant_id),
            project_id: "p1".to_string(),
            applicant_id: applicant_id.to_string(),
            applicant_name: applicant_name.to_string(),
            role: role.to_string(),
            message: "I'd love to help".to_string(),
            github_profile: None,
            portfolio_link: None,
            status: ApplicationStatus::Approved,
            project_title: None,
            created_at: "2025-01-02T00:00:00+00:00".to_string(),
            updated_at: "2025-01-03T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_owner_sees_all_approved_applicants() {
        let p = project("alice", "Alice");
        let apps = vec![
            approved("bob", "Bob", "Frontend Developer"),
            approved("carol", "Carol", "Backend Developer"),
        ];

        let teammates = classify_teammates(&p, &apps, "alice");

        assert_eq!(teammates.len(), 2);
        assert_eq!(teammates[0].id, "bob");
        assert_eq!(teammates[0].role, "Frontend Developer");
        assert_eq!(teammates[1].id, "carol");
        assert!(teammates.iter().all(|t| t.id != "alice"));
    }

    #[test]
    fn test_approved_applicant_sees_owner_and_other_applicants() {
        let p = project("alice", "Alice");
        let apps = vec![
            approved("bob", "Bob", "Frontend Developer"),
            approved("carol", "Carol", "Backend Developer"),
        ];

        let teammates = classify_teammates(&p, &apps, "bob");

        assert_eq!(teammates.len(), 2);
        assert_eq!(teammates[0].id, "alice");
        assert_eq!(teammates[0].role, PROJECT_OWNER_ROLE);
        assert_eq!(teammates[1].id, "carol");
        assert!(teammates.iter().all(|t| t.id != "bob"));
    }

    #[test]
    fn test_outsider_has_no_teammates() {
        let p = project("alice", "Alice");
        let apps = vec![approved("bob", "Bob", "Frontend Developer")];

        assert!(classify_teammates(&p, &apps, "mallory").is_empty());
    }

    #[test]
    fn test_sole_approved_applicant_sees_only_owner() {
        let p = project("alice", "Alice");
        let apps = vec![approved("bob", "Bob", "Frontend Developer")];

        let teammates = classify_teammates(&p, &apps, "bob");

        assert_eq!(teammates.len(), 1);
        assert_eq!(teammates[0].id, "alice");
        assert_eq!(teammates[0].name, "Alice");
        assert_eq!(teammates[0].role, PROJECT_OWNER_ROLE);
    }

    #[test]
    fn test_owner_with_no_applicants_sees_empty_team() {
        let p = project("alice", "Alice");

        assert!(classify_teammates(&p, &[], "alice").is_empty());
    }
}
