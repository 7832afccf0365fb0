//! Database repository for CRUD operations.
//!
//! Uses prepared statements throughout. Status transitions and rating
//! inserts rely on conditional updates and unique indexes for correctness
//! under concurrency.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::auth::Principal;
use crate::errors::AppError;
use crate::models::{
    Application, ApplicationStatus, CreateProjectRequest, Message, Project, Rating,
    SubmitApplicationRequest, SubmitRatingRequest, UpdateProjectRequest, UserRatingStats,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== PROJECT OPERATIONS ====================

    /// List all projects, newest first.
    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, description, author_id, author_name, author_role, skills, \
             roles_needed, duration, team_size, created_at, updated_at \
             FROM projects ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    /// List projects authored by a user, newest first.
    pub async fn list_projects_by_author(&self, author_id: &str) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, description, author_id, author_name, author_role, skills, \
             roles_needed, duration, team_size, created_at, updated_at \
             FROM projects WHERE author_id = ? ORDER BY created_at DESC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    /// Get a project by ID.
    pub async fn get_project(&self, id: &str) -> Result<Option<Project>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, description, author_id, author_name, author_role, skills, \
             roles_needed, duration, team_size, created_at, updated_at \
             FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(project_from_row))
    }

    /// Create a new project owned by the given principal.
    pub async fn create_project(
        &self,
        author: &Principal,
        author_role: &str,
        request: &CreateProjectRequest,
    ) -> Result<Project, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let skills_json = serde_json::to_string(&request.skills)?;
        let roles_json = serde_json::to_string(&request.roles_needed)?;

        sqlx::query(
            "INSERT INTO projects (id, title, description, author_id, author_name, author_role, \
             skills, roles_needed, duration, team_size, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&author.id)
        .bind(&author.name)
        .bind(author_role)
        .bind(&skills_json)
        .bind(&roles_json)
        .bind(&request.duration)
        .bind(request.team_size)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Project {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            author_role: author_role.to_string(),
            skills: request.skills.clone(),
            roles_needed: request.roles_needed.clone(),
            duration: request.duration.clone(),
            team_size: request.team_size,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a project. Ownership is checked by the caller.
    pub async fn update_project(
        &self,
        id: &str,
        request: &UpdateProjectRequest,
    ) -> Result<Project, AppError> {
        let existing = self
            .get_project(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;

        let now = Utc::now().to_rfc3339();

        let title = request.title.as_ref().unwrap_or(&existing.title);
        let description = request
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let skills = request.skills.clone().unwrap_or(existing.skills.clone());
        let roles_needed = request
            .roles_needed
            .clone()
            .unwrap_or(existing.roles_needed.clone());
        let duration = request.duration.as_ref().unwrap_or(&existing.duration);
        let team_size = request.team_size.unwrap_or(existing.team_size);

        let skills_json = serde_json::to_string(&skills)?;
        let roles_json = serde_json::to_string(&roles_needed)?;

        sqlx::query(
            "UPDATE projects SET title = ?, description = ?, skills = ?, roles_needed = ?, \
             duration = ?, team_size = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(&skills_json)
        .bind(&roles_json)
        .bind(duration)
        .bind(team_size)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Project {
            id: id.to_string(),
            title: title.clone(),
            description: description.clone(),
            author_id: existing.author_id,
            author_name: existing.author_name,
            author_role: existing.author_role,
            skills,
            roles_needed,
            duration: duration.clone(),
            team_size,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a project. Applications, messages, and ratings cascade.
    pub async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }

        Ok(())
    }

    // ==================== APPLICATION OPERATIONS ====================

    /// Get an application by ID.
    pub async fn get_application(&self, id: &str) -> Result<Option<Application>, AppError> {
        let row = sqlx::query(
            "SELECT id, project_id, applicant_id, applicant_name, role, message, \
             github_profile, portfolio_link, status, created_at, updated_at \
             FROM applications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(application_from_row).transpose()
    }

    /// Create an application with status `pending`.
    ///
    /// The partial unique index on (project_id, applicant_id) rejects a
    /// concurrent duplicate that slipped past the caller's pre-check.
    pub async fn create_application(
        &self,
        project_id: &str,
        applicant: &Principal,
        request: &SubmitApplicationRequest,
    ) -> Result<Application, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let role = request.role.trim().to_string();
        let message = request.message.trim().to_string();

        sqlx::query(
            "INSERT INTO applications (id, project_id, applicant_id, applicant_name, role, \
             message, github_profile, portfolio_link, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)",
        )
        .bind(&id)
        .bind(project_id)
        .bind(&applicant.id)
        .bind(&applicant.name)
        .bind(&role)
        .bind(&message)
        .bind(&request.github_profile)
        .bind(&request.portfolio_link)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You already have a pending application for this project".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(Application {
            id,
            project_id: project_id.to_string(),
            applicant_id: applicant.id.clone(),
            applicant_name: applicant.name.clone(),
            role,
            message,
            github_profile: request.github_profile.clone(),
            portfolio_link: request.portfolio_link.clone(),
            status: ApplicationStatus::Pending,
            project_title: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List a user's own applications, newest first, with project titles.
    pub async fn list_applications_for_applicant(
        &self,
        applicant_id: &str,
    ) -> Result<Vec<Application>, AppError> {
        let rows = sqlx::query(
            "SELECT a.id, a.project_id, a.applicant_id, a.applicant_name, a.role, a.message, \
             a.github_profile, a.portfolio_link, a.status, a.created_at, a.updated_at, \
             p.title AS project_title \
             FROM applications a JOIN projects p ON p.id = a.project_id \
             WHERE a.applicant_id = ? ORDER BY a.created_at DESC",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(application_with_title_from_row).collect()
    }

    /// List all applications to projects owned by a user, newest first.
    pub async fn list_applications_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Application>, AppError> {
        let rows = sqlx::query(
            "SELECT a.id, a.project_id, a.applicant_id, a.applicant_name, a.role, a.message, \
             a.github_profile, a.portfolio_link, a.status, a.created_at, a.updated_at, \
             p.title AS project_title \
             FROM applications a JOIN projects p ON p.id = a.project_id \
             WHERE p.author_id = ? ORDER BY a.created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(application_with_title_from_row).collect()
    }

    /// List every application for a project, newest first.
    pub async fn list_applications_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<Application>, AppError> {
        let rows = sqlx::query(
            "SELECT id, project_id, applicant_id, applicant_name, role, message, \
             github_profile, portfolio_link, status, created_at, updated_at \
             FROM applications WHERE project_id = ? ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(application_from_row).collect()
    }

    /// List applications for a project filtered by status, oldest first.
    pub async fn list_applications_by_status(
        &self,
        project_id: &str,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>, AppError> {
        let rows = sqlx::query(
            "SELECT id, project_id, applicant_id, applicant_name, role, message, \
             github_profile, portfolio_link, status, created_at, updated_at \
             FROM applications WHERE project_id = ? AND status = ? ORDER BY created_at",
        )
        .bind(project_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(application_from_row).collect()
    }

    /// Find a pending application for a (project, applicant) pair.
    pub async fn find_pending_application(
        &self,
        project_id: &str,
        applicant_id: &str,
    ) -> Result<Option<Application>, AppError> {
        let row = sqlx::query(
            "SELECT id, project_id, applicant_id, applicant_name, role, message, \
             github_profile, portfolio_link, status, created_at, updated_at \
             FROM applications WHERE project_id = ? AND applicant_id = ? AND status = 'pending'",
        )
        .bind(project_id)
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(application_from_row).transpose()
    }

    /// Transition a pending application to a terminal status.
    ///
    /// Compare-and-set: the UPDATE is conditioned on the status still being
    /// `pending` at write time, so of two concurrent callers exactly one
    /// succeeds and the other observes zero affected rows.
    pub async fn set_application_status(
        &self,
        id: &str,
        new_status: ApplicationStatus,
    ) -> Result<bool, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE applications SET status = ?, updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(new_status.as_str())
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== MESSAGE OPERATIONS ====================

    /// List a project's messages, oldest first.
    pub async fn list_messages(&self, project_id: &str) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query(
            "SELECT id, project_id, user_id, user_name, message, created_at \
             FROM messages WHERE project_id = ? ORDER BY created_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    /// Append a message to a project's chat.
    pub async fn create_message(
        &self,
        project_id: &str,
        author: &Principal,
        text: &str,
    ) -> Result<Message, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO messages (id, project_id, user_id, user_name, message, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(project_id)
        .bind(&author.id)
        .bind(&author.name)
        .bind(text)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id,
            project_id: project_id.to_string(),
            user_id: author.id.clone(),
            user_name: author.name.clone(),
            message: text.to_string(),
            created_at: now,
        })
    }

    // ==================== RATING OPERATIONS ====================

    /// Find the rating a user gave a teammate on a project, if any.
    pub async fn find_rating(
        &self,
        project_id: &str,
        rater_id: &str,
        rated_user_id: &str,
    ) -> Result<Option<Rating>, AppError> {
        let row = sqlx::query(
            "SELECT id, project_id, rater_id, rated_user_id, rating, feedback, \
             created_at, updated_at \
             FROM project_ratings WHERE project_id = ? AND rater_id = ? AND rated_user_id = ?",
        )
        .bind(project_id)
        .bind(rater_id)
        .bind(rated_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(rating_from_row))
    }

    /// Insert a rating.
    ///
    /// The unique index on (project_id, rater_id, rated_user_id) is the
    /// authoritative guard: a concurrent duplicate insert surfaces as
    /// Conflict even when both callers passed the pre-check.
    pub async fn create_rating(
        &self,
        project_id: &str,
        rater_id: &str,
        request: &SubmitRatingRequest,
    ) -> Result<Rating, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO project_ratings (id, project_id, rater_id, rated_user_id, rating, \
             feedback, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(project_id)
        .bind(rater_id)
        .bind(&request.rated_user_id)
        .bind(request.rating)
        .bind(&request.feedback)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You have already rated this teammate for this project".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(Rating {
            id,
            project_id: project_id.to_string(),
            rater_id: rater_id.to_string(),
            rated_user_id: request.rated_user_id.clone(),
            rating: request.rating,
            feedback: request.feedback.clone(),
            project_title: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List ratings received by a user, newest first, with project titles.
    pub async fn list_ratings_for_user(&self, user_id: &str) -> Result<Vec<Rating>, AppError> {
        let rows = sqlx::query(
            "SELECT r.id, r.project_id, r.rater_id, r.rated_user_id, r.rating, r.feedback, \
             r.created_at, r.updated_at, p.title AS project_title \
             FROM project_ratings r JOIN projects p ON p.id = r.project_id \
             WHERE r.rated_user_id = ? ORDER BY r.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(rating_with_title_from_row).collect())
    }

    /// Read a user's aggregate rating stats from the view. Absent means the
    /// user has no ratings yet.
    pub async fn rating_stats(&self, user_id: &str) -> Result<Option<UserRatingStats>, AppError> {
        let row = sqlx::query(
            "SELECT user_id, average_rating, total_ratings, one_star_count, two_star_count, \
             three_star_count, four_star_count, five_star_count \
             FROM user_rating_stats WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserRatingStats {
            user_id: row.get("user_id"),
            average_rating: row.get("average_rating"),
            total_ratings: row.get("total_ratings"),
            one_star_count: row.get("one_star_count"),
            two_star_count: row.get("two_star_count"),
            three_star_count: row.get("three_star_count"),
            four_star_count: row.get("four_star_count"),
            five_star_count: row.get("five_star_count"),
        }))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

// Helper functions for row conversion

fn project_from_row(row: &sqlx::sqlite::SqliteRow) -> Project {
    let skills_str: Option<String> = row.get("skills");
    let roles_str: Option<String> = row.get("roles_needed");
    Project {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        author_id: row.get("author_id"),
        author_name: row.get("author_name"),
        author_role: row.get("author_role"),
        skills: skills_str.map(|s| parse_json_array(&s)).unwrap_or_default(),
        roles_needed: roles_str.map(|s| parse_json_array(&s)).unwrap_or_default(),
        duration: row.get("duration"),
        team_size: row.get("team_size"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn application_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Application, AppError> {
    let status_str: String = row.get("status");
    let status = ApplicationStatus::from_str(&status_str)
        .ok_or_else(|| AppError::Internal(format!("Invalid application status: {}", status_str)))?;

    Ok(Application {
        id: row.get("id"),
        project_id: row.get("project_id"),
        applicant_id: row.get("applicant_id"),
        applicant_name: row.get("applicant_name"),
        role: row.get("role"),
        message: row.get("message"),
        github_profile: row.get("github_profile"),
        portfolio_link: row.get("portfolio_link"),
        status,
        project_title: None,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn application_with_title_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Application, AppError> {
    let mut application = application_from_row(row)?;
    application.project_title = Some(row.get("project_title"));
    Ok(application)
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        project_id: row.get("project_id"),
        user_id: row.get("user_id"),
        user_name: row.get("user_name"),
        message: row.get("message"),
        created_at: row.get("created_at"),
    }
}

fn rating_from_row(row: &sqlx::sqlite::SqliteRow) -> Rating {
    Rating {
        id: row.get("id"),
        project_id: row.get("project_id"),
        rater_id: row.get("rater_id"),
        rated_user_id: row.get("rated_user_id"),
        rating: row.get("rating"),
        feedback: row.get("feedback"),
        project_title: None,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn rating_with_title_from_row(row: &sqlx::sqlite::SqliteRow) -> Rating {
    let mut rating = rating_from_row(row);
    rating.project_title = Some(row.get("project_title"));
    rating
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
