//! Project model and request DTOs.

use serde::{Deserialize, Serialize};

/// A posted project looking for collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub author_name: String,
    pub author_role: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub roles_needed: Vec<String>,
    pub duration: String,
    pub team_size: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for posting a new project. Author fields come from the
/// authenticated principal, never from the body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub roles_needed: Vec<String>,
    pub duration: String,
    pub team_size: i64,
    /// The author's own role on the team, from their profile.
    #[serde(default = "default_author_role")]
    pub author_role: String,
}

fn default_author_role() -> String {
    "Developer".to_string()
}

/// Request body for updating an existing project (owner only).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub roles_needed: Option<Vec<String>>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub team_size: Option<i64>,
}
