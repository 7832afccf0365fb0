//! Peer rating model and aggregate statistics.

use serde::{Deserialize, Serialize};

/// A one-shot peer rating between two teammates on a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub project_id: String,
    pub rater_id: String,
    pub rated_user_id: String,
    pub rating: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Joined from the projects table on list endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for submitting a rating.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub rated_user_id: String,
    pub rating: i64,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Per-user rating aggregate, read from the `user_rating_stats` view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRatingStats {
    pub user_id: String,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub one_star_count: i64,
    pub two_star_count: i64,
    pub three_star_count: i64,
    pub four_star_count: i64,
    pub five_star_count: i64,
}
