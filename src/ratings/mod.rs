//! Rating Ledger.
//!
//! At most one rating per (project, rater, rated user) tuple, and only
//! between resolved teammates. Ratings are one-shot: there is no update or
//! delete path once a rating is written.

use crate::auth::Principal;
use crate::db::Repository;
use crate::errors::AppError;
use crate::membership;
use crate::models::{Rating, SubmitRatingRequest, UserRatingStats};

/// Look up the rating a user already gave a teammate on a project, if any.
/// Pure lookup, no side effect.
pub async fn check_existing(
    repo: &Repository,
    project_id: &str,
    rater_id: &str,
    rated_user_id: &str,
) -> Result<Option<Rating>, AppError> {
    repo.find_rating(project_id, rater_id, rated_user_id).await
}

/// Submit a rating for a teammate on a shared project.
///
/// The rated user must appear in the rater's resolved teammate set
/// (Forbidden otherwise), and the tuple must not have been rated before
/// (Conflict). A concurrent duplicate insert is caught by the unique index
/// and also surfaces as Conflict.
pub async fn submit(
    repo: &Repository,
    project_id: &str,
    rater: &Principal,
    request: &SubmitRatingRequest,
) -> Result<Rating, AppError> {
    if !(1..=5).contains(&request.rating) {
        return Err(AppError::Validation(
            "Rating must be an integer between 1 and 5".to_string(),
        ));
    }

    let teammates = membership::resolve_teammates(repo, project_id, &rater.id).await?;
    if !teammates.iter().any(|t| t.id == request.rated_user_id) {
        return Err(AppError::Forbidden(
            "You can only rate teammates on projects you collaborated on".to_string(),
        ));
    }

    if check_existing(repo, project_id, &rater.id, &request.rated_user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "You have already rated this teammate for this project".to_string(),
        ));
    }

    let rating = repo.create_rating(project_id, &rater.id, request).await?;

    tracing::info!(
        project_id = %project_id,
        rater_id = %rater.id,
        rated_user_id = %request.rated_user_id,
        rating = request.rating,
        "Rating submitted"
    );

    Ok(rating)
}

/// Ratings received by a user, newest first.
pub async fn ratings_for(repo: &Repository, user_id: &str) -> Result<Vec<Rating>, AppError> {
    repo.list_ratings_for_user(user_id).await
}

/// Aggregate stats for a user. Absent means no ratings yet, which is a
/// benign default rather than an error.
pub async fn stats_for(
    repo: &Repository,
    user_id: &str,
) -> Result<Option<UserRatingStats>, AppError> {
    repo.rating_stats(user_id).await
}
