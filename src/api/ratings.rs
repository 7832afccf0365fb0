//! Rating API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::auth::Principal;
use crate::models::{Rating, SubmitRatingRequest, UserRatingStats};
use crate::ratings;
use crate::AppState;

/// POST /api/projects/:id/ratings - Rate a teammate on a project.
pub async fn submit_rating(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    principal: Principal,
    Json(request): Json<SubmitRatingRequest>,
) -> ApiResult<Rating> {
    let rating = ratings::submit(&state.repo, &project_id, &principal, &request).await?;
    success(rating)
}

/// GET /api/projects/:id/ratings/:rated_user_id - The caller's existing
/// rating for a teammate, if any. Ratings are immutable, so the UI uses
/// this to render an already-submitted rating read-only.
pub async fn get_my_rating(
    State(state): State<AppState>,
    Path((project_id, rated_user_id)): Path<(String, String)>,
    principal: Principal,
) -> ApiResult<Option<Rating>> {
    let rating =
        ratings::check_existing(&state.repo, &project_id, &principal.id, &rated_user_id).await?;
    success(rating)
}

/// GET /api/users/:id/ratings - Ratings a user has received.
pub async fn list_user_ratings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Rating>> {
    let received = ratings::ratings_for(&state.repo, &user_id).await?;
    success(received)
}

/// GET /api/users/:id/rating-stats - Aggregate rating stats for a user.
/// `data` is null when the user has no ratings yet.
pub async fn get_user_rating_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Option<UserRatingStats>> {
    let stats = ratings::stats_for(&state.repo, &user_id).await?;
    success(stats)
}
