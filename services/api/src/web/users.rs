//! services/api/src/web/users.rs
//!
//! Profile and skill-match endpoints for the logged-in user.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Extension, Json,
};
use skill_swap_core::domain::SkillsUpdate;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{http_error, ErrorBody, HttpError};
use crate::web::dto::{json_body, MatchResponse, ProfileResponse, UpdateSkillsRequest};
use crate::web::state::AppState;

/// GET /users/me - The logged-in user's own profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Own profile", body = ProfileResponse),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 404, description = "User no longer exists", body = ErrorBody)
    )
)]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = state.db.get_profile(user_id).await.map_err(http_error)?;
    Ok(Json(ProfileResponse::from(profile)))
}

/// PUT /users/me - Replace the skill lists that are present in the body
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateSkillsRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn update_skills(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<UpdateSkillsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let req = json_body(payload)?;
    let profile = state
        .db
        .update_skills(
            user_id,
            SkillsUpdate {
                teach_skills: req.skills_to_teach,
                learn_skills: req.skills_to_learn,
            },
        )
        .await
        .map_err(http_error)?;
    info!(%user_id, "skills updated");
    Ok(Json(ProfileResponse::from(profile)))
}

/// GET /users/matches - Users with a complementary skill in either direction
#[utoipa::path(
    get,
    path = "/api/users/matches",
    responses(
        (status = 200, description = "Matching users", body = [MatchResponse]),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 404, description = "User no longer exists", body = ErrorBody)
    )
)]
pub async fn get_matches(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let matches = state
        .matcher
        .matches_for(user_id)
        .await
        .map_err(http_error)?;
    let body: Vec<MatchResponse> = matches.into_iter().map(Into::into).collect();
    Ok(Json(body))
}
