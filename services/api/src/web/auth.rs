//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use skill_swap_core::domain::NewUser;
use skill_swap_core::ports::PortError;
use std::sync::{Arc, OnceLock};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{http_error, ErrorBody, HttpError};
use crate::web::dto::{json_body, MessageResponse, ProfileResponse};
use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub skills_to_teach: Vec<String>,
    #[serde(default)]
    pub skills_to_learn: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    /// The session id, also set as the `session` cookie.
    pub token: String,
    pub user: ProfileResponse,
}

//=========================================================================================
// Password Handling
//=========================================================================================

const PASSWORD_RULES: &str = "Password must be at least 8 characters long and contain at least \
     one uppercase letter, one lowercase letter, and one number";

fn password_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [r"^[a-zA-Z0-9]{8,}$", r"[a-z]", r"[A-Z]", r"[0-9]"]
            .map(|p| Regex::new(p).expect("password patterns are valid regexes"))
    })
}

/// Letters and digits only, at least 8 long, with a lowercase, an uppercase and a digit.
pub fn validate_password(password: &str) -> Result<(), PortError> {
    if password_patterns().iter().all(|re| re.is_match(password)) {
        Ok(())
    } else {
        Err(PortError::InvalidRequest(PASSWORD_RULES.to_string()))
    }
}

pub fn hash_password(password: &str) -> Result<String, PortError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hashed: &str) -> Result<bool, PortError> {
    let parsed_hash = PasswordHash::new(hashed)
        .map_err(|e| PortError::Unexpected(format!("Failed to parse password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

//=========================================================================================
// Session Helpers
//=========================================================================================

fn session_cookie(session_id: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, session_id, max_age_secs
    )
}

/// Creates a server-side session for `user_id` and returns its id and cookie.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<(String, String), HttpError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    state
        .db
        .create_auth_session(&auth_session_id, user_id, Utc::now() + ttl)
        .await
        .map_err(http_error)?;
    let cookie = session_cookie(&auth_session_id, ttl.num_seconds());
    Ok((auth_session_id, cookie))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account and log it in
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid request or email already in use", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let req = json_body(payload)?;
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(http_error(PortError::InvalidRequest(
            "Name and email are required".to_string(),
        )));
    }
    validate_password(&req.password).map_err(http_error)?;

    // 1. Hash the password
    let hashed_password = hash_password(&req.password).map_err(http_error)?;

    // 2. Create user in database
    let profile = state
        .db
        .create_user(NewUser {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            hashed_password,
            bio: req.bio,
            avatar: req.avatar,
            teach_skills: req.skills_to_teach,
            learn_skills: req.skills_to_learn,
        })
        .await
        .map_err(http_error)?;
    info!(user_id = %profile.id, "User registered");

    // 3. Log the new user in
    let (token, cookie) = start_session(&state, profile.id).await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            token,
            user: profile.into(),
        }),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let req = json_body(payload)?;

    // 1. Get user by email
    let credentials = match state.db.get_user_by_email(req.email.trim()).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => return Err(http_error(PortError::Unauthorized)),
        Err(e) => return Err(http_error(e)),
    };

    // 2. Verify password
    if !verify_password(&req.password, &credentials.hashed_password).map_err(http_error)? {
        return Err(http_error(PortError::Unauthorized));
    }

    // 3. Create the auth session
    let (token, cookie) = start_session(&state, credentials.user_id).await?;
    let profile = state
        .db
        .get_profile(credentials.user_id)
        .await
        .map_err(http_error)?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            token,
            user: profile.into(),
        }),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "No active session", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    // 1. Find the session id
    let auth_session_id =
        session_id_from_headers(&headers).ok_or_else(|| http_error(PortError::Unauthorized))?;

    // 2. Delete auth session from database
    state
        .db
        .delete_auth_session(&auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            http_error(e)
        })?;

    // 3. Clear cookie
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie("", 0))],
        Json(MessageResponse::new("Logged out")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Password1").is_ok());
        assert!(validate_password("password1").is_err());
        assert!(validate_password("PASSWORD1").is_err());
        assert!(validate_password("Password").is_err());
        assert!(validate_password("Pass1").is_err());
        assert!(validate_password("Password1!").is_err());
        // Only ASCII digits count.
        assert!(validate_password("Password\u{0661}").is_err());
        assert!(validate_password("Passwor\u{0661}1").is_err());
    }

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("Password1").unwrap();
        assert!(verify_password("Password1", &hash).unwrap());
        assert!(!verify_password("Password2", &hash).unwrap());
    }
}
