//! services/api/src/web/connections.rs
//!
//! Connection request and connection list endpoints.

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use skill_swap_core::domain::Decision;
use skill_swap_core::ports::PortError;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{http_error, ErrorBody, HttpError};
use crate::web::dto::{
    path_param, ConnectRequest, PendingRequestResponse, ProfileResponse,
    ResolvedRequestResponse, SentRequestResponse,
};
use crate::web::state::AppState;

/// The connect body is optional, so an empty payload means "use the default message".
fn parse_connect_body(body: &[u8]) -> Result<ConnectRequest, HttpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ConnectRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| http_error(PortError::InvalidRequest(format!("Invalid JSON body: {}", e))))
}

/// POST /users/connect/{user_id} - Send a connection request
#[utoipa::path(
    post,
    path = "/api/users/connect/{user_id}",
    params(("user_id" = Uuid, Path, description = "The user to connect with")),
    request_body(content = ConnectRequest, description = "Optional; an empty body uses the default message"),
    responses(
        (status = 201, description = "Request sent", body = SentRequestResponse),
        (status = 400, description = "Self request, already connected or duplicate", body = ErrorBody),
        (status = 400, description = "Malformed user id", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn send_request(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    to: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let to = path_param(to)?;
    let req = parse_connect_body(&body)?;
    let sent = state
        .ledger
        .send_request(user_id, to, req.message)
        .await
        .map_err(http_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SentRequestResponse {
            message: "Connection request sent successfully!".to_string(),
            request: sent.request.into(),
            notification_sent: sent.notification_sent,
        }),
    ))
}

/// GET /users/requests - Pending requests addressed to the logged-in user
#[utoipa::path(
    get,
    path = "/api/users/requests",
    responses(
        (status = 200, description = "Pending requests, oldest first", body = [PendingRequestResponse]),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let pending = state
        .ledger
        .list_pending(user_id)
        .await
        .map_err(http_error)?;
    let body: Vec<PendingRequestResponse> = pending.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

async fn respond(
    state: &AppState,
    request_id: Uuid,
    user_id: Uuid,
    decision: Decision,
) -> Result<Json<ResolvedRequestResponse>, HttpError> {
    let resolved = state
        .ledger
        .respond(request_id, user_id, decision)
        .await
        .map_err(http_error)?;
    let message = match decision {
        Decision::Accept => "Connection request accepted!",
        Decision::Reject => "Connection request rejected",
    };
    Ok(Json(ResolvedRequestResponse {
        message: message.to_string(),
        request: resolved.into(),
    }))
}

/// POST /users/requests/{id}/accept - Accept a pending request
#[utoipa::path(
    post,
    path = "/api/users/requests/{id}/accept",
    params(("id" = Uuid, Path, description = "Connection request id")),
    responses(
        (status = 200, description = "Request accepted, users connected", body = ResolvedRequestResponse),
        (status = 400, description = "Already processed", body = ErrorBody),
        (status = 403, description = "Not the recipient", body = ErrorBody),
        (status = 404, description = "Request not found", body = ErrorBody)
    )
)]
pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    request_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    respond(&state, path_param(request_id)?, user_id, Decision::Accept).await
}

/// POST /users/requests/{id}/reject - Reject a pending request
#[utoipa::path(
    post,
    path = "/api/users/requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Connection request id")),
    responses(
        (status = 200, description = "Request rejected", body = ResolvedRequestResponse),
        (status = 400, description = "Already processed", body = ErrorBody),
        (status = 403, description = "Not the recipient", body = ErrorBody),
        (status = 404, description = "Request not found", body = ErrorBody)
    )
)]
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    request_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    respond(&state, path_param(request_id)?, user_id, Decision::Reject).await
}

/// GET /users/connections - Full profiles, skills included, of everyone the logged-in user is connected with
#[utoipa::path(
    get,
    path = "/api/users/connections",
    responses(
        (status = 200, description = "Connected users", body = [ProfileResponse]),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn list_connections(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let peers = state
        .graph
        .list_connections(user_id)
        .await
        .map_err(http_error)?;
    let body: Vec<ProfileResponse> = peers.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_body_may_be_empty() {
        assert!(parse_connect_body(b"").unwrap().message.is_none());
        assert!(parse_connect_body(b"  \n").unwrap().message.is_none());
        let req = parse_connect_body(br#"{"message": "hi"}"#).unwrap();
        assert_eq!(req.message.as_deref(), Some("hi"));
        assert!(parse_connect_body(b"{oops").is_err());
    }
}
