//! services/api/src/web/rest.rs
//!
//! Contains the health check handler and the master definition for the
//! OpenAPI specification.

use axum::response::{IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::error::ErrorBody;
use crate::web::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::web::dto::{
    AppointmentResponse, AppointmentStatusDto, ConnectRequest, ConnectionRequestResponse,
    CreateAppointmentRequest, FrequencyDto, MatchResponse, MessageResponse, ParticipantResponse,
    PendingRequestResponse, ProfileResponse, PublicProfileResponse, RecurrenceDto,
    RequestStatusDto, ResolvedRequestResponse, SentRequestResponse, UpdateAppointmentRequest,
    UpdateSkillsRequest,
};
use crate::web::{appointments, auth, connections, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        users::get_me,
        users::update_skills,
        users::get_matches,
        connections::send_request,
        connections::list_requests,
        connections::accept_request,
        connections::reject_request,
        connections::list_connections,
        appointments::list_appointments,
        appointments::create_appointment,
        appointments::update_appointment,
        appointments::delete_appointment,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            MessageResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            ProfileResponse,
            PublicProfileResponse,
            UpdateSkillsRequest,
            MatchResponse,
            RequestStatusDto,
            ConnectRequest,
            ConnectionRequestResponse,
            SentRequestResponse,
            ResolvedRequestResponse,
            PendingRequestResponse,
            AppointmentStatusDto,
            FrequencyDto,
            RecurrenceDto,
            ParticipantResponse,
            AppointmentResponse,
            CreateAppointmentRequest,
            UpdateAppointmentRequest,
        )
    ),
    tags(
        (name = "Skill Swap API", description = "Match, connect and schedule skill-exchange sessions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/health",
            "/api/auth/register",
            "/api/users/connect/{user_id}",
            "/api/users/requests/{id}/accept",
            "/api/users/appointments/{id}",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {}",
                expected
            );
        }
    }
}
