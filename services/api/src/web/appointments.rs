//! services/api/src/web/appointments.rs
//!
//! Appointment endpoints. Authorization rules live in the scheduler; this layer
//! only adds the optional "participants must be connected" check.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use skill_swap_core::domain::{AppointmentPatch, NewAppointment};
use skill_swap_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{http_error, ErrorBody, HttpError};
use crate::web::dto::{
    json_body, path_param, AppointmentResponse, CreateAppointmentRequest, MessageResponse,
    UpdateAppointmentRequest,
};
use crate::web::state::AppState;

/// Rejects participants the creator is not connected with, when the deployment asks for it.
async fn ensure_connected(
    state: &AppState,
    creator: Uuid,
    participant_ids: &[Uuid],
) -> Result<(), HttpError> {
    if !state.config.require_connected_participants {
        return Ok(());
    }
    for &participant in participant_ids.iter().filter(|&&id| id != creator) {
        let connected = state
            .graph
            .are_connected(creator, participant)
            .await
            .map_err(http_error)?;
        if !connected {
            debug!(%creator, %participant, "appointment participant is not a connection");
            return Err(http_error(PortError::NotAuthorized(
                "You can only schedule appointments with your connections".to_string(),
            )));
        }
    }
    Ok(())
}

/// GET /users/appointments - Appointments the logged-in user takes part in
#[utoipa::path(
    get,
    path = "/api/users/appointments",
    responses(
        (status = 200, description = "Appointments sorted by start time", body = [AppointmentResponse]),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let views = state.scheduler.list(user_id).await.map_err(http_error)?;
    let body: Vec<AppointmentResponse> = views.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /users/appointments - Schedule an appointment
#[utoipa::path(
    post,
    path = "/api/users/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment created", body = AppointmentResponse),
        (status = 400, description = "Invalid appointment", body = ErrorBody),
        (status = 403, description = "Participant is not a connection", body = ErrorBody)
    )
)]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let new: NewAppointment = json_body(payload)?.into();
    ensure_connected(&state, user_id, &new.participant_ids).await?;

    let appointment = state
        .scheduler
        .create(user_id, new)
        .await
        .map_err(http_error)?;
    let view = state
        .scheduler
        .resolve(appointment)
        .await
        .map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(AppointmentResponse::from(view))))
}

/// PATCH /users/appointments/{id} - Update fields of an appointment
#[utoipa::path(
    patch,
    path = "/api/users/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = AppointmentResponse),
        (status = 400, description = "Invalid update", body = ErrorBody),
        (status = 403, description = "Not a participant", body = ErrorBody),
        (status = 404, description = "Appointment not found", body = ErrorBody)
    )
)]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    appointment_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAppointmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let appointment_id = path_param(appointment_id)?;
    let patch: AppointmentPatch = json_body(payload)?.into();
    let appointment = state
        .scheduler
        .update(appointment_id, user_id, patch)
        .await
        .map_err(http_error)?;
    let view = state
        .scheduler
        .resolve(appointment)
        .await
        .map_err(http_error)?;
    Ok(Json(AppointmentResponse::from(view)))
}

/// DELETE /users/appointments/{id} - Delete an appointment (creator only)
#[utoipa::path(
    delete,
    path = "/api/users/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment deleted", body = MessageResponse),
        (status = 403, description = "Not the creator", body = ErrorBody),
        (status = 404, description = "Appointment not found", body = ErrorBody)
    )
)]
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    appointment_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let appointment_id = path_param(appointment_id)?;
    state
        .scheduler
        .cancel(appointment_id, user_id)
        .await
        .map_err(http_error)?;
    Ok(Json(MessageResponse::new("Appointment deleted")))
}
