//! services/api/src/web/dto.rs
//!
//! JSON payloads exchanged over the REST API, and their conversions to and from
//! the core domain types. The core itself stays serialization-free.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use skill_swap_core::domain::{
    AppointmentPatch, AppointmentStatus, AppointmentView, ConnectionRequest, Frequency,
    MatchCandidate, NewAppointment, PendingRequest, PublicProfile, RecurrencePattern,
    RequestStatus, UserProfile,
};
use skill_swap_core::ports::PortError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{http_error, HttpError};

/// Unwraps a JSON body, turning malformed input into a 400 `invalid_request`.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| http_error(PortError::InvalidRequest(rejection.body_text())))
}

/// Unwraps a path parameter, turning a malformed segment into a 400 `invalid_request`.
pub fn path_param<T>(param: Result<Path<T>, PathRejection>) -> Result<T, HttpError> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| http_error(PortError::InvalidRequest(rejection.body_text())))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

//=========================================================================================
// Profiles and Matches
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub skills_to_teach: Vec<String>,
    pub skills_to_learn: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            bio: profile.bio,
            avatar: profile.avatar,
            skills_to_teach: profile.teach_skills,
            skills_to_learn: profile.learn_skills,
            created_at: profile.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PublicProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

impl From<PublicProfile> for PublicProfileResponse {
    fn from(profile: PublicProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            avatar: profile.avatar,
            bio: profile.bio,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateSkillsRequest {
    #[serde(default)]
    pub skills_to_teach: Option<Vec<String>>,
    #[serde(default)]
    pub skills_to_learn: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct MatchResponse {
    pub user: ProfileResponse,
    /// Skills you want to learn that this user teaches.
    pub shared_teach: Vec<String>,
    /// Skills you teach that this user wants to learn.
    pub shared_learn: Vec<String>,
}

impl From<MatchCandidate> for MatchResponse {
    fn from(candidate: MatchCandidate) -> Self {
        Self {
            user: candidate.profile.into(),
            shared_teach: candidate.shared_teach,
            shared_learn: candidate.shared_learn,
        }
    }
}

//=========================================================================================
// Connection Requests
//=========================================================================================

#[derive(Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatusDto {
    Pending,
    Accepted,
    Rejected,
}

impl From<RequestStatus> for RequestStatusDto {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending => Self::Pending,
            RequestStatus::Accepted => Self::Accepted,
            RequestStatus::Rejected => Self::Rejected,
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
pub struct ConnectRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ConnectionRequestResponse {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    pub status: RequestStatusDto,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConnectionRequest> for ConnectionRequestResponse {
    fn from(request: ConnectionRequest) -> Self {
        Self {
            id: request.id,
            from: request.from,
            to: request.to,
            status: request.status.into(),
            message: request.message,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SentRequestResponse {
    pub message: String,
    pub request: ConnectionRequestResponse,
    /// Whether the recipient notification was handed off. The request exists either way.
    pub notification_sent: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ResolvedRequestResponse {
    pub message: String,
    pub request: ConnectionRequestResponse,
}

#[derive(Serialize, ToSchema)]
pub struct PendingRequestResponse {
    pub id: Uuid,
    pub from: PublicProfileResponse,
    pub message: String,
    pub status: RequestStatusDto,
    pub created_at: DateTime<Utc>,
}

impl From<PendingRequest> for PendingRequestResponse {
    fn from(pending: PendingRequest) -> Self {
        Self {
            id: pending.request.id,
            from: pending.from.into(),
            message: pending.request.message,
            status: pending.request.status.into(),
            created_at: pending.request.created_at,
        }
    }
}

//=========================================================================================
// Appointments
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatusDto {
    Scheduled,
    Completed,
    Cancelled,
}

impl From<AppointmentStatus> for AppointmentStatusDto {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Scheduled => Self::Scheduled,
            AppointmentStatus::Completed => Self::Completed,
            AppointmentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<AppointmentStatusDto> for AppointmentStatus {
    fn from(status: AppointmentStatusDto) -> Self {
        match status {
            AppointmentStatusDto::Scheduled => Self::Scheduled,
            AppointmentStatusDto::Completed => Self::Completed,
            AppointmentStatusDto::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyDto {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

fn default_interval() -> u32 {
    RecurrencePattern::DEFAULT_INTERVAL
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct RecurrenceDto {
    #[serde(default)]
    pub frequency: FrequencyDto,
    /// Every n days/weeks/months.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Total number of occurrences.
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

impl From<RecurrenceDto> for RecurrencePattern {
    fn from(dto: RecurrenceDto) -> Self {
        let frequency = match dto.frequency {
            FrequencyDto::None => Frequency::None,
            FrequencyDto::Daily => Frequency::Daily,
            FrequencyDto::Weekly => Frequency::Weekly,
            FrequencyDto::Monthly => Frequency::Monthly,
        };
        Self {
            frequency,
            interval: dto.interval,
            count: dto.count,
            until: dto.until,
        }
    }
}

impl From<RecurrencePattern> for RecurrenceDto {
    fn from(pattern: RecurrencePattern) -> Self {
        let frequency = match pattern.frequency {
            Frequency::None => FrequencyDto::None,
            Frequency::Daily => FrequencyDto::Daily,
            Frequency::Weekly => FrequencyDto::Weekly,
            Frequency::Monthly => FrequencyDto::Monthly,
        };
        Self {
            frequency,
            interval: pattern.interval,
            count: pattern.count,
            until: pattern.until,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl From<PublicProfile> for ParticipantResponse {
    fn from(profile: PublicProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            avatar: profile.avatar,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub participants: Vec<ParticipantResponse>,
    pub created_by: Uuid,
    pub meeting_link: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatusDto,
    pub recurrence: Option<RecurrenceDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppointmentView> for AppointmentResponse {
    fn from(view: AppointmentView) -> Self {
        let appointment = view.appointment;
        Self {
            id: appointment.id,
            participants: view.participants.into_iter().map(Into::into).collect(),
            created_by: appointment.created_by,
            meeting_link: appointment.meeting_link,
            title: appointment.title,
            description: appointment.description,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: appointment.status.into(),
            recurrence: appointment.recurrence.map(Into::into),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    /// Other participants. The creator is always added.
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
    #[serde(default)]
    pub meeting_link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceDto>,
}

impl From<CreateAppointmentRequest> for NewAppointment {
    fn from(req: CreateAppointmentRequest) -> Self {
        Self {
            participant_ids: req.participant_ids,
            meeting_link: req.meeting_link,
            title: req.title,
            description: req.description,
            start_time: req.start_time,
            end_time: req.end_time,
            recurrence: req.recurrence.map(Into::into),
        }
    }
}

/// Only the supplied fields change. `null` clears `description` or `recurrence`.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateAppointmentRequest {
    #[serde(default)]
    pub status: Option<AppointmentStatusDto>,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<RecurrenceDto>)]
    pub recurrence: Option<Option<RecurrenceDto>>,
}

impl From<UpdateAppointmentRequest> for AppointmentPatch {
    fn from(req: UpdateAppointmentRequest) -> Self {
        Self {
            status: req.status.map(Into::into),
            meeting_link: req.meeting_link,
            title: req.title,
            description: req.description,
            start_time: req.start_time,
            end_time: req.end_time,
            recurrence: req.recurrence.map(|r| r.map(Into::into)),
        }
    }
}
