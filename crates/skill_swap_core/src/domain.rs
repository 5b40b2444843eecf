//! crates/skill_swap_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

/// Opaque identity of a registered user.
pub type UserId = Uuid;

//=========================================================================================
// Users and Profiles
//=========================================================================================

/// A user's full profile, including the skills they offer and want.
///
/// Skill strings are kept verbatim; comparisons are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub teach_skills: Vec<String>,
    pub learn_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The display-safe subset of a profile shown to other users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

impl From<&UserProfile> for PublicProfile {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            email: profile.email.clone(),
            avatar: profile.avatar.clone(),
            bio: profile.bio.clone(),
        }
    }
}

// Only used internally for registration - contains sensitive data
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub teach_skills: Vec<String>,
    pub learn_skills: Vec<String>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: UserId,
    pub email: String,
    pub hashed_password: String,
}

/// A profile skills update. `None` leaves the corresponding list untouched.
#[derive(Debug, Clone, Default)]
pub struct SkillsUpdate {
    pub teach_skills: Option<Vec<String>>,
    pub learn_skills: Option<Vec<String>>,
}

/// A candidate returned by the matcher, with the overlapping skills in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub profile: UserProfile,
    /// Skills the user wants to learn that the candidate teaches.
    pub shared_teach: Vec<String>,
    /// Skills the user teaches that the candidate wants to learn.
    pub shared_learn: Vec<String>,
}

//=========================================================================================
// Connection Requests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = PortError;

    fn from_str(s: &str) -> PortResult<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(PortError::Unexpected(format!(
                "unknown request status '{}'",
                other
            ))),
        }
    }
}

/// A directed proposal from one user to another, resolved exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub from: UserId,
    pub to: UserId,
    pub status: RequestStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The recipient's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn resulting_status(&self) -> RequestStatus {
        match self {
            Self::Accept => RequestStatus::Accepted,
            Self::Reject => RequestStatus::Rejected,
        }
    }
}

/// A pending request expanded with the sender's public profile.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub request: ConnectionRequest,
    pub from: PublicProfile,
}

/// The outcome of sending a request. Notification delivery is best-effort.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub request: ConnectionRequest,
    pub notification_sent: bool,
}

//=========================================================================================
// Appointments
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = PortError;

    fn from_str(s: &str) -> PortResult<Self> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(PortError::Unexpected(format!(
                "unknown appointment status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for Frequency {
    type Err = PortError;

    fn from_str(s: &str) -> PortResult<Self> {
        match s {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(PortError::Unexpected(format!(
                "unknown recurrence frequency '{}'",
                other
            ))),
        }
    }
}

/// Descriptive recurrence metadata. Never expanded into concrete occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    /// Every n days/weeks/months.
    pub interval: u32,
    /// Total number of occurrences.
    pub count: Option<u32>,
    pub until: Option<DateTime<Utc>>,
}

impl RecurrencePattern {
    pub const DEFAULT_INTERVAL: u32 = 1;

    /// A pattern with `Frequency::None` is the same as no recurrence at all.
    pub fn normalize(pattern: Option<Self>) -> Option<Self> {
        pattern.filter(|p| p.frequency != Frequency::None)
    }

    pub fn validate(&self) -> PortResult<()> {
        if self.interval == 0 {
            return Err(PortError::InvalidRequest(
                "Recurrence interval must be at least 1".to_string(),
            ));
        }
        if self.count == Some(0) {
            return Err(PortError::InvalidRequest(
                "Recurrence count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: Uuid,
    /// The creator is always the first participant; no duplicates.
    pub participants: Vec<UserId>,
    pub created_by: UserId,
    pub meeting_link: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub recurrence: Option<RecurrencePattern>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }
}

/// Input for creating an appointment. The creator is supplied separately.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub participant_ids: Vec<UserId>,
    pub meeting_link: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recurrence: Option<RecurrencePattern>,
}

/// A partial update. Every field left as `None` keeps its current value.
///
/// `description` and `recurrence` are doubly optional: `Some(None)` clears the field.
#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub status: Option<AppointmentStatus>,
    pub meeting_link: Option<String>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub recurrence: Option<Option<RecurrencePattern>>,
}

/// An appointment with its participants resolved to display-safe profiles.
#[derive(Debug, Clone)]
pub struct AppointmentView {
    pub appointment: Appointment,
    pub participants: Vec<PublicProfile>,
}
