//! crates/skill_swap_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or mail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Appointment, ConnectionRequest, NewUser, RequestStatus, SkillsUpdate, UserCredentials,
    UserId, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for all core and port operations.
///
/// Every precondition failure maps to one variant; storage failures that the core
/// does not anticipate collapse into `Unexpected`.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    #[error("Cannot connect with yourself")]
    SelfConnection,
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Connection request already sent")]
    DuplicateRequest,
    #[error("Request already processed")]
    AlreadyProcessed,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// A stable, machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::NotAuthorized(_) => "not_authorized",
            Self::SelfConnection => "self_connection",
            Self::AlreadyConnected => "already_connected",
            Self::DuplicateRequest => "duplicate_request",
            Self::AlreadyProcessed => "already_processed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::Unexpected(_) => "internal",
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Fails with `InvalidRequest` when the email is already registered.
    async fn create_user(&self, new_user: NewUser) -> PortResult<UserProfile>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_profile(&self, user_id: UserId) -> PortResult<UserProfile>;

    /// Returns the profiles that exist among `user_ids`, in no particular order.
    async fn get_profiles(&self, user_ids: &[UserId]) -> PortResult<Vec<UserProfile>>;

    /// All profiles in registration order.
    async fn list_profiles(&self) -> PortResult<Vec<UserProfile>>;

    async fn update_skills(&self, user_id: UserId, update: SkillsUpdate)
        -> PortResult<UserProfile>;

    // --- Auth Methods ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<UserId>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Connection Requests ---
    /// Persists a new pending request. The `(from, to)` pair is unique at the
    /// storage level; a second insert fails with `DuplicateRequest`.
    async fn insert_connection_request(
        &self,
        from: UserId,
        to: UserId,
        message: &str,
    ) -> PortResult<ConnectionRequest>;

    async fn find_connection_request(
        &self,
        from: UserId,
        to: UserId,
    ) -> PortResult<Option<ConnectionRequest>>;

    async fn get_connection_request(&self, request_id: Uuid) -> PortResult<ConnectionRequest>;

    /// Pending requests addressed to `to`, oldest first.
    async fn list_pending_requests(&self, to: UserId) -> PortResult<Vec<ConnectionRequest>>;

    /// Moves a pending request to `status` in one transaction. When `status` is
    /// `Accepted` both halves of the connection edge are written in that same
    /// transaction. Fails with `AlreadyProcessed` if the request is no longer pending.
    async fn resolve_connection_request(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> PortResult<ConnectionRequest>;

    // --- Connection Graph ---
    /// Ids of the users connected to `user_id`, in the order the edges were made.
    async fn list_connection_ids(&self, user_id: UserId) -> PortResult<Vec<UserId>>;

    async fn are_connected(&self, a: UserId, b: UserId) -> PortResult<bool>;

    // --- Appointments ---
    async fn insert_appointment(&self, appointment: Appointment) -> PortResult<Appointment>;

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment>;

    /// Appointments `user_id` participates in, by start time ascending.
    async fn list_appointments_for(&self, user_id: UserId) -> PortResult<Vec<Appointment>>;

    /// Overwrites every mutable field of the stored appointment. Last write wins.
    async fn save_appointment(&self, appointment: Appointment) -> PortResult<Appointment>;

    async fn delete_appointment(&self, appointment_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Tells `to_email` about a new connection request. Best-effort: returns
    /// whether the message was handed off, never an error.
    async fn notify_connection_request(
        &self,
        to_email: &str,
        from_name: &str,
        to_name: &str,
        request_id: Uuid,
    ) -> bool;
}
