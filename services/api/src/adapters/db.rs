//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skill_swap_core::domain::{
    Appointment, ConnectionRequest, Frequency, NewUser, RecurrencePattern, RequestStatus,
    SkillsUpdate, UserCredentials, UserId, UserProfile,
};
use skill_swap_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn db_error_code(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn to_i32(field: &str, value: u32) -> PortResult<i32> {
    i32::try_from(value)
        .map_err(|_| PortError::InvalidRequest(format!("{} is too large", field)))
}

fn to_u32(field: &str, value: i32) -> PortResult<u32> {
    u32::try_from(value)
        .map_err(|_| PortError::Unexpected(format!("stored {} is negative", field)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str =
    "id, name, email, bio, avatar, teach_skills, learn_skills, created_at";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    bio: Option<String>,
    avatar: Option<String>,
    teach_skills: Vec<String>,
    learn_skills: Vec<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name,
            email: self.email,
            bio: self.bio,
            avatar: self.avatar,
            teach_skills: self.teach_skills,
            learn_skills: self.learn_skills,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}

const REQUEST_COLUMNS: &str = "id, from_user, to_user, status, message, created_at, updated_at";

#[derive(FromRow)]
struct ConnectionRequestRecord {
    id: Uuid,
    from_user: Uuid,
    to_user: Uuid,
    status: String,
    message: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ConnectionRequestRecord {
    fn to_domain(self) -> PortResult<ConnectionRequest> {
        Ok(ConnectionRequest {
            id: self.id,
            from: self.from_user,
            to: self.to_user,
            status: self.status.parse()?,
            message: self.message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const APPOINTMENT_COLUMNS: &str = "id, participants, created_by, meeting_link, title, \
     description, start_time, end_time, status, recurrence_frequency, recurrence_interval, \
     recurrence_count, recurrence_until, created_at, updated_at";

#[derive(FromRow)]
struct AppointmentRecord {
    id: Uuid,
    participants: Vec<Uuid>,
    created_by: Uuid,
    meeting_link: String,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    recurrence_frequency: Option<String>,
    recurrence_interval: Option<i32>,
    recurrence_count: Option<i32>,
    recurrence_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl AppointmentRecord {
    fn to_domain(self) -> PortResult<Appointment> {
        let recurrence = match self.recurrence_frequency {
            Some(frequency) => Some(RecurrencePattern {
                frequency: frequency.parse::<Frequency>()?,
                interval: match self.recurrence_interval {
                    Some(interval) => to_u32("recurrence_interval", interval)?,
                    None => RecurrencePattern::DEFAULT_INTERVAL,
                },
                count: self
                    .recurrence_count
                    .map(|count| to_u32("recurrence_count", count))
                    .transpose()?,
                until: self.recurrence_until,
            }),
            None => None,
        };
        Ok(Appointment {
            id: self.id,
            participants: self.participants,
            created_by: self.created_by,
            meeting_link: self.meeting_link,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status.parse()?,
            recurrence,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Flattened recurrence columns, ready to bind.
struct RecurrenceColumns {
    frequency: Option<&'static str>,
    interval: Option<i32>,
    count: Option<i32>,
    until: Option<DateTime<Utc>>,
}
impl RecurrenceColumns {
    fn from_domain(recurrence: Option<&RecurrencePattern>) -> PortResult<Self> {
        match RecurrencePattern::normalize(recurrence.cloned()) {
            Some(pattern) => Ok(Self {
                frequency: Some(pattern.frequency.as_str()),
                interval: Some(to_i32("recurrence interval", pattern.interval)?),
                count: pattern
                    .count
                    .map(|count| to_i32("recurrence count", count))
                    .transpose()?,
                until: pattern.until,
            }),
            None => Ok(Self {
                frequency: None,
                interval: None,
                count: None,
                until: None,
            }),
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<UserProfile> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, bio, avatar, teach_skills, learn_skills) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .bind(&new_user.bio)
            .bind(&new_user.avatar)
            .bind(&new_user.teach_skills)
            .bind(&new_user.learn_skills)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match db_error_code(&e).as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    PortError::InvalidRequest("Email already in use".to_string())
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User with email {} not found", email))
            }
            _ => unexpected(e),
        })?;
        Ok(UserCredentials {
            user_id: record.id,
            email: record.email,
            hashed_password: record.password_hash,
        })
    }

    async fn get_profile(&self, user_id: UserId) -> PortResult<UserProfile> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("User {} not found", user_id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn get_profiles(&self, user_ids: &[UserId]) -> PortResult<Vec<UserProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let records = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_profiles(&self) -> PortResult<Vec<UserProfile>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at ASC, id ASC",
            USER_COLUMNS
        );
        let records = sqlx::query_as::<_, UserRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_skills(
        &self,
        user_id: UserId,
        update: SkillsUpdate,
    ) -> PortResult<UserProfile> {
        let sql = format!(
            "UPDATE users SET teach_skills = COALESCE($2, teach_skills), \
             learn_skills = COALESCE($3, learn_skills), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .bind(update.teach_skills)
            .bind(update.learn_skills)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<UserId> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_connection_request(
        &self,
        from: UserId,
        to: UserId,
        message: &str,
    ) -> PortResult<ConnectionRequest> {
        let sql = format!(
            "INSERT INTO connection_requests (id, from_user, to_user, status, message) \
             VALUES ($1, $2, $3, 'pending', $4) RETURNING {}",
            REQUEST_COLUMNS
        );
        // The unique (from_user, to_user) constraint closes the check-then-insert race.
        let record = sqlx::query_as::<_, ConnectionRequestRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(from)
            .bind(to)
            .bind(message)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match db_error_code(&e).as_deref() {
                Some(UNIQUE_VIOLATION) => PortError::DuplicateRequest,
                Some(CHECK_VIOLATION) => PortError::SelfConnection,
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn find_connection_request(
        &self,
        from: UserId,
        to: UserId,
    ) -> PortResult<Option<ConnectionRequest>> {
        let sql = format!(
            "SELECT {} FROM connection_requests WHERE from_user = $1 AND to_user = $2",
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, ConnectionRequestRecord>(&sql)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(|r| r.to_domain())
            .transpose()
    }

    async fn get_connection_request(&self, request_id: Uuid) -> PortResult<ConnectionRequest> {
        let sql = format!(
            "SELECT {} FROM connection_requests WHERE id = $1",
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, ConnectionRequestRecord>(&sql)
            .bind(request_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Request {} not found", request_id))
                }
                _ => unexpected(e),
            })?
            .to_domain()
    }

    async fn list_pending_requests(&self, to: UserId) -> PortResult<Vec<ConnectionRequest>> {
        let sql = format!(
            "SELECT {} FROM connection_requests WHERE to_user = $1 AND status = 'pending' \
             ORDER BY created_at ASC, id ASC",
            REQUEST_COLUMNS
        );
        let records = sqlx::query_as::<_, ConnectionRequestRecord>(&sql)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn resolve_connection_request(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> PortResult<ConnectionRequest> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Conditional on `pending`, so of two racing responders only one gets a row back.
        let sql = format!(
            "UPDATE connection_requests SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending' RETURNING {}",
            REQUEST_COLUMNS
        );
        let record = sqlx::query_as::<_, ConnectionRequestRecord>(&sql)
            .bind(request_id)
            .bind(status.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;

        let request = match record {
            Some(record) => record.to_domain()?,
            None => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS (SELECT 1 FROM connection_requests WHERE id = $1)",
                )
                .bind(request_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
                return Err(if exists {
                    PortError::AlreadyProcessed
                } else {
                    PortError::NotFound(format!("Request {} not found", request_id))
                });
            }
        };

        if status == RequestStatus::Accepted {
            sqlx::query(
                "INSERT INTO connections (user_id, peer_id) VALUES ($1, $2), ($2, $1) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(request.from)
            .bind(request.to)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(request)
    }

    async fn list_connection_ids(&self, user_id: UserId) -> PortResult<Vec<UserId>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT peer_id FROM connections WHERE user_id = $1 ORDER BY created_at ASC, peer_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn are_connected(&self, a: UserId, b: UserId) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM connections WHERE user_id = $1 AND peer_id = $2)",
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn insert_appointment(&self, appointment: Appointment) -> PortResult<Appointment> {
        let recurrence = RecurrenceColumns::from_domain(appointment.recurrence.as_ref())?;
        let sql = format!(
            "INSERT INTO appointments (id, participants, created_by, meeting_link, title, \
             description, start_time, end_time, status, recurrence_frequency, \
             recurrence_interval, recurrence_count, recurrence_until, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {}",
            APPOINTMENT_COLUMNS
        );
        sqlx::query_as::<_, AppointmentRecord>(&sql)
            .bind(appointment.id)
            .bind(&appointment.participants)
            .bind(appointment.created_by)
            .bind(&appointment.meeting_link)
            .bind(&appointment.title)
            .bind(&appointment.description)
            .bind(appointment.start_time)
            .bind(appointment.end_time)
            .bind(appointment.status.as_str())
            .bind(recurrence.frequency)
            .bind(recurrence.interval)
            .bind(recurrence.count)
            .bind(recurrence.until)
            .bind(appointment.created_at)
            .bind(appointment.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        let sql = format!("SELECT {} FROM appointments WHERE id = $1", APPOINTMENT_COLUMNS);
        sqlx::query_as::<_, AppointmentRecord>(&sql)
            .bind(appointment_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Appointment {} not found", appointment_id))
                }
                _ => unexpected(e),
            })?
            .to_domain()
    }

    async fn list_appointments_for(&self, user_id: UserId) -> PortResult<Vec<Appointment>> {
        let sql = format!(
            "SELECT {} FROM appointments WHERE $1 = ANY(participants) \
             ORDER BY start_time ASC, created_at ASC",
            APPOINTMENT_COLUMNS
        );
        let records = sqlx::query_as::<_, AppointmentRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_appointment(&self, appointment: Appointment) -> PortResult<Appointment> {
        let recurrence = RecurrenceColumns::from_domain(appointment.recurrence.as_ref())?;
        let sql = format!(
            "UPDATE appointments SET meeting_link = $2, title = $3, description = $4, \
             start_time = $5, end_time = $6, status = $7, recurrence_frequency = $8, \
             recurrence_interval = $9, recurrence_count = $10, recurrence_until = $11, \
             updated_at = $12 WHERE id = $1 RETURNING {}",
            APPOINTMENT_COLUMNS
        );
        sqlx::query_as::<_, AppointmentRecord>(&sql)
            .bind(appointment.id)
            .bind(&appointment.meeting_link)
            .bind(&appointment.title)
            .bind(&appointment.description)
            .bind(appointment.start_time)
            .bind(appointment.end_time)
            .bind(appointment.status.as_str())
            .bind(recurrence.frequency)
            .bind(recurrence.interval)
            .bind(recurrence.count)
            .bind(recurrence.until)
            .bind(appointment.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| {
                PortError::NotFound(format!("Appointment {} not found", appointment.id))
            })?
            .to_domain()
    }

    async fn delete_appointment(&self, appointment_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(appointment_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Appointment {} not found",
                appointment_id
            )));
        }
        Ok(())
    }
}

// These run against a throwaway database created by `sqlx::test` from `DATABASE_URL`:
// `DATABASE_URL=postgres://... cargo test -p api -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use skill_swap_core::domain::AppointmentStatus;

    async fn user(db: &DbAdapter, name: &str) -> UserProfile {
        db.create_user(NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            hashed_password: "not-a-real-hash".to_string(),
            bio: None,
            avatar: None,
            teach_skills: vec!["Rust".to_string()],
            learn_skills: vec![],
        })
        .await
        .unwrap()
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn test_duplicate_email_and_self_request_map_to_port_errors(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let alice = user(&db, "Alice").await;

        let err = db
            .create_user(NewUser {
                name: "Other Alice".to_string(),
                email: alice.email.clone(),
                hashed_password: "x".to_string(),
                bio: None,
                avatar: None,
                teach_skills: vec![],
                learn_skills: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::InvalidRequest(_)));

        let err = db
            .insert_connection_request(alice.id, alice.id, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::SelfConnection));
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn test_concurrent_duplicate_requests_insert_once(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let alice = user(&db, "Alice").await;
        let bob = user(&db, "Bob").await;

        let (first, second) = tokio::join!(
            db.insert_connection_request(alice.id, bob.id, "one"),
            db.insert_connection_request(alice.id, bob.id, "two"),
        );
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(PortError::DuplicateRequest))));
        assert_eq!(db.list_pending_requests(bob.id).await.unwrap().len(), 1);

        // The reverse direction is a different pair.
        assert!(db
            .insert_connection_request(bob.id, alice.id, "back")
            .await
            .is_ok());
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn test_accept_writes_both_edge_halves_once(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let alice = user(&db, "Alice").await;
        let bob = user(&db, "Bob").await;
        let request = db
            .insert_connection_request(alice.id, bob.id, "hi")
            .await
            .unwrap();

        let accepted = db
            .resolve_connection_request(request.id, RequestStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert!(db.are_connected(alice.id, bob.id).await.unwrap());
        assert!(db.are_connected(bob.id, alice.id).await.unwrap());
        assert_eq!(db.list_connection_ids(alice.id).await.unwrap(), vec![bob.id]);
        assert!(db.list_pending_requests(bob.id).await.unwrap().is_empty());

        let err = db
            .resolve_connection_request(request.id, RequestStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::AlreadyProcessed));
        assert_eq!(
            db.get_connection_request(request.id).await.unwrap().status,
            RequestStatus::Accepted
        );

        let err = db
            .resolve_connection_request(Uuid::new_v4(), RequestStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn test_racing_responders_resolve_once(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let alice = user(&db, "Alice").await;
        let bob = user(&db, "Bob").await;
        let request = db
            .insert_connection_request(alice.id, bob.id, "hi")
            .await
            .unwrap();

        let (accept, reject) = tokio::join!(
            db.resolve_connection_request(request.id, RequestStatus::Accepted),
            db.resolve_connection_request(request.id, RequestStatus::Rejected),
        );
        assert!(accept.is_ok() != reject.is_ok());
        let stored = db.get_connection_request(request.id).await.unwrap();
        assert_eq!(
            db.are_connected(alice.id, bob.id).await.unwrap(),
            stored.status == RequestStatus::Accepted
        );
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn test_reject_writes_no_edges(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let alice = user(&db, "Alice").await;
        let bob = user(&db, "Bob").await;
        let request = db
            .insert_connection_request(alice.id, bob.id, "hi")
            .await
            .unwrap();

        db.resolve_connection_request(request.id, RequestStatus::Rejected)
            .await
            .unwrap();
        assert!(!db.are_connected(alice.id, bob.id).await.unwrap());
        assert!(db.list_connection_ids(bob.id).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn test_appointment_recurrence_round_trip(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let alice = user(&db, "Alice").await;
        let bob = user(&db, "Bob").await;
        let created_at = at("2024-01-01T00:00:00Z");
        let recurrence = RecurrencePattern {
            frequency: Frequency::Weekly,
            interval: 2,
            count: Some(6),
            until: Some(at("2024-06-30T00:00:00Z")),
        };

        let inserted = db
            .insert_appointment(Appointment {
                id: Uuid::new_v4(),
                participants: vec![alice.id, bob.id],
                created_by: alice.id,
                meeting_link: "https://meet.example.com/abc".to_string(),
                title: "Rust pairing".to_string(),
                description: None,
                start_time: at("2024-01-08T10:00:00Z"),
                end_time: at("2024-01-08T11:00:00Z"),
                status: AppointmentStatus::Scheduled,
                recurrence: Some(recurrence.clone()),
                created_at,
                updated_at: created_at,
            })
            .await
            .unwrap();

        let stored = db.get_appointment(inserted.id).await.unwrap();
        assert_eq!(stored, inserted);
        assert_eq!(stored.recurrence, Some(recurrence));
        assert_eq!(stored.participants, vec![alice.id, bob.id]);

        let mut cleared = stored.clone();
        cleared.recurrence = None;
        cleared.status = AppointmentStatus::Completed;
        let saved = db.save_appointment(cleared).await.unwrap();
        assert_eq!(saved.recurrence, None);
        assert_eq!(saved.status, AppointmentStatus::Completed);

        let listed = db.list_appointments_for(bob.id).await.unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[sqlx::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn test_new_session_prunes_expired_ones(pool: PgPool) {
        let db = DbAdapter::new(pool.clone());
        let alice = user(&db, "Alice").await;
        db.create_auth_session("old", alice.id, Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        db.create_auth_session("new", alice.id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM auth_sessions")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(ids, vec!["new".to_string()]);
        assert_eq!(db.validate_auth_session("new").await.unwrap(), alice.id);
    }
}
