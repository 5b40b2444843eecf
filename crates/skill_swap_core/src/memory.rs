//! crates/skill_swap_core/src/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port.
//!
//! All tables live behind a single `RwLock`, so every port call is one atomic
//! step: the `(from, to)` uniqueness check and insert cannot interleave, and an
//! accepted request writes both edge halves under the same guard.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Appointment, ConnectionRequest, NewUser, RequestStatus, SkillsUpdate, UserCredentials,
    UserId, UserProfile,
};
use crate::ports::{DatabaseService, PortError, PortResult};

struct StoredUser {
    profile: UserProfile,
    hashed_password: String,
}

#[derive(Default)]
struct Tables {
    users: Vec<StoredUser>,
    auth_sessions: HashMap<String, (UserId, DateTime<Utc>)>,
    requests: Vec<ConnectionRequest>,
    // One entry per edge half: (owner, peer).
    edges: Vec<(UserId, UserId)>,
    appointments: Vec<Appointment>,
}

impl Tables {
    fn user(&self, user_id: UserId) -> PortResult<&StoredUser> {
        self.users
            .iter()
            .find(|u| u.profile.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    fn has_edge(&self, a: UserId, b: UserId) -> bool {
        self.edges.iter().any(|&(owner, peer)| owner == a && peer == b)
    }
}

/// A `DatabaseService` that keeps everything in memory. Data is lost on restart.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user(&self, new_user: NewUser) -> PortResult<UserProfile> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.profile.email == new_user.email) {
            return Err(PortError::InvalidRequest("Email already in use".to_string()));
        }
        let profile = UserProfile {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            bio: new_user.bio,
            avatar: new_user.avatar,
            teach_skills: new_user.teach_skills,
            learn_skills: new_user.learn_skills,
            created_at: Utc::now(),
        };
        tables.users.push(StoredUser {
            profile: profile.clone(),
            hashed_password: new_user.hashed_password,
        });
        Ok(profile)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.profile.email == email)
            .map(|u| UserCredentials {
                user_id: u.profile.id,
                email: u.profile.email.clone(),
                hashed_password: u.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn get_profile(&self, user_id: UserId) -> PortResult<UserProfile> {
        let tables = self.tables.read().await;
        Ok(tables.user(user_id)?.profile.clone())
    }

    async fn get_profiles(&self, user_ids: &[UserId]) -> PortResult<Vec<UserProfile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| user_ids.contains(&u.profile.id))
            .map(|u| u.profile.clone())
            .collect())
    }

    async fn list_profiles(&self) -> PortResult<Vec<UserProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().map(|u| u.profile.clone()).collect())
    }

    async fn update_skills(
        &self,
        user_id: UserId,
        update: SkillsUpdate,
    ) -> PortResult<UserProfile> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.profile.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        if let Some(teach) = update.teach_skills {
            user.profile.teach_skills = teach;
        }
        if let Some(learn) = update.learn_skills {
            user.profile.learn_skills = learn;
        }
        Ok(user.profile.clone())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        tables.auth_sessions.retain(|_, &mut (_, expiry)| expiry > now);
        tables
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<UserId> {
        let tables = self.tables.read().await;
        match tables.auth_sessions.get(session_id) {
            Some(&(user_id, expires_at)) if expires_at > Utc::now() => Ok(user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn insert_connection_request(
        &self,
        from: UserId,
        to: UserId,
        message: &str,
    ) -> PortResult<ConnectionRequest> {
        let mut tables = self.tables.write().await;
        if from == to {
            return Err(PortError::SelfConnection);
        }
        if tables.requests.iter().any(|r| r.from == from && r.to == to) {
            return Err(PortError::DuplicateRequest);
        }
        let now = Utc::now();
        let request = ConnectionRequest {
            id: Uuid::new_v4(),
            from,
            to,
            status: RequestStatus::Pending,
            message: message.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.requests.push(request.clone());
        Ok(request)
    }

    async fn find_connection_request(
        &self,
        from: UserId,
        to: UserId,
    ) -> PortResult<Option<ConnectionRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .iter()
            .find(|r| r.from == from && r.to == to)
            .cloned())
    }

    async fn get_connection_request(&self, request_id: Uuid) -> PortResult<ConnectionRequest> {
        let tables = self.tables.read().await;
        tables
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Request {} not found", request_id)))
    }

    async fn list_pending_requests(&self, to: UserId) -> PortResult<Vec<ConnectionRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .iter()
            .filter(|r| r.to == to && r.status == RequestStatus::Pending)
            .cloned()
            .collect())
    }

    async fn resolve_connection_request(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> PortResult<ConnectionRequest> {
        let mut tables = self.tables.write().await;
        let request = tables
            .requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| PortError::NotFound(format!("Request {} not found", request_id)))?;
        if request.status.is_terminal() {
            return Err(PortError::AlreadyProcessed);
        }
        request.status = status;
        request.updated_at = Utc::now();
        let resolved = request.clone();

        if status == RequestStatus::Accepted {
            for (owner, peer) in [(resolved.from, resolved.to), (resolved.to, resolved.from)] {
                if !tables.has_edge(owner, peer) {
                    tables.edges.push((owner, peer));
                }
            }
        }
        Ok(resolved)
    }

    async fn list_connection_ids(&self, user_id: UserId) -> PortResult<Vec<UserId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .edges
            .iter()
            .filter(|&&(owner, _)| owner == user_id)
            .map(|&(_, peer)| peer)
            .collect())
    }

    async fn are_connected(&self, a: UserId, b: UserId) -> PortResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.has_edge(a, b))
    }

    async fn insert_appointment(&self, appointment: Appointment) -> PortResult<Appointment> {
        let mut tables = self.tables.write().await;
        tables.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        let tables = self.tables.read().await;
        tables
            .appointments
            .iter()
            .find(|a| a.id == appointment_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("Appointment {} not found", appointment_id))
            })
    }

    async fn list_appointments_for(&self, user_id: UserId) -> PortResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|a| a.has_participant(user_id))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        Ok(appointments)
    }

    async fn save_appointment(&self, appointment: Appointment) -> PortResult<Appointment> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Appointment {} not found", appointment.id))
            })?;
        *slot = appointment.clone();
        Ok(appointment)
    }

    async fn delete_appointment(&self, appointment_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.appointments.len();
        tables.appointments.retain(|a| a.id != appointment_id);
        if tables.appointments.len() == before {
            return Err(PortError::NotFound(format!(
                "Appointment {} not found",
                appointment_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use std::sync::Mutex;

    use super::*;
    use crate::ports::NotificationService;

    fn to_strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// A detached profile, not stored anywhere.
    pub fn profile(name: &str, teach: &[&str], learn: &[&str]) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            bio: None,
            avatar: None,
            teach_skills: to_strings(teach),
            learn_skills: to_strings(learn),
            created_at: Utc::now(),
        }
    }

    pub async fn register(
        db: &InMemoryDatabase,
        name: &str,
        teach: &[&str],
        learn: &[&str],
    ) -> UserProfile {
        db.create_user(NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            hashed_password: "not-a-real-hash".to_string(),
            bio: Some(format!("{} likes swapping skills", name)),
            avatar: None,
            teach_skills: to_strings(teach),
            learn_skills: to_strings(learn),
        })
        .await
        .unwrap()
    }

    /// Records every notification and answers with a fixed delivery result.
    pub struct RecordingNotifier {
        pub delivered: bool,
        pub sent: Mutex<Vec<(String, String, String, Uuid)>>,
    }

    impl RecordingNotifier {
        pub fn new(delivered: bool) -> Self {
            Self {
                delivered,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NotificationService for RecordingNotifier {
        async fn notify_connection_request(
            &self,
            to_email: &str,
            from_name: &str,
            to_name: &str,
            request_id: Uuid,
        ) -> bool {
            self.sent.lock().unwrap().push((
                to_email.to_string(),
                from_name.to_string(),
                to_name.to_string(),
                request_id,
            ));
            self.delivered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::register;
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = InMemoryDatabase::new();
        register(&db, "Alice", &[], &[]).await;
        let err = db
            .create_user(NewUser {
                name: "Other Alice".to_string(),
                email: "alice@example.com".to_string(),
                hashed_password: "x".to_string(),
                bio: None,
                avatar: None,
                teach_skills: vec![],
                learn_skills: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_expired_auth_session_is_rejected() {
        let db = InMemoryDatabase::new();
        let alice = register(&db, "Alice", &[], &[]).await;
        db.create_auth_session("old", alice.id, Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        db.create_auth_session("fresh", alice.id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        assert!(matches!(
            db.validate_auth_session("old").await,
            Err(PortError::Unauthorized)
        ));
        assert_eq!(db.validate_auth_session("fresh").await.unwrap(), alice.id);

        db.delete_auth_session("fresh").await.unwrap();
        assert!(db.validate_auth_session("fresh").await.is_err());
    }

    #[tokio::test]
    async fn test_new_session_prunes_expired_ones() {
        let db = InMemoryDatabase::new();
        let alice = register(&db, "Alice", &[], &[]).await;
        db.create_auth_session("old", alice.id, Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        db.create_auth_session("new", alice.id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        let tables = db.tables.read().await;
        assert!(!tables.auth_sessions.contains_key("old"));
        assert!(tables.auth_sessions.contains_key("new"));
    }

    #[tokio::test]
    async fn test_skills_update_replaces_only_supplied_lists() {
        let db = InMemoryDatabase::new();
        let alice = register(&db, "Alice", &["CSS"], &["SQL"]).await;
        let updated = db
            .update_skills(
                alice.id,
                SkillsUpdate {
                    teach_skills: Some(vec!["Go".to_string(), "Rust".to_string()]),
                    learn_skills: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.teach_skills, vec!["Go", "Rust"]);
        assert_eq!(updated.learn_skills, vec!["SQL"]);
    }
}
