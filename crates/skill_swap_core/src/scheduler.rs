//! crates/skill_swap_core/src/scheduler.rs
//!
//! Creates, lists, updates and deletes appointments between users.
//!
//! Known gaps kept on purpose:
//! - `start_time` is not required to precede `end_time`; a warning is logged.
//! - Any participant may set any status at any time.
//! - Participants are not checked against the creator's connections here.
//! - `participant_ids` are not checked for existence. Unknown ids are stored
//!   and then left out whenever the appointment is resolved for display.
//! - Concurrent updates are last-write-wins.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentPatch, AppointmentStatus, AppointmentView, NewAppointment,
    PublicProfile, RecurrencePattern, UserId,
};
use crate::ports::{DatabaseService, PortError, PortResult};

fn require_text(field: &str, value: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        return Err(PortError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// A `none` frequency means no recurrence at all, so it is dropped before
/// the remaining fields are checked.
fn normalized_recurrence(
    recurrence: Option<RecurrencePattern>,
) -> PortResult<Option<RecurrencePattern>> {
    let recurrence = RecurrencePattern::normalize(recurrence);
    if let Some(pattern) = &recurrence {
        pattern.validate()?;
    }
    Ok(recurrence)
}

fn warn_on_inverted_times(appointment: &Appointment) {
    if appointment.end_time <= appointment.start_time {
        warn!(
            appointment_id = %appointment.id,
            start = %appointment.start_time,
            end = %appointment.end_time,
            "appointment does not end after it starts"
        );
    }
}

/// `{creator} ∪ participant_ids`, creator first, duplicates dropped.
fn participant_set(creator: UserId, participant_ids: &[UserId]) -> Vec<UserId> {
    let mut participants = vec![creator];
    for id in participant_ids {
        if !participants.contains(id) {
            participants.push(*id);
        }
    }
    participants
}

#[derive(Clone)]
pub struct AppointmentScheduler {
    db: Arc<dyn DatabaseService>,
}

impl AppointmentScheduler {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create(&self, creator: UserId, new: NewAppointment) -> PortResult<Appointment> {
        if new.participant_ids.is_empty() {
            return Err(PortError::InvalidRequest(
                "At least one participant is required".to_string(),
            ));
        }
        require_text("meeting_link", &new.meeting_link)?;
        require_text("title", &new.title)?;
        let recurrence = normalized_recurrence(new.recurrence)?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            participants: participant_set(creator, &new.participant_ids),
            created_by: creator,
            meeting_link: new.meeting_link,
            title: new.title,
            description: new.description,
            start_time: new.start_time,
            end_time: new.end_time,
            status: AppointmentStatus::Scheduled,
            recurrence,
            created_at: now,
            updated_at: now,
        };
        warn_on_inverted_times(&appointment);

        let appointment = self.db.insert_appointment(appointment).await?;
        info!(
            appointment_id = %appointment.id,
            %creator,
            participants = appointment.participants.len(),
            "appointment created"
        );
        Ok(appointment)
    }

    /// Appointments `user_id` takes part in, by start time, with participants resolved.
    pub async fn list(&self, user_id: UserId) -> PortResult<Vec<AppointmentView>> {
        let appointments = self.db.list_appointments_for(user_id).await?;
        self.resolve_all(appointments).await
    }

    /// Resolves the participants of a single appointment to display-safe profiles.
    pub async fn resolve(&self, appointment: Appointment) -> PortResult<AppointmentView> {
        let mut views = self.resolve_all(vec![appointment]).await?;
        views
            .pop()
            .ok_or_else(|| PortError::Unexpected("appointment view went missing".to_string()))
    }

    async fn resolve_all(
        &self,
        appointments: Vec<Appointment>,
    ) -> PortResult<Vec<AppointmentView>> {
        let mut ids: Vec<UserId> = Vec::new();
        for appointment in &appointments {
            for id in &appointment.participants {
                if !ids.contains(id) {
                    ids.push(*id);
                }
            }
        }
        let profiles: HashMap<UserId, PublicProfile> = self
            .db
            .get_profiles(&ids)
            .await?
            .iter()
            .map(|p| (p.id, PublicProfile::from(p)))
            .collect();

        // Participants whose accounts no longer exist are left out.
        Ok(appointments
            .into_iter()
            .map(|appointment| {
                let participants = appointment
                    .participants
                    .iter()
                    .filter_map(|id| profiles.get(id).cloned())
                    .collect();
                AppointmentView {
                    appointment,
                    participants,
                }
            })
            .collect())
    }

    /// Applies `patch` on behalf of any current participant.
    ///
    /// The whole patch is validated before anything is written.
    pub async fn update(
        &self,
        appointment_id: Uuid,
        requester: UserId,
        patch: AppointmentPatch,
    ) -> PortResult<Appointment> {
        let mut appointment = self.db.get_appointment(appointment_id).await?;
        if !appointment.has_participant(requester) {
            return Err(PortError::NotAuthorized(
                "only participants may update an appointment".to_string(),
            ));
        }

        if let Some(link) = &patch.meeting_link {
            require_text("meeting_link", link)?;
        }
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }
        let recurrence = match patch.recurrence {
            Some(recurrence) => Some(normalized_recurrence(recurrence)?),
            None => None,
        };

        if let Some(status) = patch.status {
            appointment.status = status;
        }
        if let Some(link) = patch.meeting_link {
            appointment.meeting_link = link;
        }
        if let Some(title) = patch.title {
            appointment.title = title;
        }
        if let Some(description) = patch.description {
            appointment.description = description;
        }
        if let Some(start_time) = patch.start_time {
            appointment.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            appointment.end_time = end_time;
        }
        if let Some(recurrence) = recurrence {
            appointment.recurrence = recurrence;
        }
        appointment.updated_at = Utc::now();
        warn_on_inverted_times(&appointment);

        let appointment = self.db.save_appointment(appointment).await?;
        info!(
            %appointment_id,
            %requester,
            status = appointment.status.as_str(),
            "appointment updated"
        );
        Ok(appointment)
    }

    /// Deletes the appointment. Only its creator may do so.
    pub async fn cancel(&self, appointment_id: Uuid, requester: UserId) -> PortResult<()> {
        let appointment = self.db.get_appointment(appointment_id).await?;
        if appointment.created_by != requester {
            return Err(PortError::NotAuthorized(
                "only the creator can delete the appointment".to_string(),
            ));
        }
        self.db.delete_appointment(appointment_id).await?;
        info!(%appointment_id, %requester, "appointment deleted");
        Ok(())
    }
}
