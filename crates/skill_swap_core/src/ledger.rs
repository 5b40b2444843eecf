//! crates/skill_swap_core/src/ledger.rs
//!
//! The connection request ledger: creating requests between users, listing the
//! ones waiting on a recipient, and resolving them exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    ConnectionRequest, Decision, PendingRequest, PublicProfile, SentRequest, UserId,
};
use crate::ports::{DatabaseService, NotificationService, PortError, PortResult};

/// Used when a request is sent without a message, or with a blank one.
pub const DEFAULT_REQUEST_MESSAGE: &str = "I would like to connect with you for skill exchange!";

#[derive(Clone)]
pub struct ConnectionLedger {
    db: Arc<dyn DatabaseService>,
    notifier: Arc<dyn NotificationService>,
}

impl ConnectionLedger {
    pub fn new(db: Arc<dyn DatabaseService>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { db, notifier }
    }

    /// Sends a connection request from `from` to `to`.
    ///
    /// Checks run in order and the first failure wins: self request, existing
    /// connection, existing request in any status. The store enforces the
    /// `(from, to)` uniqueness again on insert, so two racing calls cannot both
    /// succeed. Notification failure does not undo the request.
    pub async fn send_request(
        &self,
        from: UserId,
        to: UserId,
        message: Option<String>,
    ) -> PortResult<SentRequest> {
        if from == to {
            return Err(PortError::SelfConnection);
        }
        let sender = self.db.get_profile(from).await?;
        let recipient = self.db.get_profile(to).await?;

        if self.db.are_connected(from, to).await? {
            return Err(PortError::AlreadyConnected);
        }
        if self.db.find_connection_request(from, to).await?.is_some() {
            return Err(PortError::DuplicateRequest);
        }

        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REQUEST_MESSAGE.to_string());
        let request = self
            .db
            .insert_connection_request(from, to, &message)
            .await?;
        info!(request_id = %request.id, %from, %to, "connection request created");

        let notification_sent = self
            .notifier
            .notify_connection_request(&recipient.email, &sender.name, &recipient.name, request.id)
            .await;
        if !notification_sent {
            warn!(request_id = %request.id, "connection request notification was not delivered");
        }

        Ok(SentRequest {
            request,
            notification_sent,
        })
    }

    /// Pending requests addressed to `to`, oldest first, with the sender's public profile.
    pub async fn list_pending(&self, to: UserId) -> PortResult<Vec<PendingRequest>> {
        let requests = self.db.list_pending_requests(to).await?;
        let sender_ids: Vec<UserId> = requests.iter().map(|r| r.from).collect();
        let senders: HashMap<UserId, PublicProfile> = self
            .db
            .get_profiles(&sender_ids)
            .await?
            .iter()
            .map(|p| (p.id, PublicProfile::from(p)))
            .collect();

        let mut pending = Vec::with_capacity(requests.len());
        for request in requests {
            match senders.get(&request.from) {
                Some(from) => pending.push(PendingRequest {
                    from: from.clone(),
                    request,
                }),
                None => warn!(request_id = %request.id, "sender of pending request no longer exists"),
            }
        }
        Ok(pending)
    }

    /// Accepts or rejects a pending request. Only the recipient may respond, and
    /// only once. Accepting connects both users in the same storage transaction
    /// that marks the request accepted.
    pub async fn respond(
        &self,
        request_id: Uuid,
        responder: UserId,
        decision: Decision,
    ) -> PortResult<ConnectionRequest> {
        let request = self.db.get_connection_request(request_id).await?;
        if request.to != responder {
            return Err(PortError::NotAuthorized(
                "only the recipient may respond to a request".to_string(),
            ));
        }
        if request.status.is_terminal() {
            return Err(PortError::AlreadyProcessed);
        }

        let resolved = self
            .db
            .resolve_connection_request(request_id, decision.resulting_status())
            .await?;
        info!(%request_id, status = %resolved.status, "connection request resolved");
        Ok(resolved)
    }
}
