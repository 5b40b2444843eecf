//! crates/skill_swap_core/src/graph.rs
//!
//! Read access to the mutual connections created by accepted requests.
//! Edges are only ever added by `ConnectionLedger::respond`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{UserId, UserProfile};
use crate::ports::{DatabaseService, PortResult};

#[derive(Clone)]
pub struct ConnectionGraph {
    db: Arc<dyn DatabaseService>,
}

impl ConnectionGraph {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn are_connected(&self, a: UserId, b: UserId) -> PortResult<bool> {
        if a == b {
            return Ok(false);
        }
        self.db.are_connected(a, b).await
    }

    /// Full profiles of everyone connected to `user_id`, oldest connection first.
    pub async fn list_connections(&self, user_id: UserId) -> PortResult<Vec<UserProfile>> {
        // Surfaces NotFound for an unknown user instead of an empty list.
        self.db.get_profile(user_id).await?;

        let peer_ids = self.db.list_connection_ids(user_id).await?;
        let mut by_id: HashMap<UserId, UserProfile> = self
            .db
            .get_profiles(&peer_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(peer_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }
}
