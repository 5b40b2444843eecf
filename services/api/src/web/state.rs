//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use skill_swap_core::ports::{DatabaseService, NotificationService};
use skill_swap_core::{AppointmentScheduler, ConnectionGraph, ConnectionLedger, Matcher};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub matcher: Matcher,
    pub ledger: ConnectionLedger,
    pub graph: ConnectionGraph,
    pub scheduler: AppointmentScheduler,
}

impl AppState {
    /// Wires the core components onto a storage and a notification adapter.
    pub fn new(
        db: Arc<dyn DatabaseService>,
        notifier: Arc<dyn NotificationService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            matcher: Matcher::new(db.clone()),
            ledger: ConnectionLedger::new(db.clone(), notifier),
            graph: ConnectionGraph::new(db.clone()),
            scheduler: AppointmentScheduler::new(db.clone()),
            db,
            config,
        }
    }
}
