pub mod domain;
pub mod graph;
pub mod ledger;
pub mod matcher;
pub mod memory;
pub mod ports;
pub mod scheduler;

pub use domain::{
    Appointment, AppointmentPatch, AppointmentStatus, AppointmentView, ConnectionRequest,
    Decision, Frequency, MatchCandidate, NewAppointment, NewUser, PendingRequest, PublicProfile,
    RecurrencePattern, RequestStatus, SentRequest, SkillsUpdate, UserCredentials, UserId,
    UserProfile,
};
pub use graph::ConnectionGraph;
pub use ledger::{ConnectionLedger, DEFAULT_REQUEST_MESSAGE};
pub use matcher::{find_matches, Matcher};
pub use memory::InMemoryDatabase;
pub use ports::{DatabaseService, NotificationService, PortError, PortResult};
pub use scheduler::AppointmentScheduler;
