pub mod db;
pub mod notifier;

pub use db::DbAdapter;
pub use notifier::{LogNotifier, WebhookNotifier};
