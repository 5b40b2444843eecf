//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, LogNotifier, WebhookNotifier},
    config::Config,
    error::ApiError,
    web::{self, state::AppState},
};
use skill_swap_core::ports::{DatabaseService, NotificationService};
use skill_swap_core::InMemoryDatabase;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store. Data is lost on restart.");
            Arc::new(InMemoryDatabase::new())
        }
    };

    // --- 3. Initialize the Notification Adapter ---
    let notifier: Arc<dyn NotificationService> = match &config.notify_webhook_url {
        Some(webhook_url) => {
            let client = reqwest::Client::builder()
                .timeout(WEBHOOK_TIMEOUT)
                .build()
                .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;
            info!("Connection request notifications go to {}", webhook_url);
            Arc::new(WebhookNotifier::new(
                client,
                webhook_url.clone(),
                config.app_base_url.clone(),
            ))
        }
        None => {
            info!("NOTIFY_WEBHOOK_URL is not set; notifications are written to the log.");
            Arc::new(LogNotifier::new(config.app_base_url.clone()))
        }
    };

    // --- 4. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(db, notifier, config.clone()));
    let app = web::router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
