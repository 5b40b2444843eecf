//! services/api/src/bin/seed.rs
//!
//! Inserts a handful of demo users into the configured database. Users whose
//! email already exists are left untouched, so the command can be re-run.

use api_lib::{adapters::DbAdapter, config::Config, error::ApiError, web::auth::hash_password};
use skill_swap_core::domain::NewUser;
use skill_swap_core::ports::{DatabaseService, PortError};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_PASSWORD: &str = "Password1";

struct DemoUser {
    name: &'static str,
    email: &'static str,
    bio: &'static str,
    teach: &'static [&'static str],
    learn: &'static [&'static str],
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        name: "Alice Smith",
        email: "alice@example.com",
        bio: "Frontend developer and React enthusiast.",
        teach: &["React", "CSS", "HTML"],
        learn: &["Node.js", "MongoDB"],
    },
    DemoUser {
        name: "Bob Johnson",
        email: "bob@example.com",
        bio: "Backend developer who loves Node.js.",
        teach: &["Node.js", "Express"],
        learn: &["React", "CSS"],
    },
    DemoUser {
        name: "Carol Lee",
        email: "carol@example.com",
        bio: "Fullstack dev, always learning.",
        teach: &["MongoDB", "Express"],
        learn: &["HTML", "CSS"],
    },
    DemoUser {
        name: "David Kim",
        email: "david@example.com",
        bio: "UI/UX designer and CSS wizard.",
        teach: &["CSS", "Figma"],
        learn: &["Node.js", "MongoDB"],
    },
    DemoUser {
        name: "Eva Brown",
        email: "eva@example.com",
        bio: "Database expert and data lover.",
        teach: &["MongoDB", "SQL"],
        learn: &["React", "Figma"],
    },
];

fn to_strings(skills: &[&str]) -> Vec<String> {
    skills.iter().map(|s| s.to_string()).collect()
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(config.require_database_url()?)
        .await?;
    let db = DbAdapter::new(db_pool);
    db.run_migrations().await?;

    let mut created = 0;
    for user in DEMO_USERS {
        match db.get_user_by_email(user.email).await {
            Ok(_) => {
                info!("{} already exists, skipping", user.email);
                continue;
            }
            Err(PortError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let profile = db
            .create_user(NewUser {
                name: user.name.to_string(),
                email: user.email.to_string(),
                hashed_password: hash_password(DEMO_PASSWORD)?,
                bio: Some(user.bio.to_string()),
                avatar: None,
                teach_skills: to_strings(user.teach),
                learn_skills: to_strings(user.learn),
            })
            .await?;
        info!(user_id = %profile.id, "Seeded {}", profile.email);
        created += 1;
    }

    info!(
        "Seeding complete: {} created, {} skipped",
        created,
        DEMO_USERS.len() - created
    );
    Ok(())
}
