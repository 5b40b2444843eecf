pub mod appointments;
pub mod auth;
pub mod connections;
pub mod dto;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod users;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            warn!("Ignoring invalid CORS_ORIGIN '{}': {}", origin, e);
            cors
        }
    }
}

/// Builds the full application: the `/api` routes plus Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/users/me", get(users::get_me).put(users::update_skills))
        .route("/users/matches", get(users::get_matches))
        .route("/users/connect/{user_id}", post(connections::send_request))
        .route("/users/requests", get(connections::list_requests))
        .route(
            "/users/requests/{id}/accept",
            post(connections::accept_request),
        )
        .route(
            "/users/requests/{id}/reject",
            post(connections::reject_request),
        )
        .route("/users/connections", get(connections::list_connections))
        .route(
            "/users/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/users/appointments/{id}",
            patch(appointments::update_appointment).delete(appointments::delete_appointment),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let cors = cors_layer(&app_state.config.cors_origin);

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state);

    Router::new()
        .nest("/api", api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
