//! CollabHub Backend
//!
//! REST backend for a platform where students discover, post, and join
//! collaborative technical projects: project listings, an application
//! approval workflow, team messaging, and peer ratings over SQLite.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod lifecycle;
mod membership;
mod models;
mod pubsub;
mod ratings;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use pubsub::MessageHub;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub hub: MessageHub,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CollabHub Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (COLLABHUB_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState {
        repo,
        hub: MessageHub::new(),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Projects
        .route("/projects", get(api::list_projects))
        .route("/projects", post(api::create_project))
        .route("/projects/{id}", get(api::get_project))
        .route("/projects/{id}", put(api::update_project))
        .route("/projects/{id}", delete(api::delete_project))
        // Applications
        .route("/projects/{id}/applications", post(api::submit_application))
        .route(
            "/projects/{id}/applications",
            get(api::list_project_applications),
        )
        .route("/applications", get(api::list_my_applications))
        .route("/applications/received", get(api::list_received_applications))
        .route(
            "/applications/{id}/status",
            patch(api::update_application_status),
        )
        // Teammates
        .route("/projects/{id}/teammates", get(api::list_teammates))
        // Messages
        .route("/projects/{id}/messages", get(api::list_messages))
        .route("/projects/{id}/messages", post(api::post_message))
        .route("/projects/{id}/messages/stream", get(api::stream_messages))
        // Ratings
        .route("/projects/{id}/ratings", post(api::submit_rating))
        .route(
            "/projects/{id}/ratings/{rated_user_id}",
            get(api::get_my_rating),
        )
        .route("/users/{id}/ratings", get(api::list_user_ratings))
        .route("/users/{id}/rating-stats", get(api::get_user_rating_stats))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
