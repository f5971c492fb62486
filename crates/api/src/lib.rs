//! # Tutorbook API
//!
//! Web server for the teacher time-slot reservation service. It exposes the
//! three operations the enrollment subsystem consumes (reserve, release,
//! capacity lookup), the availability-publishing surface for teacher-profile
//! management, and an on-demand reconciliation endpoint.
//!
//! ## Architecture
//!
//! - **Routes**: endpoint and URL structure
//! - **Handlers**: request processing, input parsing and error mapping
//! - **Middleware**: error-to-HTTP translation
//! - **Config**: environment configuration
//!
//! The API uses Axum as the web framework and SQLx for database access; all
//! booking invariants are enforced in the `tutorbook-db` repositories.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement endpoint logic
pub mod handlers;
/// Middleware for error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use eyre::{Result, WrapErr};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state accessible to all request handlers.
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
}

/// Assembles the application router: routes, shared state, CORS and the
/// request timeout.
///
/// # Errors
///
/// Returns an error if a configured CORS origin is not a valid header
/// value.
pub fn build_router(config: &config::ApiConfig, db_pool: PgPool) -> Result<Router> {
    // Create shared state with dependencies
    let state = Arc::new(ApiState { db_pool });

    // Build the application router with all routes
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Teacher availability endpoints
        .merge(routes::availability::routes())
        // Reservation endpoints
        .merge(routes::reservation::routes())
        // Attach shared state to all routes
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let mut allowed = Vec::with_capacity(origins.len());
        for origin in origins {
            let value: HeaderValue = origin
                .parse()
                .wrap_err_with(|| format!("Invalid CORS origin '{}'", origin))?;
            allowed.push(value);
        }

        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(allowed)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(TimeoutLayer::new(std::time::Duration::from_secs(
        config.request_timeout,
    )));

    Ok(app)
}

/// Starts the API server with the provided configuration and database pool.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let app = build_router(&config, db_pool)?;

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
