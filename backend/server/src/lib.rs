//! Backend for a shelter finder with per-user saved locations.
//!
//! # General Infrastructure
//! - Redis holds users and saved locations
//! - Shelter lookups are proxied to the national shelter API and filtered by
//!   true distance before they reach the client
//! - Sessions are HMAC signed cookies, no server-side session table
//!
//! # Routes
//! - `POST /register`, `POST /login`: form bodies, answer with 303 redirects
//! - `GET /location/around?latitude=..&longitude=..&radius=..`: shelters
//!   within `radius` meters (default 5000), nearest first
//! - `POST /location/save_location`, `GET /location/get_locations`,
//!   `DELETE /location/delete_location/{id}`,
//!   `POST /location/update_description/{id}`: require the session cookie
//!
//! # Setup
//!
//! Secrets `SECRET_KEY` and `SERVICE_KEY` are read from `/run/secrets/`, or
//! from the environment when running outside Docker.
//! ```sh
//! SECRET_KEY=dev SERVICE_KEY=... RUST_LOG=info cargo run -p safespot
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Error;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

#[cfg(test)]
mod testing;

use config::Config;
use routes::{
    around_handler, delete_location_handler, get_locations_handler, login_handler,
    register_handler, save_location_handler, update_description_handler,
};
use state::State;

pub async fn start_server() -> Result<(), Error> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let locations = Router::new()
        .route("/around", get(around_handler))
        .route("/save_location", post(save_location_handler))
        .route("/get_locations", get(get_locations_handler))
        .route("/delete_location/{location_id}", delete(delete_location_handler))
        .route(
            "/update_description/{location_id}",
            post(update_description_handler),
        );

    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .nest("/location", locations)
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
