//! # Tweet Refiner
//!
//! A Rust web service for drafting a tweet, refining it with an OpenAI model and
//! posting it to Twitter/X.
//!
//! ## Environment Variables
//!
//! Required: `OPENAI_API_KEY`, `TWITTER_BEARER_TOKEN`, `TWITTER_API_KEY`,
//! `TWITTER_API_KEY_SECRET`, `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`.
//!
//! Optional: `OPENAI_MODEL`, `OPENAI_TEMPERATURE`, `OPENAI_BASE_URL`,
//! `TWITTER_API_BASE_URL`, `PORT`, `HTTP_TIMEOUT_SECS`, `SESSION_IDLE_MINUTES`.

use axum::http::{header, HeaderValue};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use tweet_refiner::{
    router, AppState, Config, OpenAiClient, SessionStore, TweetRefiner, TwitterClient,
};

/// Main entry point for the tweet refiner web service.
///
/// Loads and validates the configuration, builds the API clients, and serves the
/// page until Ctrl-C is received.
///
/// # Middleware
///
/// - HTTP request tracing
/// - `x-content-type-options: nosniff` and `cache-control: no-store` on every response
///
/// # Logging
///
/// The application uses the `env_logger` crate for structured logging. Log levels
/// can be controlled via the `RUST_LOG` environment variable.
///
/// # Example Usage
///
/// ```bash
/// # Run with debug logging on a custom port
/// RUST_LOG=debug PORT=8080 cargo run
/// ```
///
/// # Exit Status
///
/// Exits with status 1 before serving anything if a required credential is missing,
/// a setting is invalid, or the port cannot be bound.
#[tokio::main]
async fn main() {
    // Initialize the logging system
    env_logger::init();

    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;

    let generator = OpenAiClient::from_config(&config.openai, config.http_timeout)?;
    let publisher = TwitterClient::from_config(&config.twitter, config.http_timeout)?;
    let state = AppState {
        refiner: Arc::new(TweetRefiner::new(Arc::new(generator), Arc::new(publisher))),
        sessions: Arc::new(SessionStore::new(config.session_idle)),
    };

    // Build the HTTP application with all routes and middleware
    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
    );

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Starting tweet refiner server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
