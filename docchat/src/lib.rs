//! # Docchat
//!
//! Retrieval-augmented chat server. A single `POST /api/chat` endpoint runs
//! the chat agent from [`docchat_agents`] against the configured LLM and
//! document retriever, and streams the agent's events to the browser as
//! server-sent events.
//!
//! ```rust,no_run
//! use docchat::{app, state::AppState};
//! use docchat_core::config::AppConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::from_env()?;
//! let state = AppState::from_config(&config).await?;
//! let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
//! axum::serve(listener, app(state)).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};

pub use error::ApiError;
pub use state::AppState;

/// Path of the chat endpoint.
pub const CHAT_PATH: &str = "/api/chat";

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route(CHAT_PATH, post(routes::chat))
        .route("/api/files/data/{file}", get(routes::data_file))
        .with_state(state)
}
