//! services/web/src/error.rs
//!
//! Defines the primary error type for the web front-end.

use crate::config::ConfigError;
use crate::web::views;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use englishhub_core::ports::PortError;
use tracing::error;

/// The primary error type for the `web` service.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the outbound HTTP client.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Port(PortError::Unauthorized) => Redirect::to("/login").into_response(),
            WebError::Port(PortError::NotFound(what)) => (
                StatusCode::NOT_FOUND,
                Html(views::error_page("Not found", &format!("{what} could not be found."))),
            )
                .into_response(),
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::error_page(
                        "Something went wrong",
                        "The request could not be completed. Please try again later.",
                    )),
                )
                    .into_response()
            }
        }
    }
}
