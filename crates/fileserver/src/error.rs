//! Error types for the file server

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced to the caller driving the server lifecycle
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listen address '{addr}'")]
    InvalidAddress { addr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Whether the error means the port is already taken
    pub fn is_addr_in_use(&self) -> bool {
        matches!(
            self,
            ServerError::Bind { source, .. } if source.kind() == std::io::ErrorKind::AddrInUse
        )
    }
}

/// Errors from the resolution collaborator
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot open {key}: {source}")]
    Open {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{key} is no longer available")]
    Unavailable { key: String },
}

/// Per-request failures, rendered as HTML error responses
#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Html(message)).into_response()
    }
}

/// Bind error helper keeping the attempted address in the message
pub(crate) fn bind_error(addr: SocketAddr, source: std::io::Error) -> ServerError {
    ServerError::Bind {
        addr: addr.to_string(),
        source,
    }
}
