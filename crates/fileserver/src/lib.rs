//! HTTP file server for sharing picked files on the local network
//!
//! This crate serves an arbitrary selection of files without copying them:
//! a [`HandleRegistry`] holds the selection and owns a [`FileServer`] that
//! renders an index page and streams file content through a
//! [`FileResolver`].

mod config;
mod error;
mod handle;
mod page;
mod registry;
mod resolver;
mod routes;
mod server;
mod state;

#[cfg(test)]
mod testing;

pub use config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT, HOST_ENV, PORT_ENV};
pub use error::{ResolveError, ServerError};
pub use handle::{display_name, FileHandle};
pub use page::{file_href, render_index};
pub use registry::HandleRegistry;
pub use resolver::{FileResolver, FsResolver};
pub use server::FileServer;
pub use state::Snapshot;

/// Result type alias for file server operations
pub type Result<T> = std::result::Result<T, ServerError>;
