//! Immutable listing state shared by request handlers

use std::ops::Deref;
use std::sync::Arc;

use crate::handle::FileHandle;
use crate::resolver::FileResolver;

/// Immutable ordered set of handles bound to one server instance
///
/// Cloning is cheap; all clones share the same listing.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    handles: Arc<[FileHandle]>,
}

impl Snapshot {
    pub fn new(handles: Vec<FileHandle>) -> Self {
        Self {
            handles: handles.into(),
        }
    }

    /// First handle whose canonical key equals `key`
    ///
    /// Duplicate keys are allowed; the earliest entry wins.
    pub fn find(&self, key: &str) -> Option<&FileHandle> {
        self.handles.iter().find(|h| h.canonical_key() == key)
    }

    pub fn handles(&self) -> &[FileHandle] {
        &self.handles
    }
}

impl Deref for Snapshot {
    type Target = [FileHandle];

    fn deref(&self) -> &Self::Target {
        &self.handles
    }
}

impl From<Vec<FileHandle>> for Snapshot {
    fn from(handles: Vec<FileHandle>) -> Self {
        Self::new(handles)
    }
}

/// State handed to every request of one server instance
pub(crate) struct AppState<R> {
    pub snapshot: Snapshot,
    pub resolver: Arc<R>,
}

impl<R: FileResolver> AppState<R> {
    pub fn new(snapshot: Snapshot, resolver: Arc<R>) -> Self {
        Self { snapshot, resolver }
    }
}

// Manual impl: the resolver itself need not be Clone.
impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}
