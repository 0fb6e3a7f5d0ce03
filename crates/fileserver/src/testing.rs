//! In-memory resolver used by the crate's tests

use std::collections::HashMap;
use std::io::Cursor;

use crate::error::ResolveError;
use crate::handle::FileHandle;
use crate::resolver::FileResolver;

#[derive(Debug, Clone)]
struct MemoryFile {
    data: Vec<u8>,
    mime: Option<String>,
    open_fails: bool,
    length_unknown: bool,
}

/// Resolver serving byte buffers keyed by canonical key, with failure injection
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryResolver {
    files: HashMap<String, MemoryFile>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, key: &str, data: &[u8], mime: Option<&str>) -> Self {
        self.files.insert(
            key.to_string(),
            MemoryFile {
                data: data.to_vec(),
                mime: mime.map(str::to_string),
                open_fails: false,
                length_unknown: false,
            },
        );
        self
    }

    /// A file whose stream cannot be opened
    pub fn with_unopenable(mut self, key: &str) -> Self {
        self.files.insert(
            key.to_string(),
            MemoryFile {
                data: Vec::new(),
                mime: None,
                open_fails: true,
                length_unknown: false,
            },
        );
        self
    }

    /// A file that opens but whose size is unknown
    pub fn with_unsized(mut self, key: &str, data: &[u8]) -> Self {
        self.files.insert(
            key.to_string(),
            MemoryFile {
                data: data.to_vec(),
                mime: None,
                open_fails: false,
                length_unknown: true,
            },
        );
        self
    }
}

impl FileResolver for MemoryResolver {
    type Reader = Cursor<Vec<u8>>;

    async fn open(&self, handle: &FileHandle) -> Result<Self::Reader, ResolveError> {
        let key = handle.canonical_key();
        match self.files.get(key) {
            Some(file) if !file.open_fails => Ok(Cursor::new(file.data.clone())),
            Some(_) => Err(ResolveError::Open {
                key: key.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }),
            None => Err(ResolveError::Unavailable {
                key: key.to_string(),
            }),
        }
    }

    async fn length(&self, handle: &FileHandle) -> Option<u64> {
        self.files
            .get(handle.canonical_key())
            .filter(|file| !file.length_unknown)
            .map(|file| file.data.len() as u64)
    }

    fn mime_type(&self, handle: &FileHandle) -> Option<String> {
        self.files
            .get(handle.canonical_key())
            .and_then(|file| file.mime.clone())
    }
}
