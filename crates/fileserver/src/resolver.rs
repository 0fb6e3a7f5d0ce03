//! Translating handles into byte streams
//!
//! The server never touches storage directly. Everything it needs to know
//! about a handle at request time (a reader, a length, a MIME type) comes
//! from a [`FileResolver`].

use std::future::Future;
use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncRead;

use crate::error::ResolveError;
use crate::handle::FileHandle;

/// Resolution collaborator consumed by the file server
pub trait FileResolver: Send + Sync + 'static {
    /// Reader streamed as the response body
    type Reader: AsyncRead + Send + Unpin + 'static;

    /// Open the handle's content for reading
    fn open(
        &self,
        handle: &FileHandle,
    ) -> impl Future<Output = Result<Self::Reader, ResolveError>> + Send;

    /// Byte length of the content, `None` when it cannot be determined
    fn length(&self, handle: &FileHandle) -> impl Future<Output = Option<u64>> + Send;

    /// MIME type of the content, if known
    fn mime_type(&self, handle: &FileHandle) -> Option<String>;
}

/// Resolver for handles whose canonical key is a filesystem path
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResolver;

impl FsResolver {
    pub fn new() -> Self {
        Self
    }
}

impl FileResolver for FsResolver {
    type Reader = File;

    async fn open(&self, handle: &FileHandle) -> Result<File, ResolveError> {
        let path = Path::new(handle.canonical_key());
        File::open(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ResolveError::Unavailable {
                    key: handle.canonical_key().to_string(),
                }
            } else {
                ResolveError::Open {
                    key: handle.canonical_key().to_string(),
                    source,
                }
            }
        })
    }

    async fn length(&self, handle: &FileHandle) -> Option<u64> {
        match tokio::fs::metadata(handle.canonical_key()).await {
            Ok(metadata) if metadata.is_file() => Some(metadata.len()),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Failed to stat {}: {}", handle.canonical_key(), e);
                None
            }
        }
    }

    fn mime_type(&self, handle: &FileHandle) -> Option<String> {
        mime_guess::from_path(handle.canonical_key())
            .first()
            .map(|mime| mime.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_fs_resolver_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();
        let handle = FileHandle::untagged(path.to_string_lossy());

        let resolver = FsResolver::new();
        assert_eq!(resolver.length(&handle).await, Some(11));
        assert_eq!(resolver.mime_type(&handle).as_deref(), Some("text/plain"));

        let mut reader = resolver.open(&handle).await.unwrap();
        let mut contents = String::new();
        reader.read_to_string(&mut contents).await.unwrap();
        assert_eq!(contents, "hello world");
    }

    #[tokio::test]
    async fn test_fs_resolver_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let handle = FileHandle::untagged(dir.path().join("gone.bin").to_string_lossy());

        let resolver = FsResolver::new();
        assert!(resolver.length(&handle).await.is_none());
        assert!(matches!(
            resolver.open(&handle).await,
            Err(ResolveError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_fs_resolver_directory_has_no_length() {
        let dir = tempfile::tempdir().unwrap();
        let handle = FileHandle::untagged(dir.path().to_string_lossy());
        assert!(FsResolver::new().length(&handle).await.is_none());
    }

    #[test]
    fn test_fs_resolver_unknown_mime() {
        let handle = FileHandle::untagged("/tmp/blob.zzzunknown");
        assert!(FsResolver::new().mime_type(&handle).is_none());
    }
}
