//! Opaque file handles shared through the server
//!
//! A handle is a canonical key (a path or URI understood by the resolver)
//! plus a disambiguation tag attached when the file was picked. Only the key
//! takes part in equality and lookup.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Query parameter carrying the tag in the tagged string form
const TAG_PARAM: &str = "timestamp";

/// Name used when a key has no usable last segment
const UNKNOWN_NAME: &str = "Unknown";

/// A file picked for sharing
#[derive(Debug, Clone)]
pub struct FileHandle {
    /// Key used for equality and lookup
    canonical_key: String,
    /// Disambiguation tag, empty for untagged handles
    tag: String,
}

impl FileHandle {
    /// Create a handle from a canonical key and a tag
    pub fn new(canonical_key: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            canonical_key: canonical_key.into(),
            tag: tag.into(),
        }
    }

    /// Create a handle without a tag
    pub fn untagged(canonical_key: impl Into<String>) -> Self {
        Self::new(canonical_key, String::new())
    }

    /// Render the tagged form `<key>?timestamp=<tag>`, or the bare key when
    /// untagged
    pub fn tagged(&self) -> String {
        if self.tag.is_empty() {
            self.canonical_key.clone()
        } else {
            format!("{}?{}={}", self.canonical_key, TAG_PARAM, self.tag)
        }
    }

    pub fn canonical_key(&self) -> &str {
        &self.canonical_key
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Name offered to downloaders, derived from the canonical key
    pub fn display_name(&self) -> String {
        display_name(&self.canonical_key)
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_key == other.canonical_key
    }
}

impl Eq for FileHandle {}

impl Hash for FileHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_key.hash(state);
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key)
    }
}

/// Derive a display name from a canonical key
///
/// Takes the last non-empty `/` segment, percent-decodes it, and keeps the
/// part after the last path separator inside it. Content URIs often encode a
/// whole path in one segment (`primary%3ADownload%2Freport.pdf`).
pub fn display_name(key: &str) -> String {
    let Some(segment) = key.split('/').filter(|s| !s.is_empty()).last() else {
        return UNKNOWN_NAME.to_string();
    };

    let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
    match decoded.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => UNKNOWN_NAME.to_string(),
    }
}
