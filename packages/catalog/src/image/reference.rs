use std::fmt;

use common::storage::BlobKey;
use serde::{Deserialize, Serialize};

use super::ImageError;

/// Path prefix under which store blobs are published.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// The image reference recorded on a catalog entry.
///
/// Either a store-relative path (`/uploads/<key>`) or an absolute `http(s)` URL
/// hosted elsewhere. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    /// Store-relative reference for a blob key.
    pub fn for_key(key: &BlobKey) -> Self {
        Self(format!("{UPLOADS_PREFIX}{key}"))
    }

    /// Reference to an externally hosted image; must be an absolute `http(s)` URL.
    pub fn external(url: &str) -> Result<Self, ImageError> {
        let url = url.trim();
        let has_host = strip_scheme(url).is_some_and(|rest| {
            rest.split('/').next().is_some_and(|host| !host.is_empty())
        });
        if !has_host || url.chars().any(char::is_whitespace) {
            return Err(ImageError::InvalidImageFormat(
                "image URL must be an absolute http(s) URL".into(),
            ));
        }
        Ok(Self(url.to_string()))
    }

    /// Wrap a reference loaded from the record store. Blank values mean "no image".
    pub fn from_stored(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether this reference is an absolute URL outside the store.
    pub fn is_external(&self) -> bool {
        strip_scheme(&self.0).is_some()
    }

    /// Store key this reference points at.
    ///
    /// `None` for absolute URLs and for relative paths that do not name a
    /// single flat blob (e.g. nested or traversal paths).
    pub fn to_store_key(&self) -> Option<BlobKey> {
        if self.is_external() {
            return None;
        }
        let path = self.0.trim();
        let name = path
            .strip_prefix(UPLOADS_PREFIX)
            .or_else(|| path.strip_prefix(&UPLOADS_PREFIX[1..]))
            .or_else(|| path.strip_prefix('/'))
            .unwrap_or(path);
        BlobKey::parse(name).ok()
    }

    /// Public URL for this reference.
    ///
    /// Absolute URLs are returned unchanged; store-relative paths are appended
    /// to `base_url` (scheme and host, no trailing slash needed).
    pub fn to_public_url(&self, base_url: &str) -> String {
        if self.is_external() {
            return self.0.clone();
        }
        let base = base_url.trim_end_matches('/');
        if self.0.starts_with('/') {
            format!("{base}{}", self.0)
        } else {
            format!("{base}/{}", self.0)
        }
    }
}

/// The part after `http://` or `https://`, matched case-insensitively.
fn strip_scheme(s: &str) -> Option<&str> {
    ["http://", "https://"].iter().find_map(|scheme| {
        s.get(..scheme.len())
            .filter(|head| head.eq_ignore_ascii_case(scheme))
            .map(|_| &s[scheme.len()..])
    })
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
