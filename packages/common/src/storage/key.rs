use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Maximum length of a blob filename.
const MAX_KEY_LEN: usize = 255;

/// Last timestamp handed out by [`BlobKey::generate`], in milliseconds.
static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// A validated blob filename within the flat image store.
///
/// Keys are never reused: freshly allocated keys combine a strictly increasing
/// millisecond timestamp with a random suffix, e.g. `base64-1718000000000-482913311.png`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobKey(String);

impl BlobKey {
    /// Allocate a fresh key as `{prefix}-{timestamp}-{random}.{extension}`.
    ///
    /// Characters other than ASCII alphanumerics and `_` are dropped from the
    /// extension; an empty extension yields a key without one.
    pub fn generate(prefix: &str, extension: &str) -> Self {
        let millis = next_millis();
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        let extension: String = extension
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();

        if extension.is_empty() {
            Self(format!("{prefix}-{millis}-{suffix}"))
        } else {
            Self(format!("{prefix}-{millis}-{suffix}.{extension}"))
        }
    }

    /// Parse and validate an existing key (a flat, non-hidden filename).
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".into()));
        }
        if s.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds {MAX_KEY_LEN} bytes"
            )));
        }
        if s.chars().any(|c| c.is_control()) {
            return Err(StorageError::InvalidKey(
                "control characters are not allowed".into(),
            ));
        }
        if s.contains('/') || s.contains('\\') {
            return Err(StorageError::InvalidKey(
                "path separators are not allowed".into(),
            ));
        }
        if s.starts_with('.') {
            return Err(StorageError::InvalidKey(
                "hidden names and '..' are not allowed".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The extension after the last `.`, if any.
    pub fn extension(&self) -> Option<&str> {
        self.0
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Strictly increasing wall-clock milliseconds for this process.
fn next_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(prev + 1)
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BlobKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BlobKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
