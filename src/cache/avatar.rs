//! Avatar post-processing of upstream payloads.
//!
//! The upstream sometimes omits `data.face`. A payload is patched with, in
//! order of preference: the value it carries, the last value seen from the
//! upstream, the configured default.

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::cache::store::{CacheEntry, CacheStore, AVATAR_KEY};
use crate::config::{MissingDataPolicy, SonglistConfig};

/// Errors raised while patching a payload.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("payload is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no `data` object")]
    MissingData,

    #[error("failed to re-encode payload: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Where the avatar written into a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarSource {
    Upstream,
    Cached,
    Default,
}

/// Rewrites `data.face`, remembering upstream-observed values in the store.
#[derive(Clone)]
pub struct AvatarPatcher {
    store: CacheStore,
    default_avatar: String,
    remember_fallback: bool,
    missing_data: MissingDataPolicy,
}

impl AvatarPatcher {
    pub fn new(store: CacheStore, config: &SonglistConfig) -> Self {
        Self {
            store,
            default_avatar: config.default_avatar.clone(),
            remember_fallback: config.remember_fallback_avatar,
            missing_data: config.missing_data,
        }
    }

    /// Patch `payload` and return the bytes to cache.
    pub fn patch(&self, payload: &[u8]) -> Result<Bytes, PatchError> {
        let mut root: Value = serde_json::from_slice(payload).map_err(PatchError::Decode)?;
        let object = root.as_object_mut().ok_or(PatchError::NotAnObject)?;

        let Some(data) = object.get_mut("data").and_then(Value::as_object_mut) else {
            return match self.missing_data {
                MissingDataPolicy::Reject => Err(PatchError::MissingData),
                MissingDataPolicy::PassThrough => {
                    tracing::warn!("Upstream payload has no data object, passing it through");
                    Ok(Bytes::copy_from_slice(payload))
                }
            };
        };

        let observed = data
            .get("face")
            .and_then(Value::as_str)
            .filter(|face| !face.is_empty())
            .map(str::to_owned);

        match observed {
            Some(face) => {
                tracing::trace!(source = ?AvatarSource::Upstream, avatar = %face, "Remembering avatar");
                self.remember(&face);
            }
            None => {
                let (face, source) = self.fallback();
                tracing::debug!(source = ?source, avatar = %face, "No avatar in payload, using fallback");
                if self.remember_fallback {
                    self.remember(&face);
                }
                data.insert("face".to_string(), Value::String(face));
            }
        }

        serde_json::to_vec(&root)
            .map(Bytes::from)
            .map_err(PatchError::Encode)
    }

    /// The avatar to use when the payload has none.
    pub fn fallback(&self) -> (String, AvatarSource) {
        match self.store.get(AVATAR_KEY) {
            Some(entry) => (
                String::from_utf8_lossy(&entry.payload).into_owned(),
                AvatarSource::Cached,
            ),
            None => (self.default_avatar.clone(), AvatarSource::Default),
        }
    }

    fn remember(&self, face: &str) {
        self.store
            .put(AVATAR_KEY, CacheEntry::new(Bytes::copy_from_slice(face.as_bytes())));
    }
}
