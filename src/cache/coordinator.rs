//! Fetch coordination: stale-while-revalidate with single-flight refresh.
//!
//! # Responsibilities
//! - Serve cached bytes immediately and refresh them in the background
//! - Drive the fetch synchronously on a cold miss
//! - Guarantee at most one upstream fetch per key at any time
//! - Let cold-start callers share the running fetch's result
//!
//! # Ordering
//! For one fetch of a key: registration, upstream call, cache write,
//! registration release, completion signal. A woken waiter therefore always
//! reads the entry that fetch wrote (or the pre-existing one if it failed).

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::cache::avatar::{AvatarPatcher, PatchError};
use crate::cache::in_flight::{FetchGuard, InFlightTable, Registration};
use crate::cache::store::{CacheEntry, CacheStore, AVATAR_KEY};
use crate::config::SonglistConfig;
use crate::observability::metrics;
use crate::upstream::{Upstream, UpstreamError};

/// Why a fetch did not produce a cache entry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Owns the cached entries, the in-flight table and the upstream client.
///
/// Built once at startup and shared through an `Arc`.
pub struct CacheService<U> {
    store: CacheStore,
    in_flight: InFlightTable,
    patcher: AvatarPatcher,
    upstream: U,
}

impl<U: Upstream> CacheService<U> {
    /// Create a service with an empty cache.
    pub fn new(upstream: U, songlist: &SonglistConfig) -> Arc<Self> {
        let store = CacheStore::new();
        Arc::new(Self {
            patcher: AvatarPatcher::new(store.clone(), songlist),
            store,
            in_flight: InFlightTable::new(),
            upstream,
        })
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn in_flight(&self) -> &InFlightTable {
        &self.in_flight
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Return the payload for `key`, fetching it if nothing is cached.
    ///
    /// `None` means nothing could be served (cold miss and failed fetch).
    pub async fn get_or_refresh(self: &Arc<Self>, key: &str, headers: &HeaderMap) -> Option<Bytes> {
        if key == AVATAR_KEY {
            tracing::warn!(cache_key = %key, "Refusing lookup of reserved cache key");
            return None;
        }

        match self.store.get(key) {
            Some(entry) => {
                tracing::debug!(cache_key = %key, age_ms = entry.age_ms(), "Cache hit");
                metrics::record_cache_lookup(true);
                self.refresh_in_background(key, headers);
                Some(entry.payload)
            }
            None => {
                tracing::debug!(cache_key = %key, "Cache miss");
                metrics::record_cache_lookup(false);
                self.refresh(key, headers).await
            }
        }
    }

    /// Refresh `key` and wait for the result.
    ///
    /// Joins a fetch that is already running instead of starting another.
    pub async fn refresh(self: &Arc<Self>, key: &str, headers: &HeaderMap) -> Option<Bytes> {
        match self.in_flight.register(key) {
            Registration::Acquired(guard) => {
                // The fetch lives on its own task so a caller going away
                // does not cancel it.
                match self.spawn_fetch(guard, headers).await {
                    Ok(Ok(payload)) => Some(payload),
                    Ok(Err(_)) => self.cached_payload(key),
                    Err(e) => {
                        tracing::error!(cache_key = %key, error = %e, "Fetch task failed");
                        self.cached_payload(key)
                    }
                }
            }
            Registration::Busy(completion) => {
                tracing::debug!(cache_key = %key, "Waiting for running fetch");
                metrics::record_waiter();
                completion.wait().await;
                self.cached_payload(key)
            }
        }
    }

    /// Start a refresh for `key` unless one is running, without waiting.
    pub fn refresh_in_background(self: &Arc<Self>, key: &str, headers: &HeaderMap) {
        match self.in_flight.register(key) {
            Registration::Acquired(guard) => {
                drop(self.spawn_fetch(guard, headers));
            }
            Registration::Busy(_) => {
                tracing::debug!(cache_key = %key, "Refresh already running, skipping");
                metrics::record_refresh_skipped();
            }
        }
    }

    fn spawn_fetch(
        self: &Arc<Self>,
        guard: FetchGuard,
        headers: &HeaderMap,
    ) -> JoinHandle<Result<Bytes, FetchError>> {
        let service = Arc::clone(self);
        let headers = headers.clone();
        tokio::spawn(async move {
            let result = service.fetch_and_store(guard.key(), &headers).await;
            if let Err(e) = &result {
                tracing::warn!(cache_key = %guard.key(), error = %e, "Refresh failed, keeping cached entry");
            }
            // Release and signal only after the cache write.
            drop(guard);
            result
        })
    }

    /// Fetch, patch and store the payload for `key`.
    async fn fetch_and_store(&self, key: &str, headers: &HeaderMap) -> Result<Bytes, FetchError> {
        tracing::info!(cache_key = %key, "Refreshing cache entry");
        let start = Instant::now();

        let result = self.fetch_patched(headers).await;
        metrics::record_upstream_fetch(result.is_ok(), start);

        let payload = result?;
        self.store.put(key, CacheEntry::new(payload.clone()));

        tracing::info!(
            cache_key = %key,
            elapsed_ms = start.elapsed().as_millis() as u64,
            bytes = payload.len(),
            "Cache entry refreshed"
        );
        Ok(payload)
    }

    async fn fetch_patched(&self, headers: &HeaderMap) -> Result<Bytes, FetchError> {
        let raw = self.upstream.fetch(headers).await?;
        Ok(self.patcher.patch(&raw)?)
    }

    fn cached_payload(&self, key: &str) -> Option<Bytes> {
        self.store.get(key).map(|entry| entry.payload)
    }
}
