//! Fetch scheduling and request deduplication.
//!
//! The scheduler sits between consumers and the backend: every query goes
//! through [`FetchScheduler::execute`], which consults the store first. A
//! fresh entry is returned as-is, a key with a fetch already in flight
//! attaches to that fetch instead of issuing another request, and anything
//! else leads exactly one new request whose settled outcome is shared with
//! every attached caller.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::api::ApiError;
use crate::cache::entry::{FetchOutcome, FetchStatus, ResourceValue};
use crate::cache::key::QueryKey;
use crate::cache::store::{BeginFetch, ResourceStore};

/// Source of resource data, keyed by query. Implemented by the API client;
/// tests substitute their own.
pub trait ResourceFetcher: Send + Sync {
    fn fetch(
        &self,
        key: &QueryKey,
    ) -> impl Future<Output = Result<ResourceValue, ApiError>> + Send;
}

pub struct FetchScheduler<F> {
    store: Arc<ResourceStore>,
    fetcher: Arc<F>,
}

impl<F: ResourceFetcher> FetchScheduler<F> {
    pub fn new(store: Arc<ResourceStore>, fetcher: Arc<F>) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    pub(crate) fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    /// Resolve a query: serve it from cache, attach to the in-flight fetch
    /// for the same key, or lead a new request and settle it into the store.
    pub async fn execute(&self, key: &QueryKey) -> FetchOutcome {
        match self.store.begin_fetch(key) {
            BeginFetch::Hit(value) => Ok(value),
            BeginFetch::Join(mut rx) => match rx.recv().await {
                Ok(outcome) => outcome,
                // The leader went away without broadcasting. The settled
                // value may still have landed in the store; fall back to it.
                Err(_) => {
                    debug!(key = %key, "in-flight fetch channel closed, reading store");
                    match self.store.get(key) {
                        Some(view) if view.status == FetchStatus::Success => {
                            match view.value {
                                Some(value) => Ok(value),
                                None => Err(Arc::new(ApiError::InvalidResponse(
                                    "request coalescing interrupted".to_string(),
                                ))),
                            }
                        }
                        Some(view) if view.status == FetchStatus::Error => {
                            Err(view.error.unwrap_or_else(|| {
                                Arc::new(ApiError::InvalidResponse(
                                    "request coalescing interrupted".to_string(),
                                ))
                            }))
                        }
                        _ => Err(Arc::new(ApiError::InvalidResponse(
                            "request coalescing interrupted".to_string(),
                        ))),
                    }
                }
            },
            BeginFetch::Lead(lease) => {
                let outcome = self.fetcher.fetch(key).await.map_err(Arc::new);
                self.store.settle_fetch(key, lease, outcome)
            }
        }
    }
}
