//! Core library for fleetcache.
//!
//! A session-scoped caching layer for the vehicle rental platform's REST
//! backend: typed models, an authenticated API client, a tag-invalidated
//! resource cache with request deduplication, and the aggregate metrics the
//! admin dashboard is built on.
//!
//! Typical usage constructs one [`cache::FleetCache`] over an
//! [`api::ApiClient`] at session start:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fleetcache_core::api::ApiClient;
//! use fleetcache_core::cache::FleetCache;
//! use fleetcache_core::config::ApiConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ApiConfig::from_env()?;
//! let client = ApiClient::new(&config)?.with_token("...".to_string());
//! let cache = FleetCache::new(Arc::new(client));
//!
//! let bookings = cache.all_bookings().await?;
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod models;

pub use analytics::{AggregateSnapshot, SnapshotState};
pub use api::{ApiClient, ApiError};
pub use cache::{FleetCache, MutationDescriptor, QueryKey, Tag};
pub use config::ApiConfig;
