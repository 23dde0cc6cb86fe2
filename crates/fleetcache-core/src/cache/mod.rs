//! Client-side resource cache.
//!
//! One store instance per session holds every fetched resource, keyed by
//! normalized query. Reads are deduplicated against in-flight requests,
//! writes invalidate by tag and trigger refetches of subscribed queries,
//! and results apply last-writer-by-sequence so a slow response can never
//! clobber a newer one.
//!
//! [`FleetCache`] is the entry point; the submodules carry the pieces:
//!
//! - `store`: ground-truth entry map, tag index, and in-flight table
//! - `scheduler`: request deduplication over a [`ResourceFetcher`]
//! - `mutation`: write coordination and tag invalidation
//! - `overlay`: optimistic profile-image preview, kept out of the store

pub mod entry;
pub mod key;
pub mod mutation;
pub mod overlay;
pub mod scheduler;
pub mod store;
mod tags;

pub use entry::{CacheEntry, EntryView, FetchOutcome, FetchStatus, ResourceValue};
pub use key::{QueryKey, Tag};
pub use mutation::{MutationCoordinator, MutationDescriptor};
pub use overlay::ImageOverlay;
pub use scheduler::{FetchScheduler, ResourceFetcher};
pub use store::{BeginFetch, FetchLease, ResourceStore};

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::analytics::{self, SnapshotState};
use crate::api::ApiError;
use crate::models::{Booking, Payment, Ticket, User, Vehicle};

/// Session-scoped cache facade: typed reads, coordinated writes, and the
/// analytics snapshot, all over one shared store.
pub struct FleetCache<F> {
    store: Arc<ResourceStore>,
    scheduler: Arc<FetchScheduler<F>>,
    coordinator: MutationCoordinator<F>,
}

impl<F: ResourceFetcher + 'static> FleetCache<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        let store = Arc::new(ResourceStore::new());
        let scheduler = Arc::new(FetchScheduler::new(Arc::clone(&store), fetcher));
        let coordinator = MutationCoordinator::new(Arc::clone(&scheduler));
        Self {
            store,
            scheduler,
            coordinator,
        }
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    /// Resolve a query through the deduplicating scheduler.
    pub async fn query(&self, key: &QueryKey) -> FetchOutcome {
        self.scheduler.execute(key).await
    }

    /// Register interest in a key and receive its status changes.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<FetchStatus> {
        self.store.subscribe(key)
    }

    pub fn unsubscribe(&self, key: &QueryKey) {
        self.store.unsubscribe(key)
    }

    /// Run a mutation; on success its tags are invalidated and subscribed
    /// queries refetched before this returns.
    pub async fn mutate<T, Fut>(
        &self,
        descriptor: MutationDescriptor,
        op: Fut,
    ) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.coordinator.perform(descriptor, op).await
    }

    /// Aggregate metrics over the dashboard's source queries, computed from
    /// one consistent read of the store.
    pub fn analytics_snapshot(&self) -> SnapshotState {
        analytics::compute_snapshot(&self.store)
    }

    pub async fn all_bookings(&self) -> Result<Vec<Booking>, Arc<ApiError>> {
        match self.query(&QueryKey::AllBookings).await? {
            ResourceValue::Bookings(bookings) => Ok(bookings),
            _ => Err(unexpected_payload("bookings list")),
        }
    }

    pub async fn booking(&self, id: i64) -> Result<Booking, Arc<ApiError>> {
        match self.query(&QueryKey::BookingById(id)).await? {
            ResourceValue::Booking(booking) => Ok(booking),
            _ => Err(unexpected_payload("booking")),
        }
    }

    pub async fn bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, Arc<ApiError>> {
        match self.query(&QueryKey::BookingsForUser(user_id)).await? {
            ResourceValue::Bookings(bookings) => Ok(bookings),
            _ => Err(unexpected_payload("user bookings list")),
        }
    }

    pub async fn all_payments(&self) -> Result<Vec<Payment>, Arc<ApiError>> {
        match self.query(&QueryKey::AllPayments).await? {
            ResourceValue::Payments(payments) => Ok(payments),
            _ => Err(unexpected_payload("payments list")),
        }
    }

    pub async fn payment(&self, id: i64) -> Result<Payment, Arc<ApiError>> {
        match self.query(&QueryKey::PaymentById(id)).await? {
            ResourceValue::Payment(payment) => Ok(payment),
            _ => Err(unexpected_payload("payment")),
        }
    }

    pub async fn all_tickets(&self) -> Result<Vec<Ticket>, Arc<ApiError>> {
        match self.query(&QueryKey::AllTickets).await? {
            ResourceValue::Tickets(tickets) => Ok(tickets),
            _ => Err(unexpected_payload("tickets list")),
        }
    }

    pub async fn ticket(&self, id: i64) -> Result<Ticket, Arc<ApiError>> {
        match self.query(&QueryKey::TicketById(id)).await? {
            ResourceValue::Ticket(ticket) => Ok(ticket),
            _ => Err(unexpected_payload("ticket")),
        }
    }

    pub async fn all_users(&self) -> Result<Vec<User>, Arc<ApiError>> {
        match self.query(&QueryKey::AllUsers).await? {
            ResourceValue::Users(users) => Ok(users),
            _ => Err(unexpected_payload("users list")),
        }
    }

    pub async fn user(&self, id: i64) -> Result<User, Arc<ApiError>> {
        match self.query(&QueryKey::UserById(id)).await? {
            ResourceValue::User(user) => Ok(user),
            _ => Err(unexpected_payload("user")),
        }
    }

    pub async fn all_vehicles(&self) -> Result<Vec<Vehicle>, Arc<ApiError>> {
        match self.query(&QueryKey::AllVehicles).await? {
            ResourceValue::Vehicles(vehicles) => Ok(vehicles),
            _ => Err(unexpected_payload("vehicles list")),
        }
    }

    pub async fn vehicle(&self, id: i64) -> Result<Vehicle, Arc<ApiError>> {
        match self.query(&QueryKey::VehicleById(id)).await? {
            ResourceValue::Vehicle(vehicle) => Ok(vehicle),
            _ => Err(unexpected_payload("vehicle")),
        }
    }
}

fn unexpected_payload(what: &str) -> Arc<ApiError> {
    Arc::new(ApiError::InvalidResponse(format!(
        "unexpected payload for {}",
        what
    )))
}
