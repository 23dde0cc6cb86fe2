//! Cache entry state.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::ApiError;
use crate::cache::key::Tag;
use crate::models::{Booking, Payment, Ticket, User, Vehicle};

/// Fetch lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Created by a subscriber, no fetch issued yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Holds the result of the most recent successful fetch.
    Success,
    /// The most recent fetch failed; `error` carries the cause.
    Error,
    /// Invalidated by a mutation; the held value may be outdated.
    Stale,
}

/// A fetched payload, typed per resource.
#[derive(Debug, Clone)]
pub enum ResourceValue {
    Bookings(Vec<Booking>),
    Booking(Booking),
    Payments(Vec<Payment>),
    Payment(Payment),
    Tickets(Vec<Ticket>),
    Ticket(Ticket),
    Users(Vec<User>),
    User(User),
    Vehicles(Vec<Vehicle>),
    Vehicle(Vehicle),
}

impl ResourceValue {
    pub fn as_bookings(&self) -> Option<&[Booking]> {
        match self {
            ResourceValue::Bookings(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_payments(&self) -> Option<&[Payment]> {
        match self {
            ResourceValue::Payments(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_tickets(&self) -> Option<&[Ticket]> {
        match self {
            ResourceValue::Tickets(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_users(&self) -> Option<&[User]> {
        match self {
            ResourceValue::Users(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_vehicles(&self) -> Option<&[Vehicle]> {
        match self {
            ResourceValue::Vehicles(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            ResourceValue::User(u) => Some(u),
            _ => None,
        }
    }
}

/// Settled result of one fetch, shared with every attached caller.
pub type FetchOutcome = Result<ResourceValue, Arc<ApiError>>;

/// One slot in the resource store.
///
/// `tags` always reflects the tag list of the query that most recently
/// succeeded for this key; failed or stale fetches leave it untouched.
#[derive(Debug)]
pub struct CacheEntry {
    pub status: FetchStatus,
    pub value: Option<ResourceValue>,
    pub error: Option<Arc<ApiError>>,
    pub tags: HashSet<Tag>,
    pub subscriber_count: usize,
    /// Sequence number of the last applied fetch result.
    pub applied_seq: u64,
    pub(crate) status_tx: watch::Sender<FetchStatus>,
}

impl CacheEntry {
    pub(crate) fn new() -> Self {
        let (status_tx, _) = watch::channel(FetchStatus::Idle);
        Self {
            status: FetchStatus::Idle,
            value: None,
            error: None,
            tags: HashSet::new(),
            subscriber_count: 0,
            applied_seq: 0,
            status_tx,
        }
    }

    pub(crate) fn set_status(&mut self, status: FetchStatus) {
        self.status = status;
        // Subscribers may come and go; a send with no receivers is fine.
        let _ = self.status_tx.send(status);
    }
}

/// Read-only view of an entry, handed out to consumers.
#[derive(Debug, Clone)]
pub struct EntryView {
    pub status: FetchStatus,
    pub value: Option<ResourceValue>,
    pub error: Option<Arc<ApiError>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_idle_and_empty() {
        let entry = CacheEntry::new();
        assert_eq!(entry.status, FetchStatus::Idle);
        assert!(entry.value.is_none());
        assert!(entry.error.is_none());
        assert!(entry.tags.is_empty());
        assert_eq!(entry.subscriber_count, 0);
    }

    #[test]
    fn test_set_status_notifies_watchers() {
        let mut entry = CacheEntry::new();
        let mut rx = entry.status_tx.subscribe();
        entry.set_status(FetchStatus::Loading);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), FetchStatus::Loading);
    }

    #[test]
    fn test_resource_value_accessors() {
        let value = ResourceValue::Bookings(vec![]);
        assert!(value.as_bookings().is_some());
        assert!(value.as_payments().is_none());
    }
}
