//! Dashboard metrics derived from the cached collections.

use std::sync::Arc;

use tracing::debug;

use crate::api::ApiError;
use crate::cache::entry::{FetchStatus, ResourceValue};
use crate::cache::key::QueryKey;
use crate::cache::store::ResourceStore;
use crate::models::{Booking, BookingStatus, Payment, Ticket, User, UserRole, Vehicle};

/// The collections the dashboard aggregates over, in evaluation order.
pub const ANALYTICS_SOURCES: [QueryKey; 5] = [
    QueryKey::AllBookings,
    QueryKey::AllPayments,
    QueryKey::AllTickets,
    QueryKey::AllUsers,
    QueryKey::AllVehicles,
];

/// Result of a snapshot computation.
#[derive(Debug, Clone)]
pub enum SnapshotState {
    /// At least one source collection has not loaded yet.
    Pending,
    /// A source collection is in an error state; carries the first one found.
    Failed(Arc<ApiError>),
    Ready(AggregateSnapshot),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookingStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaymentStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    /// Sum of payment amounts. Unparseable or non-finite amounts count as
    /// zero rather than poisoning the total.
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TicketStats {
    pub total: usize,
    pub unresolved: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserStats {
    pub total: usize,
    pub admins: usize,
    pub members: usize,
    pub disabled: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleStats {
    pub total: usize,
    pub available: usize,
    /// available / total; 0.0 for an empty fleet rather than NaN.
    pub availability_ratio: f64,
}

/// Cross-collection metrics, recomputed from current entry values on every
/// read. The snapshot has no identity of its own and is never cached;
/// callers needing stability across a frame memoize externally.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateSnapshot {
    pub bookings: BookingStats,
    pub payments: PaymentStats,
    pub tickets: TicketStats,
    pub users: UserStats,
    pub vehicles: VehicleStats,
}

impl AggregateSnapshot {
    /// Pure computation over already-fetched collections.
    pub fn compute(
        bookings: &[Booking],
        payments: &[Payment],
        tickets: &[Ticket],
        users: &[User],
        vehicles: &[Vehicle],
    ) -> Self {
        let mut booking_stats = BookingStats {
            total: bookings.len(),
            ..Default::default()
        };
        for booking in bookings {
            match booking.booking_status {
                BookingStatus::Pending => booking_stats.pending += 1,
                BookingStatus::Confirmed => booking_stats.confirmed += 1,
                BookingStatus::Completed => booking_stats.completed += 1,
                BookingStatus::Cancelled => booking_stats.cancelled += 1,
            }
        }

        let payment_stats = PaymentStats {
            total: payments.len(),
            pending: payments
                .iter()
                .filter(|p| p.payment_status == crate::models::PaymentStatus::Pending)
                .count(),
            completed: payments
                .iter()
                .filter(|p| p.payment_status == crate::models::PaymentStatus::Completed)
                .count(),
            total_revenue: payments.iter().map(Payment::amount_or_zero).sum(),
        };

        let ticket_stats = TicketStats {
            total: tickets.len(),
            unresolved: tickets.iter().filter(|t| t.status.is_unresolved()).count(),
            closed: tickets
                .iter()
                .filter(|t| !t.status.is_unresolved())
                .count(),
        };

        let mut user_stats = UserStats {
            total: users.len(),
            ..Default::default()
        };
        for user in users {
            match user.role {
                UserRole::Admin => user_stats.admins += 1,
                UserRole::User => user_stats.members += 1,
                UserRole::Disabled => user_stats.disabled += 1,
            }
        }

        let available = vehicles.iter().filter(|v| v.availability).count();
        let vehicle_stats = VehicleStats {
            total: vehicles.len(),
            available,
            availability_ratio: if vehicles.is_empty() {
                0.0
            } else {
                available as f64 / vehicles.len() as f64
            },
        };

        Self {
            bookings: booking_stats,
            payments: payment_stats,
            tickets: ticket_stats,
            users: user_stats,
            vehicles: vehicle_stats,
        }
    }
}

/// Compute the dashboard snapshot from one consistent read of the store.
///
/// Sources are checked in [`ANALYTICS_SOURCES`] order: an absent, idle, or
/// loading source yields `Pending`; an errored source yields `Failed` with
/// its error. A stale source still contributes its last value, so the
/// dashboard keeps showing numbers while a refetch is in flight.
pub fn compute_snapshot(store: &ResourceStore) -> SnapshotState {
    let views = store.get_many(&ANALYTICS_SOURCES);

    let mut values = Vec::with_capacity(views.len());
    for (key, view) in ANALYTICS_SOURCES.iter().zip(views) {
        let Some(view) = view else {
            debug!(key = %key, "snapshot pending, source not queried yet");
            return SnapshotState::Pending;
        };
        match view.status {
            FetchStatus::Idle | FetchStatus::Loading => {
                debug!(key = %key, "snapshot pending, source loading");
                return SnapshotState::Pending;
            }
            FetchStatus::Error => {
                let error = view.error.clone().unwrap_or_else(|| {
                    Arc::new(ApiError::InvalidResponse(format!(
                        "source {} errored without detail",
                        key
                    )))
                });
                return SnapshotState::Failed(error);
            }
            FetchStatus::Success | FetchStatus::Stale => match view.value {
                Some(value) => values.push(value),
                None => return SnapshotState::Pending,
            },
        }
    }

    let [bookings, payments, tickets, users, vehicles]: [ResourceValue; 5] =
        match values.try_into() {
            Ok(values) => values,
            Err(_) => return SnapshotState::Pending,
        };

    match (
        bookings.as_bookings(),
        payments.as_payments(),
        tickets.as_tickets(),
        users.as_users(),
        vehicles.as_vehicles(),
    ) {
        (Some(bookings), Some(payments), Some(tickets), Some(users), Some(vehicles)) => {
            SnapshotState::Ready(AggregateSnapshot::compute(
                bookings, payments, tickets, users, vehicles,
            ))
        }
        // A source holding the wrong payload shape means the store was
        // populated outside the typed fetch path.
        _ => SnapshotState::Failed(Arc::new(ApiError::InvalidResponse(
            "snapshot source holds unexpected payload".to_string(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{BeginFetch, FetchLease};
    use crate::models::{PaymentStatus, TicketStatus};

    fn booking(id: i64, status: BookingStatus) -> Booking {
        Booking {
            booking_id: id,
            user_id: 4,
            vehicle_id: 3,
            location_id: None,
            booking_date: None,
            return_date: None,
            total_amount: Some("100.00".to_string()),
            booking_status: status,
            created_at: None,
            updated_at: None,
            user: None,
            vehicle: None,
            location: None,
        }
    }

    fn payment(id: i64, amount: Option<f64>, status: PaymentStatus) -> Payment {
        Payment {
            payment_id: id,
            booking_id: 1,
            amount,
            payment_date: None,
            payment_method: None,
            transaction_id: None,
            payment_status: status,
            user: None,
        }
    }

    fn ticket(id: i64, status: TicketStatus) -> Ticket {
        Ticket {
            ticket_id: id,
            user_id: 4,
            subject: "Late return fee".to_string(),
            description: None,
            status,
            created_at: None,
        }
    }

    fn user(id: i64, role: UserRole) -> User {
        User {
            user_id: id,
            first_name: "Avery".to_string(),
            last_name: "Mwangi".to_string(),
            email: None,
            contact_no: None,
            address: None,
            profile_url: None,
            role,
        }
    }

    fn vehicle(id: i64, available: bool) -> Vehicle {
        Vehicle {
            vehicle_id: id,
            rental_rate: Some(45.0),
            availability: available,
            image_url: None,
            description: None,
            color: None,
            vehicle_spec: None,
        }
    }

    fn lead(store: &ResourceStore, key: &QueryKey) -> FetchLease {
        match store.begin_fetch(key) {
            BeginFetch::Lead(lease) => lease,
            _ => panic!("expected to lead fetch for {}", key),
        }
    }

    fn settle(store: &ResourceStore, key: &QueryKey, value: ResourceValue) {
        let lease = lead(store, key);
        store
            .settle_fetch(key, lease, Ok(value))
            .expect("settle should succeed");
    }

    fn populated_store() -> ResourceStore {
        let store = ResourceStore::new();
        settle(
            &store,
            &QueryKey::AllBookings,
            ResourceValue::Bookings(vec![
                booking(1, BookingStatus::Pending),
                booking(2, BookingStatus::Confirmed),
                booking(3, BookingStatus::Confirmed),
            ]),
        );
        settle(
            &store,
            &QueryKey::AllPayments,
            ResourceValue::Payments(vec![
                payment(1, Some(250.0), PaymentStatus::Completed),
                payment(2, Some(68.5), PaymentStatus::Pending),
            ]),
        );
        settle(
            &store,
            &QueryKey::AllTickets,
            ResourceValue::Tickets(vec![
                ticket(1, TicketStatus::Open),
                ticket(2, TicketStatus::Closed),
            ]),
        );
        settle(
            &store,
            &QueryKey::AllUsers,
            ResourceValue::Users(vec![user(1, UserRole::Admin), user(2, UserRole::User)]),
        );
        settle(
            &store,
            &QueryKey::AllVehicles,
            ResourceValue::Vehicles(vec![vehicle(1, true), vehicle(2, false)]),
        );
        store
    }

    #[test]
    fn test_ready_snapshot_counts_everything() {
        let store = populated_store();
        let SnapshotState::Ready(snapshot) = compute_snapshot(&store) else {
            panic!("expected a ready snapshot");
        };
        assert_eq!(snapshot.bookings.total, 3);
        assert_eq!(snapshot.bookings.confirmed, 2);
        assert_eq!(snapshot.payments.total_revenue, 318.5);
        assert_eq!(snapshot.payments.pending, 1);
        assert_eq!(snapshot.payments.completed, 1);
        assert_eq!(snapshot.tickets.unresolved, 1);
        assert_eq!(snapshot.users.admins, 1);
        assert_eq!(snapshot.vehicles.availability_ratio, 0.5);
    }

    #[test]
    fn test_pending_while_any_source_is_loading() {
        let store = populated_store();
        // Vehicles goes back into flight.
        store.invalidate(&[crate::cache::key::Tag::Vehicles]);
        let _lease = lead(&store, &QueryKey::AllVehicles);
        assert!(matches!(compute_snapshot(&store), SnapshotState::Pending));
    }

    #[test]
    fn test_pending_when_a_source_was_never_queried() {
        let store = ResourceStore::new();
        settle(
            &store,
            &QueryKey::AllBookings,
            ResourceValue::Bookings(vec![]),
        );
        assert!(matches!(compute_snapshot(&store), SnapshotState::Pending));
    }

    #[test]
    fn test_failed_when_a_source_errored() {
        let store = populated_store();
        store.invalidate(&[crate::cache::key::Tag::Payments]);
        let lease = lead(&store, &QueryKey::AllPayments);
        let _ = store.settle_fetch(
            &QueryKey::AllPayments,
            lease,
            Err(Arc::new(ApiError::ServerError("boom".to_string()))),
        );

        let SnapshotState::Failed(error) = compute_snapshot(&store) else {
            panic!("expected a failed snapshot");
        };
        assert!(matches!(*error, ApiError::ServerError(_)));
    }

    #[test]
    fn test_stale_source_still_contributes() {
        let store = populated_store();
        store.invalidate(&[crate::cache::key::Tag::Bookings]);
        let SnapshotState::Ready(snapshot) = compute_snapshot(&store) else {
            panic!("expected a ready snapshot over stale data");
        };
        assert_eq!(snapshot.bookings.total, 3);
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let store = populated_store();
        let first = compute_snapshot(&store);
        let second = compute_snapshot(&store);
        match (first, second) {
            (SnapshotState::Ready(a), SnapshotState::Ready(b)) => assert_eq!(a, b),
            _ => panic!("expected two ready snapshots"),
        }
    }

    #[test]
    fn test_empty_fleet_has_zero_ratio() {
        let snapshot = AggregateSnapshot::compute(&[], &[], &[], &[], &[]);
        assert_eq!(snapshot.vehicles.availability_ratio, 0.0);
        assert!(snapshot.vehicles.availability_ratio.is_finite());
    }

    #[test]
    fn test_bad_amounts_count_as_zero_in_revenue() {
        let payments = vec![
            payment(1, Some(100.0), PaymentStatus::Completed),
            payment(2, None, PaymentStatus::Completed),
            payment(3, Some(f64::NAN), PaymentStatus::Completed),
        ];
        let snapshot = AggregateSnapshot::compute(&[], &payments, &[], &[], &[]);
        assert_eq!(snapshot.payments.total_revenue, 100.0);
    }
}
