//! Mutation coordination.
//!
//! Every write goes through [`MutationCoordinator::perform`] with a
//! [`MutationDescriptor`] naming the tags it invalidates. The descriptor is
//! plain data derived from the mutation's arguments, so the invalidation set
//! is known before the request is sent and identical on every run. On
//! success the coordinator marks tagged entries stale and refetches the ones
//! that still have subscribers; on failure the cache is left untouched.

use std::future::Future;
use std::sync::Arc;

use futures::{stream, StreamExt};
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::cache::key::Tag;
use crate::cache::scheduler::{FetchScheduler, ResourceFetcher};

/// Upper bound on refetches issued at once after a mutation. A broad tag can
/// touch several subscribed queries; don't stampede the backend.
const MAX_CONCURRENT_REFETCH: usize = 4;

/// What a mutation invalidates, fixed at call time from its arguments.
#[derive(Debug, Clone)]
pub struct MutationDescriptor {
    invalidates: Vec<Tag>,
}

impl MutationDescriptor {
    pub fn new(invalidates: Vec<Tag>) -> Self {
        Self { invalidates }
    }

    pub fn invalidates(&self) -> &[Tag] {
        &self.invalidates
    }

    // Creating or deleting a booking reshapes every list; updating one also
    // touches its detail entry.
    pub fn create_booking() -> Self {
        Self::new(vec![Tag::Bookings])
    }

    pub fn update_booking(id: i64) -> Self {
        Self::new(vec![Tag::Bookings, Tag::Booking(id)])
    }

    pub fn delete_booking() -> Self {
        Self::new(vec![Tag::Bookings])
    }

    pub fn create_payment() -> Self {
        Self::new(vec![Tag::Payments])
    }

    // Payment row updates rely on the list declaring per-row tags, so the
    // id tag alone reaches both the detail entry and the list.
    pub fn update_payment(id: i64) -> Self {
        Self::new(vec![Tag::Payment(id)])
    }

    pub fn delete_payment(id: i64) -> Self {
        Self::new(vec![Tag::Payment(id)])
    }

    pub fn update_user_profile(id: i64) -> Self {
        Self::new(vec![Tag::Users, Tag::User(id)])
    }

    pub fn update_profile_image(id: i64) -> Self {
        Self::new(vec![Tag::Users, Tag::User(id)])
    }

    pub fn delete_user(id: i64) -> Self {
        Self::new(vec![Tag::Users, Tag::User(id)])
    }

    pub fn create_vehicle() -> Self {
        Self::new(vec![Tag::Vehicles])
    }

    pub fn update_vehicle(id: i64) -> Self {
        Self::new(vec![Tag::Vehicles, Tag::Vehicle(id)])
    }

    pub fn delete_vehicle(id: i64) -> Self {
        Self::new(vec![Tag::Vehicles, Tag::Vehicle(id)])
    }

    pub fn create_ticket() -> Self {
        Self::new(vec![Tag::Tickets])
    }

    pub fn update_ticket(id: i64) -> Self {
        Self::new(vec![Tag::Tickets, Tag::Ticket(id)])
    }

    pub fn delete_ticket() -> Self {
        Self::new(vec![Tag::Tickets])
    }
}

pub struct MutationCoordinator<F> {
    scheduler: Arc<FetchScheduler<F>>,
}

impl<F: ResourceFetcher + 'static> MutationCoordinator<F> {
    pub fn new(scheduler: Arc<FetchScheduler<F>>) -> Self {
        Self { scheduler }
    }

    /// Run a mutation and, if it succeeds, invalidate its tags and refetch
    /// the affected queries that still have subscribers. A failed mutation
    /// leaves every cache entry exactly as it was.
    pub async fn perform<T, Fut>(
        &self,
        descriptor: MutationDescriptor,
        op: Fut,
    ) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = op.await?;

        let to_refetch = self.scheduler.store().invalidate(descriptor.invalidates());
        debug!(
            tags = descriptor.invalidates().len(),
            refetching = to_refetch.len(),
            "mutation confirmed, invalidating"
        );

        let mut refetches = stream::iter(to_refetch)
            .map(|key| {
                let scheduler = Arc::clone(&self.scheduler);
                async move {
                    let outcome = scheduler.execute(&key).await;
                    (key, outcome)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_REFETCH);

        while let Some((key, outcome)) = refetches.next().await {
            if let Err(error) = outcome {
                // The entry stays in its error state; the next query retries.
                warn!(key = %key, %error, "refetch after mutation failed");
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::{FetchStatus, ResourceValue};
    use crate::cache::key::QueryKey;
    use crate::cache::store::ResourceStore;
    use crate::models::{Booking, BookingStatus, Payment, PaymentStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn booking(id: i64, status: BookingStatus) -> Booking {
        Booking {
            booking_id: id,
            user_id: 4,
            vehicle_id: 3,
            location_id: Some(1),
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

    fn payment(id: i64) -> Payment {
        Payment {
            payment_id: id,
            booking_id: 1,
            amount: Some(10.0),
            payment_date: None,
            payment_method: None,
            transaction_id: None,
            payment_status: PaymentStatus::Completed,
            user: None,
        }
    }

    struct CannedFetcher {
        calls: AtomicUsize,
    }

    impl CannedFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ResourceFetcher for CannedFetcher {
        fn fetch(
            &self,
            key: &QueryKey,
        ) -> impl Future<Output = Result<ResourceValue, ApiError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // The refetch after the mutation observes the confirmed state.
            let nth = self.calls.load(Ordering::SeqCst);
            let value = match key {
                QueryKey::AllBookings => {
                    let status = if nth > 1 {
                        BookingStatus::Confirmed
                    } else {
                        BookingStatus::Pending
                    };
                    ResourceValue::Bookings(vec![booking(1, status)])
                }
                QueryKey::BookingById(id) => {
                    ResourceValue::Booking(booking(*id, BookingStatus::Confirmed))
                }
                QueryKey::AllPayments => ResourceValue::Payments(vec![payment(8)]),
                _ => ResourceValue::Bookings(vec![]),
            };
            async move { Ok(value) }
        }
    }

    struct Harness {
        scheduler: Arc<FetchScheduler<CannedFetcher>>,
        coordinator: MutationCoordinator<CannedFetcher>,
    }

    fn harness() -> Harness {
        let store = Arc::new(ResourceStore::new());
        let scheduler = Arc::new(FetchScheduler::new(store, Arc::new(CannedFetcher::new())));
        let coordinator = MutationCoordinator::new(Arc::clone(&scheduler));
        Harness {
            scheduler,
            coordinator,
        }
    }

    #[tokio::test]
    async fn test_confirmed_update_invalidates_and_refetches() {
        let h = harness();
        let store = Arc::clone(h.scheduler.store());
        let list = QueryKey::AllBookings;
        let detail = QueryKey::BookingById(1);
        let payments = QueryKey::AllPayments;

        store.subscribe(&list);
        h.scheduler.execute(&list).await.unwrap();
        h.scheduler.execute(&detail).await.unwrap();
        h.scheduler.execute(&payments).await.unwrap();
        let calls_before = h.scheduler.fetcher().calls();

        h.coordinator
            .perform(MutationDescriptor::update_booking(1), async { Ok(()) })
            .await
            .unwrap();

        // The subscribed list was refetched and now carries the new state.
        let view = store.get(&list).unwrap();
        assert_eq!(view.status, FetchStatus::Success);
        assert_eq!(
            view.value.unwrap().as_bookings().unwrap()[0].booking_status,
            BookingStatus::Confirmed
        );
        // The unsubscribed detail entry was only marked stale.
        assert_eq!(store.get(&detail).unwrap().status, FetchStatus::Stale);
        // Payments were not touched at all.
        assert_eq!(store.get(&payments).unwrap().status, FetchStatus::Success);
        assert_eq!(h.scheduler.fetcher().calls(), calls_before + 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_untouched() {
        let h = harness();
        let store = Arc::clone(h.scheduler.store());
        let list = QueryKey::AllBookings;
        store.subscribe(&list);
        h.scheduler.execute(&list).await.unwrap();
        let calls_before = h.scheduler.fetcher().calls();

        let result: Result<(), ApiError> = h
            .coordinator
            .perform(MutationDescriptor::update_booking(1), async {
                Err(ApiError::Validation("return date before pickup".to_string()))
            })
            .await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(store.get(&list).unwrap().status, FetchStatus::Success);
        assert_eq!(h.scheduler.fetcher().calls(), calls_before);
    }

    #[tokio::test]
    async fn test_payment_update_reaches_list_through_row_tag() {
        let h = harness();
        let store = Arc::clone(h.scheduler.store());
        let payments = QueryKey::AllPayments;
        store.subscribe(&payments);
        h.scheduler.execute(&payments).await.unwrap();

        h.coordinator
            .perform(MutationDescriptor::update_payment(8), async { Ok(()) })
            .await
            .unwrap();

        // The list declared Payment:8 as one of its rows, so the id tag
        // alone was enough to refresh it.
        assert_eq!(store.get(&payments).unwrap().status, FetchStatus::Success);
        assert_eq!(h.scheduler.fetcher().calls(), 2);
    }

    #[test]
    fn test_delete_descriptors_match_their_tag_scope() {
        // Deleting a booking or ticket only reshapes the list; the other
        // deletes also name the record's own tag.
        assert_eq!(
            MutationDescriptor::delete_booking().invalidates().to_vec(),
            vec![Tag::Bookings]
        );
        assert_eq!(
            MutationDescriptor::delete_ticket().invalidates().to_vec(),
            vec![Tag::Tickets]
        );
        assert_eq!(
            MutationDescriptor::delete_vehicle(3).invalidates().to_vec(),
            vec![Tag::Vehicles, Tag::Vehicle(3)]
        );
    }

    #[tokio::test]
    async fn test_mutation_with_no_matching_entries_is_noop() {
        let h = harness();

        h.coordinator
            .perform(MutationDescriptor::create_vehicle(), async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(h.scheduler.fetcher().calls(), 0);
        assert!(h.scheduler.store().is_empty());
    }
}
