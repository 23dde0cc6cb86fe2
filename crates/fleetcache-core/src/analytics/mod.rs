//! Aggregate dashboard metrics.
//!
//! The admin dashboard shows cross-cutting numbers (bookings by status,
//! revenue, ticket backlog, member roles, fleet availability) derived from
//! five independently cached collections. The snapshot is pure: it is
//! recomputed from current store values on every read and withheld until
//! every source has settled.

pub mod snapshot;

pub use snapshot::{
    compute_snapshot, AggregateSnapshot, BookingStats, PaymentStats, SnapshotState, TicketStats,
    UserStats, VehicleStats, ANALYTICS_SOURCES,
};
