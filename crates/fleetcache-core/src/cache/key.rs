//! Cache key and tag definitions.
//!
//! A `QueryKey` identifies one distinct query against the backend; the same
//! arguments always produce the same key. A `Tag` is the invalidation label
//! attached to cached results, looked up by mutations through the tag index.

use crate::cache::entry::ResourceValue;

/// Normalized identifier for a query: resource type plus its argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    AllBookings,
    BookingById(i64),
    BookingsForUser(i64),
    AllPayments,
    PaymentById(i64),
    AllTickets,
    TicketById(i64),
    AllUsers,
    UserById(i64),
    AllVehicles,
    VehicleById(i64),
}

impl QueryKey {
    /// The request path for this query, relative to the API base.
    pub fn path(&self) -> String {
        match self {
            QueryKey::AllBookings => "bookings".to_string(),
            QueryKey::BookingById(id) => format!("bookings/{}", id),
            QueryKey::BookingsForUser(user_id) => format!("bookings/user?userId={}", user_id),
            QueryKey::AllPayments => "payments".to_string(),
            QueryKey::PaymentById(id) => format!("payments/{}", id),
            QueryKey::AllTickets => "tickets".to_string(),
            QueryKey::TicketById(id) => format!("tickets/{}", id),
            QueryKey::AllUsers => "users".to_string(),
            QueryKey::UserById(id) => format!("users/{}", id),
            QueryKey::AllVehicles => "vehicles".to_string(),
            QueryKey::VehicleById(id) => format!("vehicles/{}", id),
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Invalidation label. List tags cover collection queries; id tags cover
/// per-record queries (and list rows that declare them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Bookings,
    Booking(i64),
    Payments,
    Payment(i64),
    Tickets,
    Ticket(i64),
    Users,
    User(i64),
    Vehicles,
    Vehicle(i64),
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Bookings => write!(f, "Bookings"),
            Tag::Booking(id) => write!(f, "Booking:{}", id),
            Tag::Payments => write!(f, "Payments"),
            Tag::Payment(id) => write!(f, "Payment:{}", id),
            Tag::Tickets => write!(f, "Tickets"),
            Tag::Ticket(id) => write!(f, "Ticket:{}", id),
            Tag::Users => write!(f, "Users"),
            Tag::User(id) => write!(f, "User:{}", id),
            Tag::Vehicles => write!(f, "Vehicles"),
            Tag::Vehicle(id) => write!(f, "Vehicle:{}", id),
        }
    }
}

impl QueryKey {
    /// Tags a successful result of this query provides, derived from the key
    /// and the fetched value. The payments list additionally declares one
    /// id tag per row, so a single-payment update invalidates the list too.
    pub fn provides_tags(&self, value: &ResourceValue) -> Vec<Tag> {
        match self {
            QueryKey::AllBookings | QueryKey::BookingsForUser(_) => vec![Tag::Bookings],
            QueryKey::BookingById(id) => vec![Tag::Booking(*id)],
            QueryKey::AllPayments => {
                let mut tags = vec![Tag::Payments];
                if let ResourceValue::Payments(payments) = value {
                    tags.extend(payments.iter().map(|p| Tag::Payment(p.payment_id)));
                }
                tags
            }
            QueryKey::PaymentById(id) => vec![Tag::Payment(*id)],
            QueryKey::AllTickets => vec![Tag::Tickets],
            QueryKey::TicketById(id) => vec![Tag::Ticket(*id)],
            QueryKey::AllUsers => vec![Tag::Users],
            QueryKey::UserById(id) => vec![Tag::User(*id)],
            QueryKey::AllVehicles => vec![Tag::Vehicles],
            QueryKey::VehicleById(id) => vec![Tag::Vehicle(*id)],
        }
    }
}
