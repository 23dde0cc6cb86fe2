//! Data models for the rental API.
//!
//! This module contains all the data structures used to represent
//! rental platform records:
//!
//! - `Booking`: reservations with nested user/vehicle/location details
//! - `Payment`: payment records tied to bookings
//! - `Ticket`: support tickets
//! - `User`: member and administrator profiles
//! - `Vehicle`, `VehicleSpec`: the rentable fleet
//!
//! Each record type comes with create/update payload structs whose
//! serialization omits unset fields.

pub mod booking;
pub mod payment;
pub mod ticket;
pub mod user;
pub mod vehicle;

pub use booking::{
    Booking, BookingLocation, BookingStatus, BookingUser, BookingVehicle, NewBooking,
    UpdateBooking,
};
pub use payment::{NewPayment, Payment, PaymentStatus, PaymentUser, UpdatePayment};
pub use ticket::{NewTicket, Ticket, TicketStatus, UpdateTicket};
pub use user::{ProfileImagePayload, UpdateUserProfile, User, UserRole};
pub use vehicle::{FuelType, NewVehicle, Transmission, UpdateVehicle, Vehicle, VehicleSpec};

use serde::{Deserialize, Deserializer};

/// Deserialize a numeric field the backend may serialize as either a JSON
/// number or a decimal string. Values that parse to nothing become `None`.
pub(crate) fn de_flexible_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
