use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::vehicle::VehicleSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "Pending"),
            BookingStatus::Confirmed => write!(f, "Confirmed"),
            BookingStatus::Completed => write!(f, "Completed"),
            BookingStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Nested user details carried on a booking for display purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingUser {
    #[serde(rename = "firstName")]
    pub first_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingVehicle {
    #[serde(rename = "vehicleId")]
    pub vehicle_id: i64,
    // Numeric from the DB, often serialized as a string
    #[serde(rename = "rentalRate", default)]
    pub rental_rate: Option<String>,
    #[serde(default)]
    pub availability: bool,
    #[serde(rename = "vehicleSpec")]
    pub vehicle_spec: Option<VehicleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingLocation {
    #[serde(rename = "locationId")]
    pub location_id: i64,
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "bookingId")]
    pub booking_id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "vehicleId")]
    pub vehicle_id: i64,
    #[serde(rename = "locationId")]
    pub location_id: Option<i64>,
    #[serde(rename = "bookingDate")]
    pub booking_date: Option<String>,
    #[serde(rename = "returnDate")]
    pub return_date: Option<String>,
    // Numeric from the DB, often serialized as a string
    #[serde(rename = "totalAmount", default)]
    pub total_amount: Option<String>,
    #[serde(rename = "bookingStatus")]
    pub booking_status: BookingStatus,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub user: Option<BookingUser>,
    #[serde(default)]
    pub vehicle: Option<BookingVehicle>,
    #[serde(default)]
    pub location: Option<BookingLocation>,
}

impl Booking {
    pub fn booking_date(&self) -> Option<NaiveDate> {
        parse_api_date(self.booking_date.as_deref()?)
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        parse_api_date(self.return_date.as_deref()?)
    }

    /// Rental duration in days, when both dates parse.
    pub fn rental_days(&self) -> Option<i64> {
        let from = self.booking_date()?;
        let to = self.return_date()?;
        Some((to - from).num_days())
    }

    /// Total amount as a number. Unparseable or non-finite values count as zero.
    pub fn total_amount_or_zero(&self) -> f64 {
        self.total_amount
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|a| a.is_finite())
            .unwrap_or(0.0)
    }
}

/// Parse a date from the API, accepting plain dates and ISO timestamps.
fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Payload for creating a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "vehicleId")]
    pub vehicle_id: i64,
    #[serde(rename = "locationId")]
    pub location_id: i64,
    #[serde(rename = "bookingDate")]
    pub booking_date: String,
    #[serde(rename = "returnDate")]
    pub return_date: String,
    #[serde(rename = "totalAmount")]
    pub total_amount: String,
}

/// Payload for updating a booking. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBooking {
    #[serde(rename = "bookingStatus", skip_serializing_if = "Option::is_none")]
    pub booking_status: Option<BookingStatus>,
    #[serde(rename = "returnDate", skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(rename = "totalAmount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "bookingId": 17,
            "userId": 4,
            "vehicleId": 3,
            "locationId": 1,
            "bookingDate": "2025-06-01T00:00:00Z",
            "returnDate": "2025-06-08T00:00:00Z",
            "totalAmount": "318.50",
            "bookingStatus": "Pending",
            "user": { "firstName": "Wanjiku", "email": "wanjiku@example.com" }
        }"#
    }

    #[test]
    fn test_booking_deserializes_camel_case() {
        let b: Booking = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(b.booking_id, 17);
        assert_eq!(b.booking_status, BookingStatus::Pending);
        assert_eq!(b.user.as_ref().unwrap().first_name, "Wanjiku");
    }

    #[test]
    fn test_rental_days_from_iso_timestamps() {
        let b: Booking = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(b.rental_days(), Some(7));
    }

    #[test]
    fn test_total_amount_coercion() {
        let mut b: Booking = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(b.total_amount_or_zero(), 318.50);

        b.total_amount = Some("not-a-number".to_string());
        assert_eq!(b.total_amount_or_zero(), 0.0);

        b.total_amount = None;
        assert_eq!(b.total_amount_or_zero(), 0.0);
    }
}
