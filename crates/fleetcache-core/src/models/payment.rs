use serde::{Deserialize, Serialize};

use super::de_flexible_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

/// Nested user details carried on a payment for the admin views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUser {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "paymentId")]
    pub payment_id: i64,
    #[serde(rename = "bookingId")]
    pub booking_id: i64,
    // Numeric from the DB, sometimes serialized as a string
    #[serde(default, deserialize_with = "de_flexible_number")]
    pub amount: Option<f64>,
    #[serde(rename = "paymentDate", default)]
    pub payment_date: Option<String>,
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: Option<String>,
    #[serde(rename = "transactionId", default)]
    pub transaction_id: Option<String>,
    #[serde(rename = "paymentStatus")]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub user: Option<PaymentUser>,
}

impl Payment {
    /// Amount as a number. Missing, unparseable, or non-finite values count
    /// as zero so one bad row cannot poison a revenue total.
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.filter(|a| a.is_finite()).unwrap_or(0.0)
    }
}

/// Payload for recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    #[serde(rename = "bookingId")]
    pub booking_id: i64,
    pub amount: f64,
    #[serde(rename = "paymentDate")]
    pub payment_date: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    #[serde(rename = "paymentStatus")]
    pub payment_status: PaymentStatus,
}

/// Payload for updating a payment. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePayment {
    #[serde(rename = "paymentStatus", skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "paymentMethod", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(rename = "transactionId", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}
