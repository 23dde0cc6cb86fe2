//! API client for the rental platform REST backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests against the booking, payment, user, vehicle, and ticket
//! endpoints. It is also the cache's [`ResourceFetcher`]: every query key
//! dispatches to the matching typed fetch.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::cache::{QueryKey, ResourceFetcher, ResourceValue};
use crate::config::ApiConfig;
use crate::models::{
    Booking, NewBooking, NewPayment, NewTicket, NewVehicle, Payment, ProfileImagePayload, Ticket,
    UpdateBooking, UpdatePayment, UpdateTicket, UpdateUserProfile, UpdateVehicle, User, Vehicle,
};

use super::ApiError;

/// API client for the rental backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Check if a response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    fn attach_token(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn parse_json<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.attach_token(self.client.get(&url)).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(&url, response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .attach_token(self.client.post(&url))
            .json(body)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(&url, response).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "PUT");
        let response = self
            .attach_token(self.client.put(&url))
            .json(body)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(&url, response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!(url = %url, "DELETE");
        let response = self.attach_token(self.client.delete(&url)).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Bookings =====

    pub async fn fetch_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.get_json("bookings").await
    }

    pub async fn fetch_booking(&self, id: i64) -> Result<Booking, ApiError> {
        self.get_json(&format!("bookings/{}", id)).await
    }

    pub async fn fetch_user_bookings(&self, user_id: i64) -> Result<Vec<Booking>, ApiError> {
        self.get_json(&format!("bookings/user?userId={}", user_id))
            .await
    }

    pub async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, ApiError> {
        self.post_json("bookings", booking).await
    }

    pub async fn update_booking(
        &self,
        id: i64,
        patch: &UpdateBooking,
    ) -> Result<Booking, ApiError> {
        self.put_json(&format!("bookings/{}", id), patch).await
    }

    pub async fn delete_booking(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("bookings/{}", id)).await
    }

    // ===== Payments =====

    pub async fn fetch_payments(&self) -> Result<Vec<Payment>, ApiError> {
        self.get_json("payments").await
    }

    pub async fn fetch_payment(&self, id: i64) -> Result<Payment, ApiError> {
        self.get_json(&format!("payments/{}", id)).await
    }

    pub async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, ApiError> {
        self.post_json("payments", payment).await
    }

    pub async fn update_payment(
        &self,
        id: i64,
        patch: &UpdatePayment,
    ) -> Result<Payment, ApiError> {
        self.put_json(&format!("payments/{}", id), patch).await
    }

    pub async fn delete_payment(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("payments/{}", id)).await
    }

    // ===== Tickets =====

    pub async fn fetch_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        self.get_json("tickets").await
    }

    pub async fn fetch_ticket(&self, id: i64) -> Result<Ticket, ApiError> {
        self.get_json(&format!("tickets/{}", id)).await
    }

    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, ApiError> {
        self.post_json("tickets", ticket).await
    }

    pub async fn update_ticket(&self, id: i64, patch: &UpdateTicket) -> Result<Ticket, ApiError> {
        self.put_json(&format!("tickets/{}", id), patch).await
    }

    pub async fn delete_ticket(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("tickets/{}", id)).await
    }

    // ===== Users =====

    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        self.get_json("users").await
    }

    pub async fn fetch_user(&self, id: i64) -> Result<User, ApiError> {
        self.get_json(&format!("users/{}", id)).await
    }

    pub async fn update_user_profile(
        &self,
        id: i64,
        patch: &UpdateUserProfile,
    ) -> Result<User, ApiError> {
        self.put_json(&format!("users/{}", id), patch).await
    }

    /// Record an uploaded profile image's hosted URL. The upload itself goes
    /// straight to the asset host; only the resulting URL passes through here.
    pub async fn update_profile_image(
        &self,
        id: i64,
        payload: &ProfileImagePayload,
    ) -> Result<User, ApiError> {
        self.put_json(&format!("users/{}", id), payload).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("users/{}", id)).await
    }

    // ===== Vehicles =====

    pub async fn fetch_vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
        self.get_json("vehicles").await
    }

    pub async fn fetch_vehicle(&self, id: i64) -> Result<Vehicle, ApiError> {
        self.get_json(&format!("vehicles/{}", id)).await
    }

    pub async fn create_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle, ApiError> {
        self.post_json("vehicles", vehicle).await
    }

    pub async fn update_vehicle(
        &self,
        id: i64,
        patch: &UpdateVehicle,
    ) -> Result<Vehicle, ApiError> {
        self.put_json(&format!("vehicles/{}", id), patch).await
    }

    pub async fn delete_vehicle(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("vehicles/{}", id)).await
    }
}

impl ResourceFetcher for ApiClient {
    fn fetch(
        &self,
        key: &QueryKey,
    ) -> impl Future<Output = Result<ResourceValue, ApiError>> + Send {
        let client = self.clone();
        let key = key.clone();
        async move {
            match key {
                QueryKey::AllBookings => {
                    Ok(ResourceValue::Bookings(client.fetch_bookings().await?))
                }
                QueryKey::BookingById(id) => {
                    Ok(ResourceValue::Booking(client.fetch_booking(id).await?))
                }
                QueryKey::BookingsForUser(user_id) => Ok(ResourceValue::Bookings(
                    client.fetch_user_bookings(user_id).await?,
                )),
                QueryKey::AllPayments => {
                    Ok(ResourceValue::Payments(client.fetch_payments().await?))
                }
                QueryKey::PaymentById(id) => {
                    Ok(ResourceValue::Payment(client.fetch_payment(id).await?))
                }
                QueryKey::AllTickets => Ok(ResourceValue::Tickets(client.fetch_tickets().await?)),
                QueryKey::TicketById(id) => {
                    Ok(ResourceValue::Ticket(client.fetch_ticket(id).await?))
                }
                QueryKey::AllUsers => Ok(ResourceValue::Users(client.fetch_users().await?)),
                QueryKey::UserById(id) => Ok(ResourceValue::User(client.fetch_user(id).await?)),
                QueryKey::AllVehicles => {
                    Ok(ResourceValue::Vehicles(client.fetch_vehicles().await?))
                }
                QueryKey::VehicleById(id) => {
                    Ok(ResourceValue::Vehicle(client.fetch_vehicle(id).await?))
                }
            }
        }
    }
}
