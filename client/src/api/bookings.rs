//! Bookings.

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use boxoffice_core::requests::CreateBookingData;
use boxoffice_core::types::{Booking, BookingFilters};
use boxoffice_core::{ApiResponse, Pagination, Validate};
use boxoffice_runtime::keys;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One page of the signed-in customer's bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPage {
    /// Bookings on this page.
    pub bookings: Vec<Booking>,
    /// Page metadata.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// `/bookings` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct BookingsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> BookingsApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `POST /bookings`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for invalid data, otherwise request
    /// errors.
    pub async fn create(&self, data: &CreateBookingData) -> Result<Booking, ApiError> {
        data.validate()?;
        let request = ApiRequest::post("/bookings").json(data)?;
        let booking = self.client.field(request, "booking").await?;
        self.client
            .invalidate(&[
                keys::bookings::all(),
                keys::campaigns::detail(&data.campaign_id),
            ])
            .await;
        Ok(booking)
    }

    /// `GET /bookings/my-bookings`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn mine(&self, filters: &BookingFilters) -> Result<BookingPage, ApiError> {
        let request = ApiRequest::get("/bookings/my-bookings").query(filters)?;
        self.client
            .cached(keys::bookings::mine(Some(filters)), request, None)
            .await
    }

    /// `GET /bookings/{id}`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn get(&self, id: &str) -> Result<Booking, ApiError> {
        let request = ApiRequest::get(format!("/bookings/{id}"));
        self.client
            .cached(keys::bookings::detail(id), request, Some("booking"))
            .await
    }

    /// `POST /bookings/{id}/cancel`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn cancel(&self, id: &str, reason: Option<&str>) -> Result<ApiResponse<Value>, ApiError> {
        let request = ApiRequest::post(format!("/bookings/{id}/cancel")).json(&json!({ "reason": reason }))?;
        let envelope = self.client.send(request).await?;
        self.client.invalidate(&[keys::bookings::all()]).await;
        Ok(envelope)
    }

    /// `GET /bookings/campaign/{id}` (sellers).
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn by_campaign(&self, campaign_id: &str) -> Result<Vec<Booking>, ApiError> {
        let request = ApiRequest::get(format!("/bookings/campaign/{campaign_id}"));
        self.client
            .cached(keys::bookings::by_campaign(campaign_id), request, Some("bookings"))
            .await
    }

    /// `GET /bookings/campaign/{id}/stats` (sellers).
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn campaign_stats(&self, campaign_id: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::get(format!("/bookings/campaign/{campaign_id}/stats"));
        self.client
            .cached(keys::bookings::campaign_stats(campaign_id), request, None)
            .await
    }
}
