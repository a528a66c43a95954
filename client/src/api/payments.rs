//! Payments.

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use boxoffice_core::requests::InitializePaymentData;
use boxoffice_core::types::{Payment, PaymentInitialization, StatusPageFilters};
use boxoffice_core::{Pagination, Validate};
use boxoffice_runtime::keys;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One page of payment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPage {
    /// Payments on this page.
    pub payments: Vec<Payment>,
    /// Page metadata.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// `/payments` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct PaymentsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PaymentsApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `POST /payments/initialize`. The currency defaults to UGX.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without a booking id, otherwise
    /// request errors.
    pub async fn initialize(&self, data: &InitializePaymentData) -> Result<PaymentInitialization, ApiError> {
        data.validate()?;
        let data = data.clone().with_default_currency();
        let request = ApiRequest::post("/payments/initialize").json(&data)?;
        self.client.data(request).await
    }

    /// `GET /payments/verify/{reference}`. Never served from cache.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn verify(&self, reference: &str) -> Result<Payment, ApiError> {
        let request = ApiRequest::get(format!("/payments/verify/{reference}"));
        let payment: Payment = self.client.field(request, "payment").await?;
        self.client
            .context()
            .cache()
            .set_as(keys::payments::verify(reference), &payment)
            .await;
        self.client
            .invalidate(&[keys::payments::history(None), keys::bookings::all()])
            .await;
        Ok(payment)
    }

    /// `GET /payments/history`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn history(&self, filters: &StatusPageFilters) -> Result<PaymentPage, ApiError> {
        let request = ApiRequest::get("/payments/history").query(filters)?;
        self.client
            .cached(keys::payments::history(Some(filters)), request, None)
            .await
    }

    /// `POST /payments/{id}/refund`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn request_refund(&self, payment_id: &str, reason: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::post(format!("/payments/{payment_id}/refund"))
            .json(&json!({ "reason": reason }))?;
        let refund = self.client.field(request, "refund").await?;
        self.client.invalidate(&[keys::payments::all()]).await;
        Ok(refund)
    }
}
