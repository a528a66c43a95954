//! Payment gateway callback handling.
//!
//! After paying, the gateway redirects the customer back with
//! `OrderTrackingId` and `OrderMerchantReference` query parameters. The
//! merchant reference is what the API verifies.

use crate::http::ApiClient;
use boxoffice_core::types::{Payment, PaymentStatus};
use reqwest::Url;
use serde::Deserialize;

/// Shown when the payment settled.
pub const SUCCESS_MESSAGE: &str = "Payment successful! Your booking has been confirmed.";
/// Shown when the payment did not settle.
pub const NOT_SETTLED_MESSAGE: &str = "Payment verification failed. Please contact support.";
/// Shown when verification itself failed.
pub const VERIFY_ERROR_MESSAGE: &str = "Failed to verify payment. Please contact support.";
/// Shown when only the tracking id came back.
pub const MISSING_REFERENCE_MESSAGE: &str = "Invalid payment reference (Merchant Reference missing)";
/// Shown when neither parameter came back.
pub const MISSING_DETAILS_MESSAGE: &str = "Payment details missing in callback";

/// Query parameters of the gateway redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    /// Gateway tracking id.
    #[serde(rename = "OrderTrackingId", default)]
    pub order_tracking_id: Option<String>,
    /// Merchant reference issued at initialization.
    #[serde(rename = "OrderMerchantReference", default)]
    pub order_merchant_reference: Option<String>,
}

impl CallbackParams {
    /// Read the parameters from a query string (with or without `?`).
    /// Values are percent-decoded.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        let url = format!("http://callback/?{}", query.trim_start_matches('?'));
        let Ok(url) = Url::parse(&url) else {
            return params;
        };
        for (name, value) in url.query_pairs() {
            let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            match name.as_ref() {
                "OrderTrackingId" => params.order_tracking_id = value,
                "OrderMerchantReference" => params.order_merchant_reference = value,
                _ => {}
            }
        }
        params
    }
}

/// Result of processing a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// The payment settled.
    Success {
        /// Verified payment.
        payment: Box<Payment>,
    },
    /// Anything else, with the message to show.
    Failed(String),
}

impl CallbackOutcome {
    /// Message to show the customer.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { .. } => SUCCESS_MESSAGE,
            Self::Failed(message) => message,
        }
    }

    /// Whether the payment settled.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Verify the payment a callback refers to.
pub async fn process_callback(client: &ApiClient, params: &CallbackParams) -> CallbackOutcome {
    let reference = params
        .order_merchant_reference
        .as_deref()
        .filter(|r| !r.is_empty());

    let Some(reference) = reference else {
        return if params.order_tracking_id.as_deref().is_some_and(|t| !t.is_empty()) {
            tracing::warn!(tracking_id = ?params.order_tracking_id, "Callback without merchant reference");
            CallbackOutcome::Failed(MISSING_REFERENCE_MESSAGE.to_string())
        } else {
            tracing::warn!("Callback without payment details");
            CallbackOutcome::Failed(MISSING_DETAILS_MESSAGE.to_string())
        };
    };

    match client.payments().verify(reference).await {
        Ok(payment) if payment.status == PaymentStatus::Success => {
            tracing::info!(reference, "Payment confirmed");
            CallbackOutcome::Success {
                payment: Box::new(payment),
            }
        }
        Ok(payment) => {
            tracing::info!(reference, status = ?payment.status, "Payment not settled");
            CallbackOutcome::Failed(NOT_SETTLED_MESSAGE.to_string())
        }
        Err(e) => {
            tracing::error!(reference, error = %e, "Payment verification failed");
            CallbackOutcome::Failed(VERIFY_ERROR_MESSAGE.to_string())
        }
    }
}
