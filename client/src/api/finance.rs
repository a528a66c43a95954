//! Seller finance: balances, payout methods and withdrawals.

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use boxoffice_core::Validate;
use boxoffice_core::requests::{AddWithdrawalMethodData, RequestWithdrawalData};
use boxoffice_core::types::{
    FinanceDashboard, Transaction, TransactionFilters, Withdrawal, WithdrawalStatus,
};
use boxoffice_runtime::keys;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A newly registered payout method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodAdded {
    /// Method id.
    pub method_id: String,
}

/// A newly requested withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequested {
    /// Withdrawal id.
    pub withdrawal_id: String,
    /// Processing state.
    pub status: WithdrawalStatus,
}

/// `/finance` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct FinanceApi<'a> {
    client: &'a ApiClient,
}

impl<'a> FinanceApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `GET /finance/dashboard`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn dashboard(&self) -> Result<FinanceDashboard, ApiError> {
        self.client
            .cached(keys::finance::dashboard(), ApiRequest::get("/finance/dashboard"), None)
            .await
    }

    /// `POST /finance/withdrawal-methods`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the fields required by the
    /// method are missing, otherwise request errors.
    pub async fn add_withdrawal_method(&self, data: &AddWithdrawalMethodData) -> Result<MethodAdded, ApiError> {
        data.validate()?;
        let request = ApiRequest::post("/finance/withdrawal-methods").json(data)?;
        let added = self.client.data(request).await?;
        self.client.invalidate(&[keys::finance::all()]).await;
        Ok(added)
    }

    /// `DELETE /finance/withdrawal-methods/{id}`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn remove_withdrawal_method(&self, method_id: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::delete(format!("/finance/withdrawal-methods/{method_id}"));
        let removed = self.client.data(request).await?;
        self.client.invalidate(&[keys::finance::all()]).await;
        Ok(removed)
    }

    /// `POST /finance/withdrawals`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a non-positive amount or missing
    /// method, otherwise request errors.
    pub async fn request_withdrawal(&self, data: &RequestWithdrawalData) -> Result<WithdrawalRequested, ApiError> {
        data.validate()?;
        let request = ApiRequest::post("/finance/withdrawals").json(data)?;
        let requested = self.client.data(request).await?;
        self.client.invalidate(&[keys::finance::all()]).await;
        Ok(requested)
    }

    /// `GET /finance/withdrawals`, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn withdrawals(&self, status: Option<WithdrawalStatus>) -> Result<Vec<Withdrawal>, ApiError> {
        let status = status.map(wire_name).transpose()?;
        let mut params = Map::new();
        if let Some(status) = &status {
            params.insert("status".to_string(), Value::String(status.clone()));
        }
        let request = ApiRequest::get("/finance/withdrawals").query(&params)?;
        self.client
            .cached(keys::finance::withdrawals(status.as_deref()), request, Some("withdrawals"))
            .await
    }

    /// `GET /finance/transactions`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn transactions(&self, filters: &TransactionFilters) -> Result<Vec<Transaction>, ApiError> {
        let request = ApiRequest::get("/finance/transactions").query(filters)?;
        self.client
            .cached(keys::finance::transactions(Some(filters)), request, Some("transactions"))
            .await
    }

    /// `GET /finance/analytics`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn analytics(&self, period: Option<&str>, group_by: Option<&str>) -> Result<Value, ApiError> {
        let mut params = Map::new();
        if let Some(period) = period {
            params.insert("period".to_string(), Value::String(period.to_string()));
        }
        if let Some(group_by) = group_by {
            params.insert("groupBy".to_string(), Value::String(group_by.to_string()));
        }
        let request = ApiRequest::get("/finance/analytics").query(&params)?;
        self.client
            .cached(keys::finance::analytics(period, group_by), request, None)
            .await
    }
}

fn wire_name(status: WithdrawalStatus) -> Result<String, ApiError> {
    match serde_json::to_value(status) {
        Ok(Value::String(name)) => Ok(name),
        Ok(other) => Err(ApiError::Encode(format!("unexpected status encoding {other}"))),
        Err(e) => Err(ApiError::Encode(e.to_string())),
    }
}
