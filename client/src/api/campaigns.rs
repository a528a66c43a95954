//! Campaign browsing and seller campaign management.

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use boxoffice_core::requests::CampaignDraft;
use boxoffice_core::types::{Campaign, CampaignFilters, CampaignStatus, StatusPageFilters};
use boxoffice_core::{ApiResponse, Pagination, Validate};
use boxoffice_runtime::keys;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Default size of the featured list.
pub const DEFAULT_FEATURED_LIMIT: u32 = 10;

/// One page of campaigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPage {
    /// Campaigns on this page.
    pub campaigns: Vec<Campaign>,
    /// Page metadata.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// `/campaigns` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct CampaignsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CampaignsApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `GET /campaigns`: public search.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn list(&self, filters: &CampaignFilters) -> Result<CampaignPage, ApiError> {
        let request = ApiRequest::get("/campaigns").query(filters)?;
        self.client
            .cached(keys::campaigns::list(Some(filters)), request, None)
            .await
    }

    /// `GET /campaigns/featured`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn featured(&self, limit: Option<u32>) -> Result<Vec<Campaign>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
        let request = ApiRequest::get("/campaigns/featured").query(&json!({ "limit": limit }))?;
        self.client
            .cached(keys::campaigns::featured(limit), request, Some("campaigns"))
            .await
    }

    /// `GET /campaigns/suggestions?q=`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn suggestions(&self, query: &str) -> Result<Vec<String>, ApiError> {
        let request = ApiRequest::get("/campaigns/suggestions").query(&json!({ "q": query }))?;
        self.client
            .cached(keys::campaigns::suggestions(query), request, Some("suggestions"))
            .await
    }

    /// `GET /campaigns/{id}`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn get(&self, id: &str) -> Result<Campaign, ApiError> {
        let request = ApiRequest::get(format!("/campaigns/{id}"));
        self.client
            .cached(keys::campaigns::detail(id), request, Some("campaign"))
            .await
    }

    /// `POST /campaigns`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an invalid draft, otherwise
    /// request errors.
    pub async fn create(&self, draft: &CampaignDraft) -> Result<Campaign, ApiError> {
        draft.validate()?;
        let request = ApiRequest::post("/campaigns").json(draft)?;
        let campaign = self.client.field(request, "campaign").await?;
        self.client.invalidate(&[keys::campaigns::all()]).await;
        Ok(campaign)
    }

    /// `PUT /campaigns/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an invalid draft, otherwise
    /// request errors.
    pub async fn update(&self, id: &str, draft: &CampaignDraft) -> Result<Campaign, ApiError> {
        draft.validate()?;
        let request = ApiRequest::put(format!("/campaigns/{id}")).json(draft)?;
        let campaign = self.client.field(request, "campaign").await?;
        self.client.invalidate(&[keys::campaigns::all()]).await;
        Ok(campaign)
    }

    /// `DELETE /campaigns/{id}`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn delete(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        let envelope = self.client.send(ApiRequest::delete(format!("/campaigns/{id}"))).await?;
        self.client.invalidate(&[keys::campaigns::all()]).await;
        Ok(envelope)
    }

    /// `GET /campaigns/seller/my-campaigns`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn mine(&self, filters: &StatusPageFilters) -> Result<CampaignPage, ApiError> {
        let request = ApiRequest::get("/campaigns/seller/my-campaigns").query(filters)?;
        self.client
            .cached(keys::campaigns::seller(Some(filters)), request, None)
            .await
    }

    /// `PATCH /campaigns/{id}/status`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn update_status(&self, id: &str, status: CampaignStatus) -> Result<Campaign, ApiError> {
        let request = ApiRequest::patch(format!("/campaigns/{id}/status"))
            .json(&json!({ "status": status.as_str() }))?;
        let campaign = self.client.field(request, "campaign").await?;
        self.client.invalidate(&[keys::campaigns::all()]).await;
        Ok(campaign)
    }
}
