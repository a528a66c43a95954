//! Marketplace HTTP client.
//!
//! Every call goes through [`ApiClient::send`], which unwraps the JSON
//! envelope and recovers from an expired session:
//!
//! 1. A 401 from `/auth/login` is returned as is. A 401 from any other auth
//!    endpoint also expires the local session.
//! 2. A 401 from a request that was already replayed is returned as is.
//! 3. Otherwise the session is refreshed through the shared
//!    [`RefreshGate`](boxoffice_runtime::RefreshGate) and the request is
//!    replayed once. Concurrent 401s wait on the same refresh; a failed
//!    refresh fails all of them with the same [`SessionError`].

use crate::config::ClientConfig;
use crate::error::ApiError;
use boxoffice_core::{ApiResponse, User};
use boxoffice_runtime::{
    AuthStore, QueryCache, QueryKey, RefreshOutcome, RetryPolicy, SessionApi, SessionContext, SessionError,
    retry_if,
};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub(crate) const REFRESH_PATH: &str = "/auth/refresh-token";
pub(crate) const LOGOUT_PATH: &str = "/auth/logout";
pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const REGISTER_PATH: &str = "/auth/register";
pub(crate) const PROFILE_PATH: &str = "/auth/profile";

const AUTH_ENDPOINTS: [&str; 4] = [REFRESH_PATH, LOGOUT_PATH, LOGIN_PATH, REGISTER_PATH];

/// A replayable API request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    /// Request `path` (relative to the API base URL) with `method`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    /// `GET path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add the fields of `params` as query parameters. `None` fields are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if `params` does not serialize to an
    /// object.
    pub fn query<P: Serialize + ?Sized>(mut self, params: &P) -> Result<Self, ApiError> {
        match serde_json::to_value(params).map_err(|e| ApiError::Encode(e.to_string()))? {
            Value::Object(fields) => {
                for (name, value) in fields {
                    let value = match value {
                        Value::Null => continue,
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    self.query.push((name, value));
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(ApiError::Encode(format!(
                "query parameters must be an object, got {other}"
            ))),
        }
    }

    /// Set the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?);
        Ok(self)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// JSON body.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Whether this is the replay after a refresh.
    #[must_use]
    pub const fn is_retried(&self) -> bool {
        self.retried
    }

    /// Auth endpoint this request targets, if any.
    fn auth_endpoint(&self) -> Option<&'static str> {
        AUTH_ENDPOINTS
            .into_iter()
            .find(|endpoint| self.path.starts_with(endpoint))
    }

    fn into_replay(mut self) -> Self {
        self.retried = true;
        self
    }
}

/// Marketplace API client.
///
/// Cheap to clone; clones share the cookie jar and the [`SessionContext`].
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    context: Arc<SessionContext>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client for `config` with a fresh session context.
    ///
    /// Auth state is persisted under `config.auth_storage` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let store = match &config.auth_storage {
            Some(dir) => AuthStore::persistent(dir),
            None => AuthStore::in_memory(),
        };
        let context = Arc::new(SessionContext::new(store, QueryCache::default()));
        Self::with_context(config, context)
    }

    /// Client for `config` sharing `context` with a session manager.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn with_context(config: &ClientConfig, context: Arc<SessionContext>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            context,
        })
    }

    /// API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session state shared with the session manager.
    #[must_use]
    pub const fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Send `request`, recovering from an expired session once.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] for error statuses, [`ApiError::Session`]
    /// when the session could not be refreshed, and transport errors as
    /// [`ApiError::Network`] or [`ApiError::Timeout`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse<Value>, ApiError> {
        match self.dispatch(&request).await {
            Err(error) if error.is_unauthorized() => self.recover(request, error).await,
            outcome => outcome,
        }
    }

    /// Send `request` and decode its `data`.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus [`ApiError::MissingData`] and
    /// [`ApiError::Decode`].
    pub async fn data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let data = self.send(request).await?.data.ok_or(ApiError::MissingData)?;
        decode(data)
    }

    /// Send `request` and decode `data.<name>`.
    ///
    /// # Errors
    ///
    /// As [`data`](Self::data).
    pub async fn field<T: DeserializeOwned>(&self, request: ApiRequest, name: &str) -> Result<T, ApiError> {
        let mut data: Value = self.data(request).await?;
        let field = data.get_mut(name).map(Value::take).ok_or(ApiError::MissingData)?;
        decode(field)
    }

    /// Serve `key` from the query cache while fresh; otherwise fetch
    /// `data.<name>` (or all of `data`) and cache it.
    pub(crate) async fn cached<T>(
        &self,
        key: QueryKey,
        request: ApiRequest,
        name: Option<&str>,
    ) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        let cache = self.context.cache();
        if let Some(hit) = cache.get_as::<T>(&key).await {
            tracing::trace!(key = %key, "Cache hit");
            return Ok(hit);
        }
        let value: T = match name {
            Some(name) => self.field(request, name).await?,
            None => self.data(request).await?,
        };
        cache.set_as(key, &value).await;
        Ok(value)
    }

    /// Mark every query under each prefix stale.
    pub(crate) async fn invalidate(&self, prefixes: &[QueryKey]) {
        for prefix in prefixes {
            self.context.cache().invalidate_prefix(prefix).await;
        }
    }

    async fn recover(&self, request: ApiRequest, error: ApiError) -> Result<ApiResponse<Value>, ApiError> {
        if let Some(endpoint) = request.auth_endpoint() {
            tracing::debug!(endpoint, "Auth endpoint rejected, not refreshing");
            if endpoint != LOGIN_PATH {
                self.context.expire().await;
            }
            return Err(error);
        }
        if request.is_retried() {
            tracing::debug!(path = %request.path, "Replay rejected, giving up");
            return Err(error);
        }

        tracing::info!(path = %request.path, "Session expired, refreshing");
        self.context.refresh(self).await?;
        self.dispatch(&request.into_replay()).await
    }

    /// Send without session recovery.
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse<Value>, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, path = %request.path, retried = request.retried, "Sending request");
        let response = builder.send().await.map_err(|e| ApiError::from_transport(&e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ApiError::from_transport(&e))?;
        let body = serde_json::from_slice::<Value>(&bytes).ok();

        if !status.is_success() {
            let error = ApiError::from_response(status, body);
            tracing::debug!(status = status.as_u16(), path = %request.path, error = %error, "Request failed");
            return Err(error);
        }

        let body = body.ok_or_else(|| ApiError::Decode("response body is not JSON".to_string()))?;
        decode(body)
    }

    /// Repeat `operation` on network and server errors: 3 attempts, backoff
    /// from 1 s. Client errors are returned at once.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error or the error of the last attempt.
    pub async fn retry_request<T, F, Fut>(operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        retry_if(&RetryPolicy::default(), operation, ApiError::is_retryable).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

impl SessionApi for ApiClient {
    fn refresh_token(&self) -> impl Future<Output = RefreshOutcome> + Send {
        async move {
            let envelope = self.dispatch(&ApiRequest::post(REFRESH_PATH)).await?;
            let user = envelope
                .data
                .and_then(|mut data| data.get_mut("user").map(Value::take))
                .filter(|user| !user.is_null())
                .map(decode::<User>)
                .transpose()?;
            Ok(user)
        }
    }

    fn profile(&self) -> impl Future<Output = Result<User, SessionError>> + Send {
        async move {
            let envelope = self.send(ApiRequest::get(PROFILE_PATH)).await?;
            let mut data = envelope.data.ok_or(ApiError::MissingData)?;
            let user = data.get_mut("user").map(Value::take).ok_or(ApiError::MissingData)?;
            Ok(decode(user)?)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_core::types::{BookingFilters, BookingStatus};

    #[test]
    fn test_query_skips_unset_filters() {
        let filters = BookingFilters {
            status: Some(BookingStatus::Confirmed),
            page: Some(2),
            ..BookingFilters::default()
        };
        let request = ApiRequest::get("/bookings/my-bookings").query(&filters).unwrap();
        assert_eq!(
            request.query_pairs(),
            &[
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "CONFIRMED".to_string())
            ]
        );
    }

    #[test]
    fn test_query_rejects_scalars() {
        assert!(matches!(
            ApiRequest::get("/x").query(&5),
            Err(ApiError::Encode(_))
        ));
    }

    #[test]
    fn test_auth_endpoints() {
        assert_eq!(ApiRequest::post(LOGIN_PATH).auth_endpoint(), Some(LOGIN_PATH));
        assert_eq!(ApiRequest::post(REFRESH_PATH).auth_endpoint(), Some(REFRESH_PATH));
        assert_eq!(ApiRequest::get(PROFILE_PATH).auth_endpoint(), None);
        assert_eq!(ApiRequest::get("/bookings/1").auth_endpoint(), None);
    }

    #[test]
    fn test_replay_is_marked() {
        let request = ApiRequest::post("/bookings").json(&serde_json::json!({"quantity": 2})).unwrap();
        let replay = request.clone().into_replay();
        assert!(!request.is_retried());
        assert!(replay.is_retried());
        assert_eq!(replay.body(), request.body());
    }
}
