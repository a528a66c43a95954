//! Authentication, seller applications and team managers.

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest, LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, REGISTER_PATH};
use boxoffice_core::requests::{
    CreateManagerData, LoginCredentials, NewSellerApplication, RegisterData, SellerApplicationData,
};
use boxoffice_core::routes::{CUSTOMER_DASHBOARD, LOGIN, SELLER_DASHBOARD};
use boxoffice_core::types::{ApplicationStatus, Manager, User, UserRole};
use boxoffice_core::{ApiResponse, Validate};
use boxoffice_runtime::keys;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account created together with a seller application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSellerAccount {
    /// The new account.
    pub user: User,
    /// Application record.
    #[serde(default)]
    pub application: Option<Value>,
}

/// Result of applying as an existing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmitted {
    /// Review state.
    pub application_status: ApplicationStatus,
}

/// Current seller application state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatusInfo {
    /// Review state, if the user applied.
    #[serde(default)]
    pub application_status: Option<ApplicationStatus>,
    /// Application record.
    #[serde(default)]
    pub seller_application: Option<Value>,
}

/// Managers of the signed-in seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerList {
    /// Managers.
    pub managers: Vec<Manager>,
    /// Total.
    pub count: u32,
}

/// Invitation sent to a new manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedManager {
    /// Manager id.
    pub manager_id: String,
    /// Display name.
    pub name: String,
    /// Invitation email.
    pub email: String,
}

/// Manager after deactivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivatedManager {
    /// Manager id.
    pub manager_id: String,
    /// Always `false` on success.
    pub is_active: bool,
}

/// Where to send the user after an auth flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Landing {
    /// Signed-in user, if any.
    pub user: Option<User>,
    /// Route to navigate to.
    pub route: &'static str,
}

/// Landing route for a freshly signed-in user.
#[must_use]
pub const fn landing_route(user: &User) -> &'static str {
    if user.is_seller() {
        SELLER_DASHBOARD
    } else {
        CUSTOMER_DASHBOARD
    }
}

/// `/auth` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for malformed credentials, otherwise
    /// request errors.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, ApiError> {
        credentials.validate()?;
        let request = ApiRequest::post(LOGIN_PATH).json(credentials)?;
        self.client.field(request, "user").await
    }

    /// `POST /auth/register`. Always registers a customer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for invalid sign-up data, otherwise
    /// request errors.
    pub async fn register(&self, data: &RegisterData) -> Result<User, ApiError> {
        data.validate()?;
        let data = RegisterData {
            role: Some(UserRole::Customer),
            ..data.clone()
        };
        let request = ApiRequest::post(REGISTER_PATH).json(&data)?;
        self.client.field(request, "user").await
    }

    /// URL that starts Google sign-in.
    #[must_use]
    pub fn google_auth_url(&self) -> String {
        format!("{}/auth/google", self.client.base_url())
    }

    /// `POST /auth/logout`. Never fails; a failed call is reported as an
    /// unsuccessful envelope.
    pub async fn logout(&self) -> ApiResponse<Value> {
        match self.client.send(ApiRequest::post(LOGOUT_PATH)).await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Logout failed");
                ApiResponse {
                    success: false,
                    message: Some("Logout failed".to_string()),
                    data: None,
                    status: None,
                    errors: None,
                }
            }
        }
    }

    /// `POST /auth/refresh-token`, through the shared refresh gate.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Session`] if the refresh failed; a 401 also
    /// expires the session.
    pub async fn refresh_token(&self) -> Result<Option<User>, ApiError> {
        Ok(self.client.context().refresh(self.client).await?)
    }

    /// `GET /auth/profile`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn profile(&self) -> Result<User, ApiError> {
        self.client
            .cached(keys::auth::profile(), ApiRequest::get(PROFILE_PATH), Some("user"))
            .await
    }

    /// `POST /auth/apply-seller`: sign up and apply in one step.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for invalid data, otherwise request
    /// errors.
    pub async fn apply_seller_new(&self, data: &NewSellerApplication) -> Result<NewSellerAccount, ApiError> {
        data.validate()?;
        let request = ApiRequest::post("/auth/apply-seller").json(data)?;
        self.client.data(request).await
    }

    /// `POST /auth/seller-application` as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for invalid data, otherwise request
    /// errors.
    pub async fn apply_seller_existing(
        &self,
        data: &SellerApplicationData,
    ) -> Result<ApplicationSubmitted, ApiError> {
        data.validate()?;
        let request = ApiRequest::post("/auth/seller-application").json(data)?;
        let submitted = self.client.data(request).await?;
        self.client.invalidate(&[keys::auth::application_status()]).await;
        Ok(submitted)
    }

    /// `GET /auth/application-status`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn application_status(&self) -> Result<ApplicationStatusInfo, ApiError> {
        self.client
            .cached(
                keys::auth::application_status(),
                ApiRequest::get("/auth/application-status"),
                None,
            )
            .await
    }

    /// `POST /auth/create-manager`: invite a manager.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for invalid data, otherwise request
    /// errors.
    pub async fn create_manager(&self, data: &CreateManagerData) -> Result<CreatedManager, ApiError> {
        data.validate()?;
        let request = ApiRequest::post("/auth/create-manager").json(data)?;
        let created = self.client.data(request).await?;
        self.client.invalidate(&[keys::auth::managers()]).await;
        Ok(created)
    }

    /// `GET /auth/seller-managers`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn seller_managers(&self) -> Result<ManagerList, ApiError> {
        self.client
            .cached(keys::auth::managers(), ApiRequest::get("/auth/seller-managers"), None)
            .await
    }

    /// `POST /auth/deactivate-manager/{id}`.
    ///
    /// # Errors
    ///
    /// Returns request errors.
    pub async fn deactivate_manager(&self, manager_id: &str) -> Result<DeactivatedManager, ApiError> {
        let request = ApiRequest::post(format!("/auth/deactivate-manager/{manager_id}"));
        let deactivated = self.client.data(request).await?;
        self.client.invalidate(&[keys::auth::managers()]).await;
        Ok(deactivated)
    }

    /// Log in and start a session.
    ///
    /// Stores the user, caches the profile and picks the landing route by
    /// role.
    ///
    /// # Errors
    ///
    /// As [`login`](Self::login).
    pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Landing, ApiError> {
        let user = self.login(credentials).await?;
        self.client.context().establish(&user).await;
        tracing::info!(user_id = %user.id, role = ?user.role, "Signed in");
        Ok(Landing {
            route: landing_route(&user),
            user: Some(user),
        })
    }

    /// Register and start a session. New accounts land on the customer
    /// dashboard.
    ///
    /// # Errors
    ///
    /// As [`register`](Self::register).
    pub async fn sign_up(&self, data: &RegisterData) -> Result<Landing, ApiError> {
        let user = self.register(data).await?;
        self.client.context().establish(&user).await;
        tracing::info!(user_id = %user.id, "Account created");
        Ok(Landing {
            user: Some(user),
            route: CUSTOMER_DASHBOARD,
        })
    }

    /// Log out on the server, then clear local state regardless of the
    /// outcome.
    pub async fn sign_out(&self) -> Landing {
        let outcome = self.logout().await;
        if !outcome.success {
            tracing::warn!("Server logout failed, clearing local session anyway");
        }
        self.client.context().sign_out().await;
        Landing {
            user: None,
            route: LOGIN,
        }
    }
}
