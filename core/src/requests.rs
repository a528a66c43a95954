//! Request payloads sent to the marketplace API.
//!
//! Every payload that carries user input implements [`Validate`].

use crate::types::{
    CampaignStatus, EventType, IssuanceType, TicketType, UserRole, WithdrawalMethodKind,
};
use crate::validation::{Rules, Validate, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════
// Auth
// ═══════════════════════════════════════════════════════════

/// Email/password login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Ask the server for a long-lived session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember_me: Option<bool>,
}

impl LoginCredentials {
    /// Credentials without "remember me".
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember_me: None,
        }
    }
}

impl Validate for LoginCredentials {
    fn validate(&self) -> Result<(), ValidationError> {
        Rules::new()
            .email("email", &self.email)
            .min_chars(
                "password",
                &self.password,
                6,
                "Password must be at least 6 characters",
            )
            .finish()
    }
}

/// Customer sign-up.
///
/// `confirm_password` and `terms` are checked locally and never sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Repeated password.
    #[serde(skip)]
    pub confirm_password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Date of birth (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Forced to [`UserRole::Customer`] when sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Terms and conditions accepted.
    #[serde(skip)]
    pub terms: bool,
}

impl RegisterData {
    fn rules(&self) -> Rules {
        Rules::new()
            .min_chars(
                "firstName",
                &self.first_name,
                2,
                "First name must be at least 2 characters",
            )
            .min_chars(
                "lastName",
                &self.last_name,
                2,
                "Last name must be at least 2 characters",
            )
            .email("email", &self.email)
            .strong_password("password", &self.password)
            .check(
                self.password == self.confirm_password,
                "confirmPassword",
                "Passwords don't match",
            )
            .check(
                self.terms,
                "terms",
                "You must accept the terms and conditions",
            )
    }
}

impl Validate for RegisterData {
    fn validate(&self) -> Result<(), ValidationError> {
        self.rules().finish()
    }
}

/// Legal form of a seller business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessType {
    /// Sole trader.
    Individual,
    /// Registered company.
    Company,
    /// Non-profit or association.
    Organization,
    /// Anything else.
    Other,
}

/// Social handles listed on a seller application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMediaHandles {
    /// Facebook handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    /// X/Twitter handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    /// Instagram handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

/// Seller application details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerApplicationData {
    /// Trading name.
    pub business_name: String,
    /// Legal form.
    pub business_type: BusinessType,
    /// Registered address.
    pub business_address: String,
    /// Business phone.
    pub business_phone: String,
    /// Business email.
    pub business_email: String,
    /// Tax registration number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    /// Uploaded document URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_documents: Option<Vec<String>>,
    /// About the business.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    /// Social handles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media_handles: Option<SocialMediaHandles>,
}

impl SellerApplicationData {
    fn rules(&self, rules: Rules) -> Rules {
        rules
            .min_chars(
                "businessName",
                &self.business_name,
                2,
                "Business name is required",
            )
            .min_chars(
                "businessAddress",
                &self.business_address,
                5,
                "Business address is required",
            )
            .min_chars(
                "businessPhone",
                &self.business_phone,
                10,
                "Valid phone number is required",
            )
            .email("businessEmail", &self.business_email)
            .optional_url("websiteUrl", self.website_url.as_deref())
    }
}

impl Validate for SellerApplicationData {
    fn validate(&self) -> Result<(), ValidationError> {
        self.rules(Rules::new()).finish()
    }
}

/// Sign-up and seller application in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSellerApplication {
    /// Account part.
    #[serde(flatten)]
    pub account: RegisterData,
    /// Business part.
    #[serde(flatten)]
    pub business: SellerApplicationData,
}

impl Validate for NewSellerApplication {
    fn validate(&self) -> Result<(), ValidationError> {
        self.business.rules(self.account.rules()).finish()
    }
}

/// Invitation for a new team manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateManagerData {
    /// Display name.
    pub name: String,
    /// Invitation email.
    pub email: String,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Permissions to grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Validate for CreateManagerData {
    fn validate(&self) -> Result<(), ValidationError> {
        Rules::new()
            .min_chars("name", &self.name, 2, "Name must be at least 2 characters")
            .email("email", &self.email)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════
// Campaigns
// ═══════════════════════════════════════════════════════════

/// Fields for creating or updating a campaign. Absent fields are untouched
/// on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    /// Headline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kind of event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    /// Tiers keyed by tier name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_types: Option<HashMap<String, TicketType>>,
    /// Per-customer cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_per_customer: Option<u32>,
    /// Event time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,
    /// Sales open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Sales close.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Venue name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// Street address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_address: Option<String>,
    /// City.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_city: Option<String>,
    /// Country.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_country: Option<String>,
    /// Banner image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Gallery image URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Publication state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
    /// Allow repeated scans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_multi_scan: Option<bool>,
    /// Scan cap per ticket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scans_per_ticket: Option<u32>,
    /// Search tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Validate for CampaignDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        let tiers_ok = self.ticket_types.as_ref().is_none_or(|tiers| {
            tiers
                .values()
                .all(|tier| tier.price >= 0.0 && tier.quantity > 0)
        });
        let window_ok = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        };
        Rules::new()
            .check(
                self.title.as_deref().is_none_or(|t| t.chars().count() >= 3),
                "title",
                "Event name must be at least 3 characters",
            )
            .check(
                tiers_ok,
                "ticketTypes",
                "Ticket prices must not be negative and quantities must be positive",
            )
            .check(window_ok, "endDate", "Sales must close after they open")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════
// Bookings and payments
// ═══════════════════════════════════════════════════════════

/// Reserve seats in one campaign tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingData {
    /// Campaign id.
    pub campaign_id: String,
    /// Tier name.
    pub ticket_type: String,
    /// Seats.
    pub quantity: u32,
    /// Issuance mode.
    pub issuance_type: IssuanceType,
}

impl Validate for CreateBookingData {
    fn validate(&self) -> Result<(), ValidationError> {
        Rules::new()
            .required("campaignId", &self.campaign_id, "Campaign is required")
            .required("ticketType", &self.ticket_type, "Ticket type is required")
            .check(self.quantity >= 1, "quantity", "Quantity must be at least 1")
            .finish()
    }
}

/// Default currency for payments.
pub const DEFAULT_CURRENCY: &str = "UGX";

/// Start a gateway payment for a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentData {
    /// Booking to pay for.
    pub booking_id: String,
    /// ISO currency code; [`DEFAULT_CURRENCY`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl InitializePaymentData {
    /// Copy with the currency defaulted.
    #[must_use]
    pub fn with_default_currency(mut self) -> Self {
        if self.currency.as_deref().is_none_or(str::is_empty) {
            self.currency = Some(DEFAULT_CURRENCY.to_string());
        }
        self
    }
}

impl Validate for InitializePaymentData {
    fn validate(&self) -> Result<(), ValidationError> {
        Rules::new()
            .required("bookingId", &self.booking_id, "Booking is required")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════
// Finance
// ═══════════════════════════════════════════════════════════

/// Register a payout method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWithdrawalMethodData {
    /// Payout rail.
    pub method: WithdrawalMethodKind,
    /// Account holder.
    pub account_name: String,
    /// Bank account number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Bank name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Bank routing code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    /// Mobile money operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_provider: Option<String>,
    /// Mobile money number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    /// `PayPal` login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paypal_email: Option<String>,
    /// Make this the default method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_as_default: Option<bool>,
}

impl Validate for AddWithdrawalMethodData {
    fn validate(&self) -> Result<(), ValidationError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        let rules = Rules::new().min_chars(
            "accountName",
            &self.account_name,
            2,
            "Account name is required",
        );
        match self.method {
            WithdrawalMethodKind::BankAccount => rules
                .check(
                    self.account_number.as_deref().is_some_and(|n| n.len() >= 5),
                    "accountNumber",
                    "Account number is required",
                )
                .check(present(&self.bank_name), "bankName", "Bank name is required"),
            WithdrawalMethodKind::MobileMoney => rules
                .check(
                    present(&self.mobile_provider),
                    "mobileProvider",
                    "Mobile provider is required",
                )
                .check(
                    self.mobile_number.as_deref().is_some_and(|n| n.len() >= 10),
                    "mobileNumber",
                    "Mobile number must be at least 10 characters",
                ),
            WithdrawalMethodKind::Paypal => rules.check(
                self.paypal_email.as_deref().is_some_and(crate::validation::is_email),
                "paypalEmail",
                "Invalid email address",
            ),
        }
        .finish()
    }
}

/// Withdraw earnings to a registered method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWithdrawalData {
    /// Amount to withdraw.
    pub amount: f64,
    /// Destination method id.
    pub method_id: String,
}

impl Validate for RequestWithdrawalData {
    fn validate(&self) -> Result<(), ValidationError> {
        Rules::new()
            .check(
                self.amount.is_finite() && self.amount > 0.0,
                "amount",
                "Amount must be greater than 0",
            )
            .required("methodId", &self.method_id, "Withdrawal method is required")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn register() -> RegisterData {
        RegisterData {
            email: "fan@example.com".to_string(),
            password: "Secret123".to_string(),
            confirm_password: "Secret123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Okello".to_string(),
            phone: None,
            date_of_birth: None,
            role: None,
            terms: true,
        }
    }

    fn business() -> SellerApplicationData {
        SellerApplicationData {
            business_name: "Nile Nights".to_string(),
            business_type: BusinessType::Company,
            business_address: "Plot 4, Jinja Road".to_string(),
            business_phone: "+256700000000".to_string(),
            business_email: "events@nile.example".to_string(),
            tax_id: None,
            business_documents: None,
            description: None,
            website_url: Some(String::new()),
            social_media_handles: None,
        }
    }

    #[test]
    fn test_login_rules() {
        assert!(LoginCredentials::new("fan@example.com", "secret").validate().is_ok());
        let err = LoginCredentials::new("fan", "123").validate().unwrap_err();
        assert_eq!(err.errors().len(), 2);
        assert_eq!(
            err.message_for("password"),
            Some("Password must be at least 6 characters")
        );
    }

    #[test]
    fn test_register_requires_matching_confirmation_and_terms() {
        assert!(register().validate().is_ok());

        let mut data = register();
        data.confirm_password = "Secret124".to_string();
        data.terms = false;
        let err = data.validate().unwrap_err();
        assert_eq!(err.message_for("confirmPassword"), Some("Passwords don't match"));
        assert_eq!(
            err.message_for("terms"),
            Some("You must accept the terms and conditions")
        );
    }

    #[test]
    fn test_register_never_sends_local_fields() {
        let value = serde_json::to_value(register()).unwrap();
        assert!(value.get("confirmPassword").is_none());
        assert!(value.get("terms").is_none());
        assert_eq!(value["firstName"], "Ada");
    }

    #[test]
    fn test_new_seller_application_flattens_both_parts() {
        let application = NewSellerApplication {
            account: register(),
            business: business(),
        };
        assert!(application.validate().is_ok());
        let value = serde_json::to_value(&application).unwrap();
        assert_eq!(value["email"], "fan@example.com");
        assert_eq!(value["businessType"], "company");
    }

    #[test]
    fn test_seller_application_checks_phone_and_url() {
        let mut data = business();
        data.business_phone = "0700".to_string();
        data.website_url = Some("nile".to_string());
        let err = data.validate().unwrap_err();
        assert_eq!(
            err.message_for("businessPhone"),
            Some("Valid phone number is required")
        );
        assert_eq!(err.message_for("websiteUrl"), Some("Invalid URL"));
    }

    #[test]
    fn test_booking_quantity_must_be_positive() {
        let data = CreateBookingData {
            campaign_id: "c-1".to_string(),
            ticket_type: "VIP".to_string(),
            quantity: 0,
            issuance_type: IssuanceType::Single,
        };
        let err = data.validate().unwrap_err();
        assert_eq!(err.message_for("quantity"), Some("Quantity must be at least 1"));
    }

    #[test]
    fn test_payment_currency_defaults_to_ugx() {
        let data = InitializePaymentData {
            booking_id: "b-1".to_string(),
            currency: None,
        }
        .with_default_currency();
        assert_eq!(data.currency.as_deref(), Some("UGX"));

        let data = InitializePaymentData {
            booking_id: "b-1".to_string(),
            currency: Some("KES".to_string()),
        }
        .with_default_currency();
        assert_eq!(data.currency.as_deref(), Some("KES"));
    }

    #[test]
    fn test_withdrawal_amount_must_be_positive() {
        let data = RequestWithdrawalData {
            amount: 0.0,
            method_id: "m-1".to_string(),
        };
        assert_eq!(
            data.validate().unwrap_err().message_for("amount"),
            Some("Amount must be greater than 0")
        );
    }

    #[test]
    fn test_mobile_money_method_requires_number() {
        let data = AddWithdrawalMethodData {
            method: WithdrawalMethodKind::MobileMoney,
            account_name: "Ada Okello".to_string(),
            account_number: None,
            bank_name: None,
            bank_code: None,
            mobile_provider: Some("MTN".to_string()),
            mobile_number: Some("0700".to_string()),
            paypal_email: None,
            set_as_default: None,
        };
        let err = data.validate().unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].field, "mobileNumber");
    }
}
