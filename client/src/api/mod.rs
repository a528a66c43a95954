//! Endpoint groups.
//!
//! Each group borrows an [`ApiClient`] and maps one area of the REST API to
//! typed calls. Payloads carrying user input are validated before they are
//! sent; reads go through the query cache and writes invalidate what they
//! change.

pub mod auth;
pub mod bookings;
pub mod campaigns;
pub mod finance;
pub mod payments;

use crate::http::ApiClient;

pub use auth::{AuthApi, Landing};
pub use bookings::BookingsApi;
pub use campaigns::CampaignsApi;
pub use finance::FinanceApi;
pub use payments::PaymentsApi;

impl ApiClient {
    /// Authentication, seller applications and managers.
    #[must_use]
    pub const fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Campaigns.
    #[must_use]
    pub const fn campaigns(&self) -> CampaignsApi<'_> {
        CampaignsApi::new(self)
    }

    /// Bookings.
    #[must_use]
    pub const fn bookings(&self) -> BookingsApi<'_> {
        BookingsApi::new(self)
    }

    /// Payments.
    #[must_use]
    pub const fn payments(&self) -> PaymentsApi<'_> {
        PaymentsApi::new(self)
    }

    /// Seller finance.
    #[must_use]
    pub const fn finance(&self) -> FinanceApi<'_> {
        FinanceApi::new(self)
    }
}
