//! Domain types exchanged with the marketplace API.
//!
//! These mirror the server's JSON shapes: camelCase field names and
//! SCREAMING_SNAKE_CASE enum values. Timestamps are RFC 3339 on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════
// Users
// ═══════════════════════════════════════════════════════════

/// Role of an account on the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Buys tickets.
    Customer,
    /// Runs campaigns and withdraws earnings.
    Seller,
    /// Acts on behalf of a seller.
    Manager,
    /// Platform administrator.
    SuperAdmin,
}

/// Review state of a seller application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// Waiting for review.
    Pending,
    /// Seller account granted.
    Approved,
    /// Application turned down.
    Rejected,
}

/// Aggregate counters attached to a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserCounts {
    /// Number of bookings made.
    pub bookings: u64,
    /// Number of campaigns owned.
    pub campaigns: u64,
}

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account id (some endpoints send it as `_id`).
    #[serde(alias = "_id")]
    pub id: String,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Date of birth as entered (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    /// Account role.
    pub role: UserRole,
    /// Seller application state, if the user applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_status: Option<ApplicationStatus>,
    /// Whether the account is enabled.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Aggregate counters.
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<UserCounts>,
}

const fn default_true() -> bool {
    true
}

impl User {
    /// Display name, `"First Last"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether this account owns a seller console.
    #[must_use]
    pub const fn is_seller(&self) -> bool {
        matches!(self.role, UserRole::Seller)
    }
}

/// Lifecycle of a seller's team manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagerStatus {
    /// Accepted the invitation and enabled.
    Active,
    /// Deactivated by the seller.
    Inactive,
    /// Invitation sent, not yet accepted.
    PendingInvite,
    /// Invitation lapsed.
    InviteExpired,
}

/// A team manager acting for a seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    /// Manager id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Whether the manager can act.
    pub is_active: bool,
    /// Invitation/activation state.
    pub status: ManagerStatus,
    /// Granted permission names.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Last activity.
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// When a pending invitation lapses.
    #[serde(default)]
    pub invitation_expiry: Option<DateTime<Utc>>,
}

// ═══════════════════════════════════════════════════════════
// Campaigns
// ═══════════════════════════════════════════════════════════

/// Kind of event a campaign sells tickets for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Live music.
    Concert,
    /// Sporting event.
    Sports,
    /// Stage performance.
    Theater,
    /// Conference or summit.
    Conference,
    /// Multi-day festival.
    Festival,
    /// Bar night.
    Bar,
    /// Hotel package.
    Hotel,
    /// Anything else.
    Other,
}

/// Publication state of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    /// Not yet published.
    Draft,
    /// On sale.
    Active,
    /// Sales suspended.
    Paused,
    /// Event over.
    Ended,
    /// Called off.
    Cancelled,
}

impl CampaignStatus {
    /// Wire name, as used in query strings and status updates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Ended => "ENDED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// A ticket tier within a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    /// Unit price in the campaign currency.
    pub price: f64,
    /// Tickets available in this tier.
    pub quantity: u32,
    /// Tickets sold so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold: Option<u32>,
    /// Tier description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Per-order cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_order: Option<u32>,
    /// Perks included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
}

impl TicketType {
    /// Tickets still on sale in this tier.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.quantity.saturating_sub(self.sold.unwrap_or(0))
    }
}

/// Seller summary embedded in a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSeller {
    /// Seller id.
    pub id: String,
    /// Trading name.
    pub business_name: String,
}

/// View and booking counters for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignAnalytics {
    /// Page views.
    pub total_views: u64,
    /// Bookings placed.
    pub total_bookings: u64,
}

/// A ticketed event listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Campaign id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Long description.
    pub description: String,
    /// Kind of event.
    pub event_type: EventType,
    /// Tiers keyed by tier name.
    pub ticket_types: HashMap<String, TicketType>,
    /// Capacity across tiers.
    pub total_quantity: u32,
    /// Sold across tiers.
    pub sold_quantity: u32,
    /// Per-customer cap.
    pub max_per_customer: u32,
    /// When the event happens.
    pub event_date: DateTime<Utc>,
    /// Sales open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Sales close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Venue name.
    pub venue: String,
    /// Street address.
    pub venue_address: String,
    /// City.
    pub venue_city: String,
    /// Country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_country: Option<String>,
    /// Banner image URL.
    pub cover_image: String,
    /// Gallery image URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Publication state.
    pub status: CampaignStatus,
    /// Whether tickets can be scanned more than once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_multi_scan: Option<bool>,
    /// Scan cap per ticket when multi-scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scans_per_ticket: Option<u32>,
    /// Search tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Free-form seller metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Owning seller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<CampaignSeller>,
    /// Counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<CampaignAnalytics>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Tickets still on sale across all tiers.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.total_quantity.saturating_sub(self.sold_quantity)
    }

    /// Cheapest tier price, if any tiers exist.
    #[must_use]
    pub fn lowest_price(&self) -> Option<f64> {
        self.ticket_types
            .values()
            .map(|tier| tier.price)
            .min_by(f64::total_cmp)
    }
}

// ═══════════════════════════════════════════════════════════
// Bookings and tickets
// ═══════════════════════════════════════════════════════════

/// Booking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Awaiting payment.
    Pending,
    /// Paid and tickets issued.
    Confirmed,
    /// Cancelled by the customer or seller.
    Cancelled,
    /// Payment deadline passed.
    Expired,
}

impl BookingStatus {
    /// Wire name, as used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }
}

/// How tickets for a multi-seat booking are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuanceType {
    /// One ticket admitting the whole party.
    Single,
    /// One ticket per seat.
    Separate,
}

/// Campaign summary embedded in a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCampaign {
    /// Campaign id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Event time.
    pub event_date: DateTime<Utc>,
    /// Venue name.
    pub venue: String,
    /// Banner image URL.
    pub cover_image: String,
}

/// Payment summary embedded in a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayment {
    /// Payment id.
    pub id: String,
    /// Provider status string.
    pub status: String,
    /// Charged amount.
    pub amount: f64,
    /// Payment method, when known.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Provider reference.
    #[serde(default)]
    pub reference: Option<String>,
}

/// A reservation of tickets for one campaign tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking id.
    pub id: String,
    /// Human-facing reference.
    pub booking_ref: String,
    /// Lifecycle state.
    pub status: BookingStatus,
    /// Seats booked.
    pub quantity: u32,
    /// Tier name.
    pub ticket_type: String,
    /// Issuance mode.
    pub issuance_type: IssuanceType,
    /// Amount due.
    pub total_amount: f64,
    /// Pay-by time for pending bookings.
    #[serde(default)]
    pub payment_deadline: Option<DateTime<Utc>>,
    /// Campaign summary.
    pub campaign: BookingCampaign,
    /// Payment summary.
    #[serde(default)]
    pub payment: Option<BookingPayment>,
    /// Issued tickets.
    #[serde(default)]
    pub tickets: Option<Vec<Ticket>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Ticket validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Can be scanned.
    Valid,
    /// Scan budget consumed.
    Used,
    /// Event passed.
    Expired,
    /// Booking cancelled.
    Cancelled,
}

/// An issued admission ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket id.
    pub id: String,
    /// Printed number.
    pub ticket_number: String,
    /// QR payload.
    pub qr_code: String,
    /// Downloadable PDF.
    #[serde(default)]
    pub pdf_url: Option<String>,
    /// Validity.
    pub status: TicketStatus,
    /// Scans so far.
    pub scan_count: u32,
    /// Scan budget.
    pub max_scans: u32,
    /// Parent booking.
    pub booking_id: String,
    /// Issue time.
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════
// Payments
// ═══════════════════════════════════════════════════════════

/// Payment state reported by the server.
///
/// Older gateway callbacks report `completed`; it is accepted as an alias of
/// `SUCCESS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting settlement.
    #[serde(alias = "pending")]
    Pending,
    /// Settled.
    #[serde(alias = "completed", alias = "COMPLETED", alias = "success")]
    Success,
    /// Declined or errored.
    #[serde(alias = "failed")]
    Failed,
    /// Returned to the customer.
    #[serde(alias = "refunded")]
    Refunded,
}

/// Booking summary embedded in a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBooking {
    /// Booking id.
    pub id: String,
    /// Booking reference.
    pub booking_ref: String,
    /// Campaign headline.
    #[serde(default)]
    pub campaign: Option<PaymentCampaign>,
}

/// Campaign headline embedded in a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCampaign {
    /// Headline.
    pub title: String,
}

/// A payment attempt for a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Payment id.
    pub id: String,
    /// Gateway merchant reference.
    pub reference: String,
    /// Charged amount.
    pub amount: f64,
    /// ISO currency code.
    pub currency: String,
    /// Settlement state.
    pub status: PaymentStatus,
    /// Payment method, when known.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Booking summary.
    #[serde(default)]
    pub booking: Option<PaymentBooking>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Gateway redirect returned when a payment is initialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitialization {
    /// Payment id.
    pub payment_id: String,
    /// URL the customer must be sent to.
    pub payment_link: String,
    /// Merchant reference the callback will carry.
    pub reference: String,
    /// Amount to charge.
    pub amount: f64,
    /// ISO currency code.
    pub currency: String,
}

// ═══════════════════════════════════════════════════════════
// Finance
// ═══════════════════════════════════════════════════════════

/// Withdrawal processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    /// Requested.
    Pending,
    /// In flight with the bank/provider.
    Processing,
    /// Paid out.
    Completed,
    /// Rejected.
    Failed,
}

/// Payout rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalMethodKind {
    /// Bank transfer.
    BankAccount,
    /// Mobile money wallet.
    MobileMoney,
    /// `PayPal` account.
    Paypal,
}

/// Verification state of a payout method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodVerification {
    /// Awaiting verification.
    Pending,
    /// Usable for withdrawals.
    Verified,
}

/// Ledger entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Ticket sale credited.
    Sale,
    /// Payout debited.
    Withdrawal,
    /// Refund debited.
    Refund,
    /// Platform fee debited.
    Fee,
}

/// A seller's registered payout method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalMethod {
    /// Method id.
    pub id: String,
    /// Payout rail.
    pub method: WithdrawalMethodKind,
    /// Account holder.
    pub account_name: String,
    /// Bank account number.
    #[serde(default)]
    pub account_number: Option<String>,
    /// Bank name.
    #[serde(default)]
    pub bank_name: Option<String>,
    /// Bank routing code.
    #[serde(default)]
    pub bank_code: Option<String>,
    /// Mobile money operator.
    #[serde(default)]
    pub mobile_provider: Option<String>,
    /// Mobile money number.
    #[serde(default)]
    pub mobile_number: Option<String>,
    /// `PayPal` login.
    #[serde(default)]
    pub paypal_email: Option<String>,
    /// Used when no method is specified.
    pub is_default: bool,
    /// Verification state.
    pub status: MethodVerification,
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Entry id.
    pub id: String,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Signed amount.
    pub amount: f64,
    /// External reference.
    pub reference: String,
    /// Description.
    pub description: String,
    /// Booking time.
    pub date: DateTime<Utc>,
}

/// A payout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    /// Withdrawal id.
    pub id: String,
    /// Requested amount.
    pub amount: f64,
    /// Processing fee.
    #[serde(default)]
    pub fee: Option<f64>,
    /// Amount after fees.
    #[serde(default)]
    pub net_amount: Option<f64>,
    /// Processing state.
    pub status: WithdrawalStatus,
    /// Destination.
    pub method: WithdrawalMethod,
    /// Request time.
    pub requested_date: DateTime<Utc>,
    /// Completion time.
    #[serde(default)]
    pub processed_date: Option<DateTime<Utc>>,
}

/// Balance summary for a seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    /// Lifetime earnings.
    pub total_earnings: f64,
    /// Settled and withdrawable.
    pub available_balance: f64,
    /// Not yet settled.
    pub pending_balance: f64,
    /// Paid out so far.
    pub withdrawn_amount: f64,
    /// Withdrawable after holds.
    #[serde(default)]
    pub available_for_withdrawal: Option<f64>,
    /// Tax estimate.
    #[serde(default)]
    pub estimated_taxes: Option<f64>,
    /// Next scheduled payout.
    #[serde(default)]
    pub next_payout_date: Option<DateTime<Utc>>,
}

/// Seller finance overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceDashboard {
    /// Balances.
    pub finance: FinanceSummary,
    /// Recent ledger entries.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Registered payout methods.
    #[serde(default)]
    pub withdrawal_methods: Vec<WithdrawalMethod>,
}

// ═══════════════════════════════════════════════════════════
// Listing filters
// ═══════════════════════════════════════════════════════════

/// Sort key for campaign listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CampaignSort {
    /// By event date.
    EventDate,
    /// By creation time.
    CreatedAt,
    /// By lowest price.
    Price,
    /// By bookings.
    Popularity,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Public campaign search filters. Sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignFilters {
    /// Free-text search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Event kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    /// Venue city.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Minimum tier price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    /// Maximum tier price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    /// Earliest event date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// Latest event date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    /// Comma-separated tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Sort key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<CampaignSort>,
    /// Sort direction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    /// 1-based page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Filters for a seller's own campaigns and for payment history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPageFilters {
    /// Status wire name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// 1-based page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Filters for a customer's bookings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilters {
    /// Lifecycle state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    /// Restrict to one campaign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    /// 1-based page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Filters for the seller ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilters {
    /// Entry kind wire name.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Range start (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Range end (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_underscore_id() {
        let json = r#"{
            "_id": "u-1",
            "email": "a@b.co",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "role": "SELLER",
            "isActive": true,
            "createdAt": "2025-01-01T00:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u-1");
        assert!(user.is_seller());
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_payment_status_accepts_legacy_completed() {
        let status: PaymentStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, PaymentStatus::Success);
        let status: PaymentStatus = serde_json::from_str("\"SUCCESS\"").unwrap();
        assert_eq!(status, PaymentStatus::Success);
    }

    #[test]
    fn test_ticket_type_remaining_never_underflows() {
        let tier = TicketType {
            price: 10.0,
            quantity: 5,
            sold: Some(9),
            description: None,
            max_per_order: None,
            benefits: None,
        };
        assert_eq!(tier.remaining(), 0);
    }

    #[test]
    fn test_campaign_filters_skip_empty_fields() {
        let filters = CampaignFilters {
            city: Some("Kampala".to_string()),
            sort_by: Some(CampaignSort::EventDate),
            ..CampaignFilters::default()
        };
        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "city": "Kampala", "sortBy": "eventDate" })
        );
    }

    #[test]
    fn test_transaction_kind_uses_type_key() {
        let json = r#"{
            "id": "t1", "type": "SALE", "amount": 5000.0,
            "reference": "R1", "description": "VIP", "date": "2025-02-01T10:00:00Z"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.kind, TransactionType::Sale);
    }
}
