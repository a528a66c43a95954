//! Sample marketplace records.
//!
//! Every fixture is built from fixed values so tests can compare whole
//! records. [`envelope`] wraps a fixture the way the server does.

use boxoffice_core::types::{
    Booking, BookingCampaign, BookingStatus, Campaign, CampaignSeller, CampaignStatus, EventType,
    IssuanceType, Payment, PaymentBooking, PaymentCampaign, PaymentStatus, TicketType, User,
    UserRole,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use std::collections::HashMap;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .unwrap_or_default()
}

fn user(id: &str, email: &str, first: &str, last: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        phone: Some("+256700123456".to_string()),
        date_of_birth: None,
        profile_picture: None,
        role,
        application_status: None,
        is_active: true,
        created_at: at(2024, 11, 2, 9),
        updated_at: None,
        counts: None,
    }
}

/// A customer account.
#[must_use]
pub fn customer() -> User {
    user(
        "usr_customer_1",
        "amina@example.com",
        "Amina",
        "Nakato",
        UserRole::Customer,
    )
}

/// A second customer account.
#[must_use]
pub fn other_customer() -> User {
    user(
        "usr_customer_2",
        "brian@example.com",
        "Brian",
        "Okello",
        UserRole::Customer,
    )
}

/// A seller account.
#[must_use]
pub fn seller() -> User {
    user(
        "usr_seller_1",
        "events@nilenights.example",
        "Joseph",
        "Mugisha",
        UserRole::Seller,
    )
}

/// An active concert campaign with two tiers.
#[must_use]
pub fn campaign() -> Campaign {
    let mut tiers = HashMap::new();
    tiers.insert(
        "Regular".to_string(),
        TicketType {
            price: 50_000.0,
            quantity: 400,
            sold: Some(120),
            description: None,
            max_per_order: Some(6),
            benefits: None,
        },
    );
    tiers.insert(
        "VIP".to_string(),
        TicketType {
            price: 150_000.0,
            quantity: 100,
            sold: Some(40),
            description: Some("Front stage".to_string()),
            max_per_order: Some(4),
            benefits: Some(vec!["Lounge access".to_string()]),
        },
    );
    Campaign {
        id: "cmp_1".to_string(),
        title: "Nile Nights Live".to_string(),
        description: "An evening of live music by the river".to_string(),
        event_type: EventType::Concert,
        ticket_types: tiers,
        total_quantity: 500,
        sold_quantity: 160,
        max_per_customer: 10,
        event_date: at(2025, 6, 21, 18),
        start_date: Some(at(2025, 3, 1, 8)),
        end_date: Some(at(2025, 6, 21, 17)),
        venue: "Source of the Nile Gardens".to_string(),
        venue_address: "Plot 4, Nile Crescent".to_string(),
        venue_city: "Jinja".to_string(),
        venue_country: Some("Uganda".to_string()),
        cover_image: "https://cdn.example.com/nile-nights.jpg".to_string(),
        images: None,
        status: CampaignStatus::Active,
        is_multi_scan: Some(false),
        max_scans_per_ticket: None,
        tags: Some(vec!["music".to_string(), "outdoor".to_string()]),
        metadata: None,
        seller: Some(CampaignSeller {
            id: seller().id,
            business_name: "Nile Nights".to_string(),
        }),
        analytics: None,
        created_at: at(2025, 2, 10, 12),
        updated_at: None,
    }
}

/// A pending booking for two regular tickets of [`campaign`].
#[must_use]
pub fn booking() -> Booking {
    let campaign = campaign();
    Booking {
        id: "bkg_1".to_string(),
        booking_ref: "bk-7f3a21".to_string(),
        status: BookingStatus::Pending,
        quantity: 2,
        ticket_type: "Regular".to_string(),
        issuance_type: IssuanceType::Separate,
        total_amount: 100_000.0,
        payment_deadline: Some(at(2025, 3, 15, 12)),
        campaign: BookingCampaign {
            id: campaign.id,
            title: campaign.title,
            event_date: campaign.event_date,
            venue: campaign.venue,
            cover_image: campaign.cover_image,
        },
        payment: None,
        tickets: None,
        created_at: at(2025, 3, 15, 11),
        updated_at: None,
    }
}

/// A payment for [`booking`] in the given state.
#[must_use]
pub fn payment(status: PaymentStatus) -> Payment {
    let booking = booking();
    Payment {
        id: "pay_1".to_string(),
        reference: "ORD-20250315-0001".to_string(),
        amount: booking.total_amount,
        currency: "UGX".to_string(),
        status,
        payment_method: Some("MOBILE_MONEY".to_string()),
        booking: Some(PaymentBooking {
            id: booking.id,
            booking_ref: booking.booking_ref,
            campaign: Some(PaymentCampaign {
                title: booking.campaign.title,
            }),
        }),
        created_at: at(2025, 3, 15, 11),
    }
}

/// Any fixture as JSON.
#[must_use]
pub fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// `{"success": true, "data": data}`.
#[must_use]
pub fn envelope(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

/// Error envelope with a message.
#[must_use]
pub fn error_envelope(message: &str) -> Value {
    json!({ "success": false, "status": "fail", "message": message })
}
