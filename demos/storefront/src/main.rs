//! Storefront Demo - a long-running marketplace session
//!
//! Signs in, lists featured campaigns and keeps the session alive in the
//! background until interrupted. Session events (refreshes, expiry) are
//! logged as they happen.
//!
//! # Running the Example
//!
//! ```bash
//! export BOXOFFICE_API_URL=http://localhost:5000/api
//! export STOREFRONT_EMAIL=amina@example.com
//! export STOREFRONT_PASSWORD=secret123
//! cargo run -p storefront
//! ```
//!
//! Without credentials the demo only browses. A `.env` file is read if
//! present.

#![allow(missing_docs)]

use boxoffice_client::{ApiClient, ClientConfig};
use boxoffice_core::format::{format_currency, long_date};
use boxoffice_core::requests::LoginCredentials;
use boxoffice_runtime::metrics::MetricsRecorder;
use boxoffice_runtime::{SessionEvent, SessionManager};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and tracing
    let _ = dotenvy::dotenv();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,boxoffice_runtime=debug,storefront=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics = MetricsRecorder::install()?;

    // 2. Client and session manager share one context
    let config = ClientConfig::from_env()?;
    tracing::info!(api_url = %config.api_url, "Starting storefront");

    // Persists auth state under BOXOFFICE_AUTH_STORAGE when set
    let client = ApiClient::new(&config)?;
    let context = Arc::clone(client.context());
    context.store().hydrate().await;
    let manager = SessionManager::new(Arc::new(client.clone()), Arc::clone(&context), config.session);

    let mut events = context.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::Expired { redirect } => {
                    tracing::warn!(%redirect, "Session expired, please sign in again");
                }
                other => tracing::info!(event = ?other, "Session event"),
            }
        }
    });

    // 3. Sign in when credentials are configured
    let credentials = std::env::var("STOREFRONT_EMAIL")
        .ok()
        .zip(std::env::var("STOREFRONT_PASSWORD").ok())
        .map(|(email, password)| LoginCredentials::new(email, password));

    if let Some(credentials) = credentials {
        let landing = client.auth().sign_in(&credentials).await?;
        tracing::info!(route = landing.route, "Signed in");
    }
    let status = manager.start(context.store().user()).await;
    tracing::info!(active = status.active, "Session manager started");

    // 4. Browse
    for campaign in client.campaigns().featured(None).await? {
        let from = campaign
            .ticket_types
            .values()
            .map(|tier| tier.price)
            .fold(None, |min: Option<f64>, price| Some(min.map_or(price, |m| m.min(price))));
        println!(
            "{:<40} {:<24} {:>14}  {}",
            campaign.title,
            campaign.venue,
            from.map_or_else(|| "-".to_string(), |p| format_currency(p, None)),
            long_date(&campaign.event_date),
        );
    }

    // 5. Stay alive until interrupted
    tracing::info!("Session running, press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;

    manager.stop().await;
    if let Some(rendered) = metrics.render() {
        tracing::debug!("Final metrics:\n{rendered}");
    }
    tracing::info!("Storefront stopped");
    Ok(())
}
