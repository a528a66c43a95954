//! Query cache keyed by hierarchical [`QueryKey`]s.
//!
//! Entries are JSON values with a stale time (5 minutes by default).
//! Invalidation marks entries stale instead of deleting them, so a caller
//! can still show the last known value while it refetches. Entries older
//! than the gc time (10 minutes by default) are dropped.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default freshness window.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Default age after which entries are dropped.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(10 * 60);

/// Hierarchical cache key such as `["bookings", "detail", "b-1"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Key from literal segments.
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append a segment.
    #[must_use]
    pub fn with(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Append a filter object as its canonical JSON text.
    ///
    /// Filters that serialize to nothing (all fields unset) add no segment,
    /// so `list(None)` and `list(Some(&Default::default()))` are the same key.
    #[must_use]
    pub fn with_params<P: Serialize>(self, params: Option<&P>) -> Self {
        let encoded = params
            .and_then(|p| serde_json::to_value(p).ok())
            .filter(|v| !is_empty_params(v));
        match encoded {
            Some(value) => self.with(value.to_string()),
            None => self,
        }
    }

    /// Key segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }
}

fn is_empty_params(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Key factory for every cached resource.
pub mod keys {
    use super::QueryKey;
    use boxoffice_core::types::{
        BookingFilters, CampaignFilters, StatusPageFilters, TransactionFilters,
    };

    /// Auth keys.
    pub mod auth {
        use super::QueryKey;

        /// Signed-in user.
        #[must_use]
        pub fn user() -> QueryKey {
            QueryKey::new(["auth", "user"])
        }

        /// Profile of the signed-in user.
        #[must_use]
        pub fn profile() -> QueryKey {
            QueryKey::new(["auth", "profile"])
        }

        /// Seller application status.
        #[must_use]
        pub fn application_status() -> QueryKey {
            QueryKey::new(["auth", "application-status"])
        }

        /// Managers of the signed-in seller.
        #[must_use]
        pub fn managers() -> QueryKey {
            QueryKey::new(["auth", "managers"])
        }
    }

    /// Campaign keys.
    pub mod campaigns {
        use super::{CampaignFilters, QueryKey, StatusPageFilters};

        /// Every campaign query.
        #[must_use]
        pub fn all() -> QueryKey {
            QueryKey::new(["campaigns"])
        }

        /// Public listing.
        #[must_use]
        pub fn list(filters: Option<&CampaignFilters>) -> QueryKey {
            all().with("list").with_params(filters)
        }

        /// One campaign.
        #[must_use]
        pub fn detail(id: &str) -> QueryKey {
            all().with("detail").with(id)
        }

        /// Featured campaigns.
        #[must_use]
        pub fn featured(limit: u32) -> QueryKey {
            all().with("featured").with(limit.to_string())
        }

        /// Search suggestions.
        #[must_use]
        pub fn suggestions(query: &str) -> QueryKey {
            all().with("suggestions").with(query)
        }

        /// Campaigns owned by the signed-in seller.
        #[must_use]
        pub fn seller(filters: Option<&StatusPageFilters>) -> QueryKey {
            all().with("seller").with_params(filters)
        }
    }

    /// Booking keys.
    pub mod bookings {
        use super::{BookingFilters, QueryKey};

        /// Every booking query.
        #[must_use]
        pub fn all() -> QueryKey {
            QueryKey::new(["bookings"])
        }

        /// Booking lists.
        #[must_use]
        pub fn list(filters: Option<&BookingFilters>) -> QueryKey {
            all().with("list").with_params(filters)
        }

        /// Bookings of the signed-in customer.
        #[must_use]
        pub fn mine(filters: Option<&BookingFilters>) -> QueryKey {
            all().with("my-bookings").with_params(filters)
        }

        /// One booking.
        #[must_use]
        pub fn detail(id: &str) -> QueryKey {
            all().with("detail").with(id)
        }

        /// Bookings for one campaign.
        #[must_use]
        pub fn by_campaign(campaign_id: &str) -> QueryKey {
            all().with("by-campaign").with(campaign_id)
        }

        /// Booking statistics for one campaign. Nested under
        /// [`by_campaign`] so invalidating that prefix covers them.
        #[must_use]
        pub fn campaign_stats(campaign_id: &str) -> QueryKey {
            by_campaign(campaign_id).with("stats")
        }
    }

    /// Payment keys.
    pub mod payments {
        use super::{QueryKey, StatusPageFilters};

        /// Every payment query.
        #[must_use]
        pub fn all() -> QueryKey {
            QueryKey::new(["payments"])
        }

        /// Payment history.
        #[must_use]
        pub fn history(filters: Option<&StatusPageFilters>) -> QueryKey {
            all().with("history").with_params(filters)
        }

        /// Verification of one reference.
        #[must_use]
        pub fn verify(reference: &str) -> QueryKey {
            all().with("verify").with(reference)
        }
    }

    /// Finance keys.
    pub mod finance {
        use super::{QueryKey, TransactionFilters};

        /// Every finance query.
        #[must_use]
        pub fn all() -> QueryKey {
            QueryKey::new(["finance"])
        }

        /// Seller finance dashboard.
        #[must_use]
        pub fn dashboard() -> QueryKey {
            all().with("dashboard")
        }

        /// Transaction history.
        #[must_use]
        pub fn transactions(filters: Option<&TransactionFilters>) -> QueryKey {
            all().with("transactions").with_params(filters)
        }

        /// Withdrawal requests, optionally by status.
        #[must_use]
        pub fn withdrawals(status: Option<&str>) -> QueryKey {
            let key = all().with("withdrawals");
            match status {
                Some(status) => key.with(status),
                None => key,
            }
        }

        /// Earnings analytics.
        #[must_use]
        pub fn analytics(period: Option<&str>, group_by: Option<&str>) -> QueryKey {
            all()
                .with("analytics")
                .with(period.unwrap_or("month"))
                .with(group_by.unwrap_or("day"))
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    updated_at: Instant,
    invalidated: bool,
}

impl Entry {
    fn is_collectable(&self, gc_time: Duration) -> bool {
        self.updated_at.elapsed() >= gc_time
    }
}

/// In-memory query cache.
#[derive(Debug)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    stale_time: Duration,
    gc_time: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    /// Cache with the given freshness window and the default gc time.
    #[must_use]
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_time,
            gc_time: DEFAULT_GC_TIME.max(stale_time),
        }
    }

    /// Replace the gc time. It never drops below the stale time.
    #[must_use]
    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time.max(self.stale_time);
        self
    }

    /// Freshness window.
    #[must_use]
    pub const fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Age after which entries are dropped.
    #[must_use]
    pub const fn gc_time(&self) -> Duration {
        self.gc_time
    }

    /// Fresh value for `key`.
    pub async fn get(&self, key: &QueryKey) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| !e.invalidated && e.updated_at.elapsed() < self.stale_time)
            .map(|e| e.value.clone())
    }

    /// Fresh value decoded as `T`. A value of another shape is a miss.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Last stored value, fresh or not, until it is collected.
    pub async fn peek(&self, key: &QueryKey) -> Option<Value> {
        self.entries
            .read()
            .await
            .get(key)
            .filter(|e| !e.is_collectable(self.gc_time))
            .map(|e| e.value.clone())
    }

    /// Store `value` under `key`, dropping collectable entries first.
    pub async fn set(&self, key: QueryKey, value: Value) {
        let mut entries = self.entries.write().await;
        Self::collect(&mut entries, self.gc_time);
        entries.insert(
            key,
            Entry {
                value,
                updated_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Serialize and store `value`. Values that fail to serialize are skipped.
    pub async fn set_as<T: Serialize>(&self, key: QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => self.set(key, json).await,
            Err(e) => tracing::warn!(key = %key, error = %e, "Could not cache value"),
        }
    }

    /// Mark exactly `key` stale. Returns whether it was cached.
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                true
            }
            None => false,
        }
    }

    /// Mark `prefix` and every key under it stale. Returns how many matched.
    pub async fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().await;
        let mut matched = 0;
        for (key, entry) in entries.iter_mut() {
            if prefix.is_prefix_of(key) {
                entry.invalidated = true;
                matched += 1;
            }
        }
        tracing::trace!(prefix = %prefix, matched, "Invalidated queries");
        matched
    }

    /// Drop entries older than the gc time. Returns how many went.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.write().await;
        Self::collect(&mut entries, self.gc_time)
    }

    fn collect(entries: &mut HashMap<QueryKey, Entry>, gc_time: Duration) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_collectable(gc_time));
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::trace!(dropped, "Collected old queries");
        }
        dropped
    }

    /// Drop everything.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "Query cache cleared");
    }

    /// Number of stored entries, fresh or not, including any not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::types::{BookingFilters, BookingStatus};
    use serde_json::json;

    #[test]
    fn test_empty_filters_add_no_segment() {
        assert_eq!(keys::bookings::list(None), QueryKey::new(["bookings", "list"]));
        assert_eq!(
            keys::bookings::list(Some(&BookingFilters::default())),
            keys::bookings::list(None)
        );
        let filtered = keys::bookings::list(Some(&BookingFilters {
            status: Some(BookingStatus::Confirmed),
            ..BookingFilters::default()
        }));
        assert_eq!(filtered.segments().len(), 3);
        assert!(keys::bookings::list(None).is_prefix_of(&filtered));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_go_stale() {
        let cache = QueryCache::default();
        let key = keys::campaigns::detail("c-1");
        cache.set(key.clone(), json!({"title": "Blankets & Wine"})).await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::advance(DEFAULT_STALE_TIME).await;
        assert!(cache.get(&key).await.is_none());
        assert!(cache.peek(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_prefix_invalidation_spares_siblings() {
        let cache = QueryCache::default();
        let booking = keys::bookings::detail("b-1");
        let campaign = keys::campaigns::detail("c-1");
        cache.set(booking.clone(), json!(1)).await;
        cache.set(keys::bookings::mine(None), json!([])).await;
        cache.set(campaign.clone(), json!(2)).await;

        assert_eq!(cache.invalidate_prefix(&keys::bookings::all()).await, 2);
        assert!(cache.get(&booking).await.is_none());
        assert_eq!(cache.get(&campaign).await, Some(json!(2)));

        cache.set(booking.clone(), json!(3)).await;
        assert_eq!(cache.get(&booking).await, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_clear_and_typed_access() {
        let cache = QueryCache::default();
        cache.set_as(keys::auth::profile(), &vec!["a", "b"]).await;
        let decoded: Option<Vec<String>> = cache.get_as(&keys::auth::profile()).await;
        assert_eq!(decoded, Some(vec!["a".to_string(), "b".to_string()]));
        let wrong: Option<u32> = cache.get_as(&keys::auth::profile()).await;
        assert!(wrong.is_none());

        assert!(!cache.invalidate(&keys::auth::user()).await);
        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_entries_are_collected() {
        let cache = QueryCache::default();
        let old = keys::campaigns::suggestions("nile");
        cache.set(old.clone(), json!(["Nile Nights"])).await;

        tokio::time::advance(DEFAULT_STALE_TIME).await;
        assert!(cache.peek(&old).await.is_some());

        tokio::time::advance(DEFAULT_GC_TIME - DEFAULT_STALE_TIME).await;
        assert!(cache.peek(&old).await.is_none());

        cache.set(keys::campaigns::suggestions("jazz"), json!([])).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.sweep().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_and_gc_time_floor() {
        let cache = QueryCache::new(Duration::from_secs(60)).with_gc_time(Duration::from_secs(1));
        assert_eq!(cache.gc_time(), Duration::from_secs(60));

        cache.set(keys::auth::profile(), json!({})).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.sweep().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_campaign_stats_follow_by_campaign() {
        let cache = QueryCache::default();
        let stats = keys::bookings::campaign_stats("c-1");
        cache.set(stats.clone(), json!({"sold": 4})).await;
        cache.set(keys::bookings::campaign_stats("c-2"), json!({"sold": 1})).await;

        assert_eq!(cache.invalidate_prefix(&keys::bookings::by_campaign("c-1")).await, 1);
        assert!(cache.get(&stats).await.is_none());
        assert!(cache.get(&keys::bookings::campaign_stats("c-2")).await.is_some());
    }
}
