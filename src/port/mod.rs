//! Collaborator interfaces the orchestrator drives (SPEC_FULL.md §6):
//! `Extractor`, `Store`, `Cache`, `Clock`. Any backing technology
//! satisfies these; one in-memory implementation of each ships so the
//! crate runs with no external infrastructure, mirroring the teacher's
//! `testkit`/in-memory test-double convention.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::domain::{ArbitrageOpportunity, NormalizedMarket, PipelineExecution, RawMarket, Venue};
use crate::error::Result;

/// Fetches raw, venue-opaque market records (§6 "Extractor interface").
/// The pipeline does not specify transport — an HTTP client, a file
/// fixture, and a test stub all implement this the same way.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn fetch_markets(&self, venue: Venue, max: Option<usize>) -> Result<Vec<RawMarket>>;
}

/// Durable persistence for pipeline outputs (§6 "Store interface"). Every
/// method is idempotent on its primary key so a retried write never
/// double-counts.
#[async_trait]
pub trait Store: Send + Sync {
    async fn put_markets(&self, batch: &[NormalizedMarket]) -> Result<()>;
    async fn put_opportunities(&self, batch: &[ArbitrageOpportunity]) -> Result<()>;
    async fn put_execution(&self, record: &PipelineExecution) -> Result<()>;

    async fn get_markets(&self) -> Result<Vec<NormalizedMarket>>;
    async fn get_opportunities(&self) -> Result<Vec<ArbitrageOpportunity>>;
    async fn get_executions(&self) -> Result<Vec<PipelineExecution>>;
}

/// A generic key-value cache with TTL eviction (§6 "Cache interface").
/// [`crate::llm::EvaluationCache`] is the LLM-specific specialization of
/// this same shape; this trait is for callers that want to swap in a
/// different backing cache (e.g. Redis) without touching stage E.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: String, value: String, ttl_secs: u64);
    fn delete_expired(&self) -> usize;
}

/// The only source of "now" a stage may consult (§6 "Clock interface") —
/// threading every timestamp through one seam keeps funnel runs
/// reproducible in tests. Stage functions still take `now` as a plain
/// parameter rather than a `&dyn Clock`; the orchestrator is the single
/// caller of `Clock::now`, and it stamps every stage with the same
/// instant for one run.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real-time clock used outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A fixed or steppable clock for deterministic tests, grounded on the
/// same fixed-instant convention `testkit::market_at` uses for
/// `close_time` fixtures.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant_millis: std::sync::Arc<AtomicI64>,
}

impl FixedClock {
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { instant_millis: std::sync::Arc::new(AtomicI64::new(at.timestamp_millis())) }
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.instant_millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.instant_millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Default)]
struct InMemoryTables {
    markets: Vec<NormalizedMarket>,
    opportunities: Vec<ArbitrageOpportunity>,
    executions: Vec<PipelineExecution>,
}

/// An in-process `Store` backed by a mutex-guarded `Vec` per table —
/// enough to exercise the full funnel end to end without a database.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<InMemoryTables>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn put_markets(&self, batch: &[NormalizedMarket]) -> Result<()> {
        let mut tables = self.tables.lock();
        for market in batch {
            tables.markets.retain(|m| m.handle != market.handle);
            tables.markets.push(market.clone());
        }
        Ok(())
    }

    async fn put_opportunities(&self, batch: &[ArbitrageOpportunity]) -> Result<()> {
        let mut tables = self.tables.lock();
        for opportunity in batch {
            tables.opportunities.retain(|o| o.opportunity_id != opportunity.opportunity_id);
            tables.opportunities.push(opportunity.clone());
        }
        Ok(())
    }

    async fn put_execution(&self, record: &PipelineExecution) -> Result<()> {
        let mut tables = self.tables.lock();
        tables.executions.retain(|e| e.execution_id != record.execution_id);
        tables.executions.push(record.clone());
        Ok(())
    }

    async fn get_markets(&self) -> Result<Vec<NormalizedMarket>> {
        Ok(self.tables.lock().markets.clone())
    }

    async fn get_opportunities(&self) -> Result<Vec<ArbitrageOpportunity>> {
        Ok(self.tables.lock().opportunities.clone())
    }

    async fn get_executions(&self) -> Result<Vec<PipelineExecution>> {
        Ok(self.tables.lock().executions.clone())
    }
}

struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// An in-process `Cache` backed by a `DashMap`, the same concurrent-map
/// choice as [`crate::llm::EvaluationCache`] (§5 "shared resources").
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Utc::now() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: String, value: String, ttl_secs: u64) {
        self.entries.insert(
            key,
            CacheEntry { value, expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs as i64) },
        );
    }

    fn delete_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> =
            self.entries.iter().filter(|e| e.expires_at <= now).map(|e| e.key().clone()).collect();
        for key in &expired {
            self.entries.remove(key);
        }
        expired.len()
    }
}

/// A fixture-backed `Extractor` for tests and offline runs: markets are
/// supplied up front, keyed by venue.
#[derive(Default)]
pub struct FixtureExtractor {
    by_venue: HashMap<Venue, Vec<RawMarket>>,
}

impl FixtureExtractor {
    #[must_use]
    pub fn new(markets: Vec<RawMarket>) -> Self {
        let mut by_venue: HashMap<Venue, Vec<RawMarket>> = HashMap::new();
        for market in markets {
            by_venue.entry(market.venue).or_default().push(market);
        }
        Self { by_venue }
    }
}

#[async_trait]
impl Extractor for FixtureExtractor {
    async fn fetch_markets(&self, venue: Venue, max: Option<usize>) -> Result<Vec<RawMarket>> {
        let markets = self.by_venue.get(&venue).cloned().unwrap_or_default();
        Ok(match max {
            Some(limit) => markets.into_iter().take(limit).collect(),
            None => markets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::market;
    use serde_json::json;

    #[tokio::test]
    async fn in_memory_store_put_is_idempotent_on_handle() {
        let store = InMemoryStore::new();
        let m = market(Venue::VenueA, "a1", "t");
        store.put_markets(&[m.clone()]).await.unwrap();
        store.put_markets(&[m]).await.unwrap();
        assert_eq!(store.get_markets().await.unwrap().len(), 1);
    }

    #[test]
    fn in_memory_cache_round_trips_within_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k".to_string(), "v".to_string(), 3600);
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn in_memory_cache_expires_past_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k".to_string(), "v".to_string(), 0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn fixed_clock_advances_deterministically() {
        let start = Utc::now();
        let clock = FixedClock::new(start);
        clock.advance(chrono::Duration::hours(2));
        assert!(clock.now() >= start + chrono::Duration::hours(2));
    }

    #[tokio::test]
    async fn fixture_extractor_filters_by_venue_and_respects_max() {
        let raw = RawMarket {
            venue: Venue::VenueA,
            external_id: "a1".to_string(),
            raw_payload: json!({}),
            fetched_at: Utc::now(),
        };
        let extractor = FixtureExtractor::new(vec![raw]);
        let a = extractor.fetch_markets(Venue::VenueA, None).await.unwrap();
        let b = extractor.fetch_markets(Venue::VenueB, None).await.unwrap();
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
