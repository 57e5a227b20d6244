//! Snapshot cache
//!
//! At most one upstream fetch per currency per TTL window. Entries are never
//! evicted eagerly; staleness is decided at read time. A failed refresh leaves
//! the previous entry untouched.

use crate::contract::parse_snapshot;
use crate::source::OptionChainSource;
use crate::types::Snapshot;
use crate::{MarketDataError, Result};
use chrono::Utc;
use observability::CacheMetrics;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default time-to-live of a cached snapshot
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<Snapshot>,
    fetched_at: Instant,
}

/// Per-currency refresh slot. The mutex serialises upstream fetches and holds
/// the error of the last finished attempt; `attempts` counts finished attempts
/// so a waiter can tell whether one completed while it queued.
#[derive(Default)]
struct RefreshSlot {
    attempts: AtomicU64,
    last_error: tokio::sync::Mutex<Option<MarketDataError>>,
}

pub struct SnapshotCache {
    source: Arc<dyn OptionChainSource>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Per-currency slots collapsing concurrent misses into one fetch
    refresh_slots: Mutex<HashMap<String, Arc<RefreshSlot>>>,
    metrics: CacheMetrics,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn OptionChainSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: RwLock::new(HashMap::new()),
            refresh_slots: Mutex::new(HashMap::new()),
            metrics: CacheMetrics::new("options"),
        }
    }

    pub fn with_default_ttl(source: Arc<dyn OptionChainSource>) -> Self {
        Self::new(source, DEFAULT_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn fresh(&self, key: &str) -> Option<Arc<Snapshot>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() > self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.snapshot))
    }

    fn refresh_slot(&self, key: &str) -> Arc<RefreshSlot> {
        let mut slots = self.refresh_slots.lock();
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    /// Snapshot for `currency`, fetched and parsed on a miss or after expiry.
    ///
    /// An empty upstream result is cached like any other. An upstream error is
    /// returned to the caller and the existing entry, if any, is kept.
    /// Callers that queued behind a failing fetch get its error without
    /// fetching again.
    pub async fn get(&self, currency: &str) -> Result<Arc<Snapshot>> {
        let key = currency.to_uppercase();

        if let Some(snapshot) = self.fresh(&key) {
            self.metrics.hit();
            debug!(currency = %key, "Snapshot cache hit");
            return Ok(snapshot);
        }

        let slot = self.refresh_slot(&key);
        let seen = slot.attempts.load(Ordering::SeqCst);
        let mut last_error = slot.last_error.lock().await;

        // Another request may have refreshed while we waited
        if let Some(snapshot) = self.fresh(&key) {
            self.metrics.hit();
            debug!(currency = %key, "Snapshot refreshed by concurrent request");
            return Ok(snapshot);
        }
        if slot.attempts.load(Ordering::SeqCst) != seen {
            if let Some(e) = last_error.as_ref() {
                debug!(currency = %key, "Sharing failure of concurrent refresh");
                return Err(e.clone());
            }
        }

        self.metrics.miss();
        let started = Instant::now();

        let result = self.source.fetch_book_summary(&key).await;
        slot.attempts.fetch_add(1, Ordering::SeqCst);
        let rows = match result {
            Ok(rows) => {
                *last_error = None;
                rows
            }
            Err(e) => {
                self.metrics.refresh_failed();
                warn!(currency = %key, error = %e, "Snapshot refresh failed");
                *last_error = Some(e.clone());
                return Err(e);
            }
        };

        let snapshot = Arc::new(parse_snapshot(&key, &rows, Utc::now()));
        self.entries.write().insert(
            key.clone(),
            CacheEntry {
                snapshot: Arc::clone(&snapshot),
                fetched_at: Instant::now(),
            },
        );

        info!(
            currency = %key,
            contracts = snapshot.len(),
            dropped = snapshot.dropped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Snapshot cache refreshed"
        );

        Ok(snapshot)
    }

    /// Cached snapshot regardless of age, without touching upstream
    pub fn peek(&self, currency: &str) -> Option<Arc<Snapshot>> {
        self.entries
            .read()
            .get(&currency.to_uppercase())
            .map(|e| Arc::clone(&e.snapshot))
    }

    /// Drop the entry for `currency`; the next `get` refetches.
    pub fn invalidate(&self, currency: &str) -> bool {
        self.entries.write().remove(&currency.to_uppercase()).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
