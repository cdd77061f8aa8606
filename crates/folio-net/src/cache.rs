//! Page Cache
//!
//! Caches fetched page bodies in a storage area, keyed by absolute URL,
//! with a fixed time-to-live. Bodies and their timestamps live under two
//! parallel key prefixes:
//!
//! - `<prefix>:<url>` holds the HTML body
//! - `<prefix>-ts:<url>` holds the store time in epoch milliseconds
//!
//! Caching only saves a round-trip; every failure path degrades to "not
//! cached" and never reaches the caller as an error.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::storage::{StorageArea, StorageError};

/// Cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Master switch
    pub enabled: bool,
    /// Key prefix for bodies; timestamps use `<prefix>-ts`
    pub prefix: String,
    /// Time to live in milliseconds
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "folio-page".to_string(),
            ttl_ms: 3_600_000,
        }
    }
}

/// What happened to a cache write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    /// Written on the first attempt
    Stored,
    /// Written after evicting every cached page
    StoredAfterEviction,
    /// Not written; the page simply will not be cached
    Skipped,
}

/// TTL-bounded page cache
pub struct PageCache {
    storage: Box<dyn StorageArea>,
    clock: Box<dyn Clock>,
    config: CacheConfig,
}

impl PageCache {
    pub fn new(storage: Box<dyn StorageArea>, clock: Box<dyn Clock>, config: CacheConfig) -> Self {
        Self { storage, clock, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn body_key(&self, url: &str) -> String {
        format!("{}:{}", self.config.prefix, url)
    }

    fn ts_key(&self, url: &str) -> String {
        format!("{}-ts:{}", self.config.prefix, url)
    }

    /// Get a fresh body, evicting it if expired or corrupt
    pub fn get(&mut self, url: &str) -> Option<String> {
        if !self.config.enabled {
            return None;
        }

        match self.lookup(url) {
            Ok(Lookup::Fresh(body)) => {
                tracing::debug!("Page cache hit: {}", url);
                Some(body)
            }
            Ok(Lookup::Missing) => None,
            Ok(Lookup::Stale) => {
                tracing::debug!("Page cache entry expired or corrupt: {}", url);
                self.evict(url);
                None
            }
            Err(e) => {
                tracing::warn!("Page cache read failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Check for a fresh entry without touching storage
    pub fn contains(&self, url: &str) -> bool {
        self.config.enabled && matches!(self.lookup(url), Ok(Lookup::Fresh(_)))
    }

    fn lookup(&self, url: &str) -> Result<Lookup, StorageError> {
        let body = self.storage.get_item(&self.body_key(url))?;
        let stamp = self.storage.get_item(&self.ts_key(url))?;

        Ok(match (body, stamp) {
            (None, None) => Lookup::Missing,
            (Some(body), Some(stamp)) => match stamp.trim().parse::<u64>() {
                Ok(stored_at) if self.is_fresh(stored_at) => Lookup::Fresh(body),
                _ => Lookup::Stale,
            },
            // Half an entry is as good as none
            _ => Lookup::Stale,
        })
    }

    fn is_fresh(&self, stored_at: u64) -> bool {
        self.clock.now_ms().saturating_sub(stored_at) < self.config.ttl_ms
    }

    /// Best-effort write; on quota failure evict everything cached and retry once
    pub fn set(&mut self, url: &str, body: &str) -> CacheWrite {
        if !self.config.enabled {
            return CacheWrite::Skipped;
        }

        match self.write(url, body) {
            Ok(()) => CacheWrite::Stored,
            Err(StorageError::QuotaExceeded { .. }) => {
                let evicted = self.clear();
                tracing::debug!("Page cache full; evicted {} pages before retry", evicted);
                match self.write(url, body) {
                    Ok(()) => CacheWrite::StoredAfterEviction,
                    Err(e) => {
                        tracing::debug!("Page cache retry failed for {}: {}", url, e);
                        self.evict(url);
                        CacheWrite::Skipped
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Page cache write failed for {}: {}", url, e);
                CacheWrite::Skipped
            }
        }
    }

    fn write(&mut self, url: &str, body: &str) -> Result<(), StorageError> {
        let stamp = self.clock.now_ms().to_string();
        let body_key = self.body_key(url);
        let ts_key = self.ts_key(url);
        self.storage.set_item(&body_key, body)?;
        self.storage.set_item(&ts_key, &stamp)
    }

    /// Remove one entry
    pub fn evict(&mut self, url: &str) {
        let body_key = self.body_key(url);
        let ts_key = self.ts_key(url);
        for key in [body_key, ts_key] {
            if let Err(e) = self.storage.remove_item(&key) {
                tracing::debug!("Page cache evict failed for {}: {}", key, e);
            }
        }
    }

    fn cached_urls(&self) -> Vec<String> {
        let body_prefix = format!("{}:", self.config.prefix);
        let ts_prefix = format!("{}-ts:", self.config.prefix);
        let mut urls: Vec<String> = self.storage
            .keys()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|key| {
                key.strip_prefix(&body_prefix)
                    .or_else(|| key.strip_prefix(&ts_prefix))
                    .map(str::to_string)
            })
            .collect();
        urls.sort();
        urls.dedup();
        urls
    }

    /// Evict every entry under the cache prefixes; returns the number of pages
    pub fn clear(&mut self) -> usize {
        let urls = self.cached_urls();
        for url in &urls {
            self.evict(url);
        }
        urls.len()
    }

    /// Evict every expired or corrupt entry; returns the number evicted
    pub fn prune(&mut self) -> usize {
        let stale: Vec<String> = self.cached_urls()
            .into_iter()
            .filter(|url| matches!(self.lookup(url), Ok(Lookup::Stale)))
            .collect();
        for url in &stale {
            self.evict(url);
        }
        stale.len()
    }
}

enum Lookup {
    Missing,
    Stale,
    Fresh(String),
}
