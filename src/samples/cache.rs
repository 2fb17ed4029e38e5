//! Time-bounded sample cache
//!
//! Entries are evicted lazily on `get` once they reach the TTL, and a
//! background sweeper can additionally purge stale entries every TTL.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::SampleSet;
use crate::locator::ProblemLocator;

type CacheKey = (String, String);

#[derive(Debug, Clone)]
struct CacheEntry {
    samples: SampleSet,
    fetched_at: Instant,
}

/// Sample sets keyed by `ProblemLocator::cache_key`
#[derive(Debug)]
pub struct SampleCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl SampleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a fresh entry; a stale one is removed and reported as a miss
    pub fn get(&self, locator: &ProblemLocator) -> Option<SampleSet> {
        let key = locator.cache_key();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(&key) {
                Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                    return Some(entry.samples.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Re-check: a concurrent put may have refreshed the entry
        if let Some(entry) = entries.get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                return Some(entry.samples.clone());
            }
            debug!("Evicting stale samples for {}/{}", key.0, key.1);
            entries.remove(&key);
        }
        None
    }

    /// Store a complete sample set, replacing any previous entry and resetting its age
    pub fn put(&self, locator: &ProblemLocator, samples: SampleSet) {
        let entry = CacheEntry {
            samples,
            fetched_at: Instant::now(),
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(locator.cache_key(), entry);
    }

    /// Remove every entry older than the TTL, returning how many were removed
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        before - entries.len()
    }


    /// Run `sweep` every TTL until the handle is aborted
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + self.ttl, self.ttl);
            loop {
                interval.tick().await;
                let removed = self.sweep();
                if removed > 0 {
                    info!("Swept {} stale sample set(s) from cache", removed);
                }
            }
        })
    }
}

#[cfg(test)]
impl SampleCache {
    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
