//! Cache-first sample fetching
//!
//! Concurrent fetches for the same problem collapse into one scraping
//! session: the first caller scrapes while the others wait on a per-problem
//! lock and then read the freshly cached result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{SampleCache, SampleScraper, SampleSet};
use crate::common::SampleError;
use crate::locator::ProblemLocator;

type FlightKey = (String, String);
type FlightLock = Arc<tokio::sync::Mutex<()>>;

/// Per-problem lock plus the number of callers currently holding a ticket for it
struct Flight {
    lock: FlightLock,
    holders: usize,
}

/// Fetches sample sets, consulting and populating the cache it owns
pub struct SampleFetcher {
    cache: Arc<SampleCache>,
    scraper: Arc<dyn SampleScraper>,
    navigation_timeout: Duration,
    in_flight: Mutex<HashMap<FlightKey, Flight>>,
}

impl SampleFetcher {
    pub fn new(
        cache: Arc<SampleCache>,
        scraper: Arc<dyn SampleScraper>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            scraper,
            navigation_timeout,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get the sample tests for `locator`, scraping at most once per TTL window
    pub async fn fetch(&self, locator: &ProblemLocator) -> Result<SampleSet, SampleError> {
        if let Some(samples) = self.cache.get(locator) {
            debug!(
                "Cache hit for {}/{}",
                locator.contest_id, locator.problem_letter
            );
            return Ok(samples);
        }

        let ticket = self.join_flight(locator);
        let _guard = ticket.lock.lock().await;

        // Another caller may have finished the scrape while we waited
        if let Some(samples) = self.cache.get(locator) {
            debug!("Joined in-flight fetch for {}", locator.canonical_url);
            return Ok(samples);
        }
        self.scrape(locator).await
    }

    async fn scrape(&self, locator: &ProblemLocator) -> Result<SampleSet, SampleError> {
        let url = &locator.canonical_url;
        let samples = tokio::time::timeout(
            self.navigation_timeout,
            self.scraper.fetch_sample_pairs(url),
        )
        .await
        .map_err(|_| {
            SampleError::Scrape(format!(
                "fetching {} exceeded {}ms",
                url,
                self.navigation_timeout.as_millis()
            ))
        })?
        .inspect_err(|e| warn!("Sample fetch failed for {}: {}", url, e))?;

        if samples.is_empty() {
            return Err(SampleError::NoSamplesFound(url.clone()));
        }

        self.cache.put(locator, samples.clone());
        info!(
            "Cached {} sample test(s) for {}/{}",
            samples.len(),
            locator.contest_id,
            locator.problem_letter
        );
        Ok(samples)
    }

    fn join_flight(&self, locator: &ProblemLocator) -> FlightTicket<'_> {
        let key = locator.cache_key();
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        let flight = in_flight.entry(key.clone()).or_insert_with(|| Flight {
            lock: Arc::new(tokio::sync::Mutex::new(())),
            holders: 0,
        });
        flight.holders += 1;
        let lock = flight.lock.clone();
        FlightTicket {
            in_flight: &self.in_flight,
            key,
            lock,
        }
    }
}

/// A caller's stake in a per-problem flight lock
///
/// Dropping the last ticket for a key removes its map entry, whether the
/// fetch finished or was cancelled mid-wait.
struct FlightTicket<'a> {
    in_flight: &'a Mutex<HashMap<FlightKey, Flight>>,
    key: FlightKey,
    lock: FlightLock,
}

impl Drop for FlightTicket<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(flight) = in_flight.get_mut(&self.key) {
            flight.holders -= 1;
            if flight.holders == 0 {
                in_flight.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(2 * 60 * 60);

    /// Scraper returning a canned set and counting sessions
    struct CannedScraper {
        calls: AtomicUsize,
        delay: Duration,
        empty: bool,
    }

    impl CannedScraper {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                empty: false,
            }
        }
    }

    #[async_trait]
    impl SampleScraper for CannedScraper {
        async fn fetch_sample_pairs(&self, url: &str) -> Result<SampleSet, SampleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.empty {
                return SampleSet::new(vec![], vec![], url);
            }
            SampleSet::new(vec!["1 2\n".into()], vec!["3\n".into()], url)
        }
    }

    /// Scraper whose single sample is the URL it was asked for
    struct EchoScraper;

    #[async_trait]
    impl SampleScraper for EchoScraper {
        async fn fetch_sample_pairs(&self, url: &str) -> Result<SampleSet, SampleError> {
            SampleSet::new(vec![format!("{}\n", url)], vec!["ok\n".into()], url)
        }
    }

    fn locator() -> ProblemLocator {
        ProblemLocator {
            contest_id: "1".into(),
            problem_letter: "A".into(),
            canonical_url: "https://codeforces.com/contest/1/problem/A".into(),
        }
    }

    fn fetcher(scraper: Arc<CannedScraper>, timeout: Duration) -> SampleFetcher {
        SampleFetcher::new(Arc::new(SampleCache::new(TTL)), scraper, timeout)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_is_idempotent_within_ttl() {
        let scraper = Arc::new(CannedScraper::new(Duration::from_millis(10)));
        let fetcher = fetcher(scraper.clone(), Duration::from_secs(30));

        let first = fetcher.fetch(&locator()).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        let second = fetcher.fetch(&locator()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(scraper.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_fetches_scrape_once() {
        let scraper = Arc::new(CannedScraper::new(Duration::from_secs(2)));
        let fetcher = Arc::new(fetcher(scraper.clone(), Duration::from_secs(30)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let fetcher = fetcher.clone();
                tokio::spawn(async move { fetcher.fetch(&locator()).await })
            })
            .collect();

        for handle in handles {
            let samples = handle.await.unwrap().unwrap();
            assert_eq!(samples.joined_output(), "3\n");
        }
        assert_eq!(scraper.calls.load(Ordering::SeqCst), 1);
        assert!(fetcher.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_after_ttl() {
        let scraper = Arc::new(CannedScraper::new(Duration::ZERO));
        let fetcher = fetcher(scraper.clone(), Duration::from_secs(30));

        fetcher.fetch(&locator()).await.unwrap();
        tokio::time::advance(TTL).await;
        fetcher.fetch(&locator()).await.unwrap();

        assert_eq!(scraper.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_deadline() {
        let scraper = Arc::new(CannedScraper::new(Duration::from_secs(60)));
        let fetcher = fetcher(scraper, Duration::from_secs(5));

        let err = fetcher.fetch(&locator()).await.unwrap_err();
        assert!(matches!(err, SampleError::Scrape(_)));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let scraper = Arc::new(CannedScraper {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            empty: true,
        });
        let fetcher = fetcher(scraper.clone(), Duration::from_secs(30));

        let err = fetcher.fetch(&locator()).await.unwrap_err();
        assert!(matches!(err, SampleError::NoSamplesFound(_)));
        assert!(fetcher.fetch(&locator()).await.is_err());
        assert_eq!(scraper.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_problemset_urls_with_same_letter_are_distinct() {
        let fetcher = SampleFetcher::new(
            Arc::new(SampleCache::new(TTL)),
            Arc::new(EchoScraper),
            Duration::from_secs(30),
        );
        let four = crate::locator::extract_locator(
            "https://codeforces.com/problemset/problem/4/A",
            "codeforces.com",
        )
        .unwrap();
        let five = crate::locator::extract_locator(
            "https://codeforces.com/problemset/problem/5/A",
            "codeforces.com",
        )
        .unwrap();

        let first = fetcher.fetch(&four).await.unwrap();
        let second = fetcher.fetch(&five).await.unwrap();

        assert_eq!(
            first.joined_input(),
            "https://codeforces.com/problemset/problem/4/A\n"
        );
        assert_eq!(
            second.joined_input(),
            "https://codeforces.com/problemset/problem/5/A\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_fetch_releases_flight_entry() {
        let scraper = Arc::new(CannedScraper::new(Duration::from_secs(10)));
        let fetcher = Arc::new(fetcher(scraper.clone(), Duration::from_secs(30)));

        let leader = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch(&locator()).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.in_flight.lock().unwrap().len(), 1);

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());
        assert!(fetcher.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_leaves_leader_intact() {
        let scraper = Arc::new(CannedScraper::new(Duration::from_secs(2)));
        let fetcher = Arc::new(fetcher(scraper.clone(), Duration::from_secs(30)));

        let spawn_fetch = || {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch(&locator()).await })
        };
        let leader = spawn_fetch();
        let waiter = spawn_fetch();
        tokio::time::sleep(Duration::from_millis(100)).await;

        waiter.abort();
        let _ = waiter.await;
        leader.await.unwrap().unwrap();

        assert_eq!(scraper.calls.load(Ordering::SeqCst), 1);
        assert!(fetcher.in_flight.lock().unwrap().is_empty());
    }
}
