//! Concurrent vocabulary matching for a batch of n-grams.
//!
//! Every n-gram is looked up independently. A failed lookup is logged and
//! reported as "no match" for that n-gram only; it never fails the batch.
//! Results are written by input index, so `results[i]` always belongs to
//! `items[i]` regardless of completion order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{DEFAULT_CANDIDATES, VocabularyMatch, VocabularySearch, classify};
use crate::config::VocabularyConfig;
use crate::error::SearchResult;
use crate::tally::NgramFrequency;

/// Default cap on concurrent requests to the search service.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Bounded retry with exponential backoff for transient search failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure (0 disables retrying).
    pub retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Matches phrases against a [`VocabularySearch`] backend.
#[derive(Debug)]
pub struct VocabularyMatcher<S> {
    search: Arc<S>,
    candidates: usize,
    max_in_flight: usize,
    retry: RetryPolicy,
}

impl<S> Clone for VocabularyMatcher<S> {
    fn clone(&self) -> Self {
        Self {
            search: Arc::clone(&self.search),
            candidates: self.candidates,
            max_in_flight: self.max_in_flight,
            retry: self.retry,
        }
    }
}

impl<S> VocabularyMatcher<S>
where
    S: VocabularySearch + Send + Sync + 'static,
{
    /// Create a matcher with default limits.
    pub fn new(search: S) -> Self {
        Self {
            search: Arc::new(search),
            candidates: DEFAULT_CANDIDATES,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            retry: RetryPolicy::default(),
        }
    }

    /// Create a matcher using the limits in `config`.
    pub fn from_config(search: S, config: &VocabularyConfig) -> Self {
        Self::new(search)
            .with_candidates(config.candidates)
            .with_max_in_flight(config.max_in_flight)
            .with_retry(RetryPolicy {
                retries: config.retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
            })
    }

    /// Set how many ranked candidates are inspected per phrase.
    pub fn with_candidates(mut self, candidates: usize) -> Self {
        self.candidates = candidates.max(1);
        self
    }

    /// Set the cap on concurrent lookups.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Set the retry policy for transient failures.
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Look up one phrase. Any search failure yields `None`.
    pub async fn match_one(&self, phrase: &str) -> Option<VocabularyMatch> {
        lookup(&*self.search, phrase, self.candidates, self.retry).await
    }

    /// Look up every item concurrently, returning results in input order.
    ///
    /// `on_progress` is called once per finished lookup.
    #[tracing::instrument(skip_all, fields(items = items.len(), max_in_flight = self.max_in_flight))]
    pub async fn match_batch<F>(
        &self,
        items: &[NgramFrequency],
        mut on_progress: F,
    ) -> Vec<Option<VocabularyMatch>>
    where
        F: FnMut(),
    {
        let mut slots: Vec<Option<VocabularyMatch>> = vec![None; items.len()];
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();

        for (index, item) in items.iter().enumerate() {
            let search = Arc::clone(&self.search);
            let permits = Arc::clone(&permits);
            let phrase = item.ngram.clone();
            let (candidates, retry) = (self.candidates, self.retry);
            tasks.spawn(async move {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = permits.acquire_owned().await.ok();
                (index, lookup(&*search, &phrase, candidates, retry).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, found)) => slots[index] = found,
                Err(e) => tracing::warn!(error = %e, "vocabulary lookup task failed"),
            }
            on_progress();
        }

        let matched = slots.iter().filter(|s| s.is_some()).count();
        tracing::info!(matched, unmatched = items.len() - matched, "batch matched");
        slots
    }
}

async fn lookup<S: VocabularySearch>(
    search: &S,
    phrase: &str,
    candidates: usize,
    retry: RetryPolicy,
) -> Option<VocabularyMatch> {
    match search_with_retry(search, phrase, candidates, retry).await {
        Ok(found) => classify(phrase, &found),
        Err(e) => {
            tracing::warn!(phrase, error = %e, "vocabulary search failed, treating as no match");
            None
        }
    }
}

async fn search_with_retry<S: VocabularySearch>(
    search: &S,
    phrase: &str,
    candidates: usize,
    retry: RetryPolicy,
) -> SearchResult<Vec<super::VocabularyEntry>> {
    let mut attempt = 0;
    loop {
        match search.search(phrase, candidates).await {
            Err(e) if e.is_transient() && attempt < retry.retries => {
                let delay = retry.delay(attempt);
                tracing::debug!(phrase, attempt, ?delay, error = %e, "retrying vocabulary search");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
