//! The crawl frontier: the run's scheduling queue and dedup ledger
//!
//! Every URL the crawl has ever accepted is recorded here with its current
//! [`UrlState`]. The ledger only grows during a run, which is what makes
//! `try_enqueue` the single point that guarantees at-most-once visits.

use crate::state::page_state::UrlState;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// How a request entered the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOrigin {
    /// Configured seed URL
    Seed,
    /// Found in a sitemap during seed discovery
    Sitemap,
    /// Extracted from a crawled page
    Discovered,
}

impl fmt::Display for RequestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Seed => "seed",
            Self::Sitemap => "sitemap",
            Self::Discovered => "discovered",
        };
        f.write_str(label)
    }
}

/// A URL accepted into the frontier, consumed exactly once by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Canonical URL (the dedup key)
    pub url: Url,

    /// Discovery hops from a seed
    pub depth: u32,

    /// How the URL was found
    pub origin: RequestOrigin,
}

/// Snapshot of the frontier's set sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    pub queued: usize,
    pub in_flight: usize,
    pub visited: usize,
}

impl FrontierCounts {
    /// Every URL the frontier has ever accepted
    pub fn known(&self) -> usize {
        self.queued + self.in_flight + self.visited
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    /// Queued requests in acceptance order
    queue: VecDeque<CrawlRequest>,

    /// Ledger of every accepted key and the set it is currently in
    ledger: HashMap<String, UrlState>,

    in_flight: usize,
    visited: usize,
}

/// Concurrency-safe frontier shared by the coordinator and its workers
///
/// Each operation takes the lock once, so concurrent callers observe the
/// three sets as a consistent whole.
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a URL to the queue unless it has been seen before in this run
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and is now queued
    /// * `false` - The URL was already queued, in flight or visited
    pub fn try_enqueue(&self, url: Url, depth: u32, origin: RequestOrigin) -> bool {
        let mut state = self.lock();

        if state.ledger.contains_key(url.as_str()) {
            return false;
        }

        state.ledger.insert(url.as_str().to_string(), UrlState::Queued);
        state.queue.push_back(CrawlRequest { url, depth, origin });
        true
    }

    /// Takes the next queued request and marks it in flight
    pub fn dequeue(&self) -> Option<CrawlRequest> {
        let mut state = self.lock();

        let request = state.queue.pop_front()?;
        state
            .ledger
            .insert(request.url.as_str().to_string(), UrlState::InFlight);
        state.in_flight += 1;
        Some(request)
    }

    /// Moves an in-flight URL to the visited set
    ///
    /// Called for successful and failed pages alike so that a failure is
    /// never retried within the same run.
    ///
    /// # Returns
    ///
    /// `false` if the URL was not in flight (nothing changed)
    pub fn mark_visited(&self, url: &Url) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;

        match state.ledger.get_mut(url.as_str()) {
            Some(entry @ UrlState::InFlight) => {
                *entry = UrlState::Visited;
                state.in_flight -= 1;
                state.visited += 1;
                true
            }
            _ => false,
        }
    }

    /// Records a URL reached by redirect as visited
    ///
    /// # Returns
    ///
    /// * `true` - The URL was unknown and is now visited
    /// * `false` - The URL was already queued, in flight or visited; its
    ///   content belongs to that entry
    pub fn claim_visited(&self, url: &Url) -> bool {
        let mut state = self.lock();

        if state.ledger.contains_key(url.as_str()) {
            return false;
        }

        state.ledger.insert(url.as_str().to_string(), UrlState::Visited);
        state.visited += 1;
        true
    }

    /// True when nothing is queued and nothing is in flight
    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.queue.is_empty() && state.in_flight == 0
    }

    /// True when no request is waiting for dispatch
    pub fn has_queued(&self) -> bool {
        !self.lock().queue.is_empty()
    }

    /// Returns the state of a URL, if the frontier has ever seen it
    pub fn state_of(&self, url: &Url) -> Option<UrlState> {
        self.lock().ledger.get(url.as_str()).copied()
    }

    /// Returns true if the URL has ever been accepted
    pub fn contains(&self, url: &Url) -> bool {
        self.lock().ledger.contains_key(url.as_str())
    }

    /// Returns the current set sizes
    pub fn counts(&self) -> FrontierCounts {
        let state = self.lock();
        FrontierCounts {
            queued: state.queue.len(),
            in_flight: state.in_flight,
            visited: state.visited,
        }
    }

    /// Returns every visited URL, sorted
    pub fn visited_urls(&self) -> Vec<String> {
        let state = self.lock();
        let mut urls: Vec<String> = state
            .ledger
            .iter()
            .filter(|(_, s)| s.is_terminal())
            .map(|(u, _)| u.clone())
            .collect();
        urls.sort();
        urls
    }
}
