//! Crawl statistics
//!
//! This module collects the per-run counters reported when a crawl ends.

use crate::crawler::CrawlOutcome;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// How the run ended
    pub outcome: CrawlOutcome,

    /// Pages whose pipeline finished, successfully or not
    pub pages_visited: u64,

    /// Records emitted
    pub records: u64,

    /// Pages that failed
    pub failures: u64,

    /// Pages that redirected onto a URL already owned by the frontier
    pub redirect_duplicates: u64,

    /// Records extracted before their page settled
    pub stability_timeouts: u64,

    /// Distinct accepted links seen during the run
    pub links_discovered: u64,

    /// Links that entered the frontier
    pub links_enqueued: u64,

    /// Requests still queued when the run ended
    pub left_in_queue: u64,

    /// Wall-clock duration of the crawl loop
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Creates an empty statistics block
    pub fn new(outcome: CrawlOutcome) -> Self {
        Self {
            outcome,
            pages_visited: 0,
            records: 0,
            failures: 0,
            redirect_duplicates: 0,
            stability_timeouts: 0,
            links_discovered: 0,
            links_enqueued: 0,
            left_in_queue: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Share of visited pages that produced a record, in percent
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        (self.records as f64 / self.pages_visited as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Outcome: {}", stats.outcome);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    println!("  Pages visited: {}", stats.pages_visited);
    println!("  Links discovered: {}", stats.links_discovered);
    println!("  Links enqueued: {}", stats.links_enqueued);
    if stats.left_in_queue > 0 {
        println!("  Left in queue: {}", stats.left_in_queue);
    }
    println!();

    println!("Results:");
    println!("  Records: {}", stats.records);
    println!("  Failures: {}", stats.failures);
    println!("  Stability timeouts: {}", stats.stability_timeouts);
    if stats.redirect_duplicates > 0 {
        println!("  Redirect duplicates: {}", stats.redirect_duplicates);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        stats.success_rate(),
        stats.records,
        stats.pages_visited
    );
}
