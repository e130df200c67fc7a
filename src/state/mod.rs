//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: where a URL sits in the frontier (queued, in flight, visited)
//! - `CrawlRequest`: a URL accepted for crawling, with its depth and origin
//! - `Frontier`: the shared queue and dedup ledger for one crawl run

mod frontier;
mod page_state;

pub use frontier::{CrawlRequest, Frontier, FrontierCounts, RequestOrigin};
pub use page_state::UrlState;
