//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier from configured seeds and discovered sitemaps
//! - Dispatching frontier requests to page pipelines under the governor
//! - Routing discovered links back into the frontier
//! - Handling interrupts and the final flush

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::governor::{Governor, PageSignal};
use crate::crawler::pipeline::{process, PageOutput, PipelineOptions};
use crate::crawler::seeds::{discover_seeds, SeedDiscovery};
use crate::output::{CrawlStatistics, ExtractionRecord, FailureRecord, ResultSink};
use crate::render::{HttpRenderer, NavigationError, Renderer};
use crate::robots::{is_allowed, ParsedRobots};
use crate::state::{CrawlRequest, Frontier, RequestOrigin};
use crate::url::{accept, normalize_url, LinkFilter, Rejection};
use crate::SitewalkError;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The frontier drained with no work in flight
    Completed,
    /// `max-pages` pages were dispatched while work was still queued
    LimitReached,
    /// A termination signal arrived; in-flight pages were abandoned
    Interrupted,
}

impl CrawlOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed | Self::LimitReached => 0,
            Self::Interrupted => 130,
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Completed => "completed",
            Self::LimitReached => "page limit reached",
            Self::Interrupted => "interrupted",
        };
        f.write_str(label)
    }
}

/// State shared by the coordinator and every worker task
struct CrawlContext {
    config: CrawlerConfig,
    filter: LinkFilter,
    frontier: Arc<Frontier>,
    sink: Arc<ResultSink>,
    renderer: Arc<dyn Renderer>,
    robots: Option<ParsedRobots>,
    user_agent: String,
    options: PipelineOptions,
}

/// What a finished page contributed to the results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    Record,
    Failure,
    /// Redirected onto a URL the frontier already owns
    Duplicate,
}

/// What a worker reports back when its page is done
struct PageReport {
    signal: PageSignal,
    kind: PageKind,
    timed_out: bool,
    enqueued: u64,
}

impl PageReport {
    fn failed() -> Self {
        Self {
            signal: PageSignal::Strained,
            kind: PageKind::Failure,
            timed_out: false,
            enqueued: 0,
        }
    }
}

/// Where a page ended up after redirects
enum Landing {
    /// The requested URL, or a new in-scope URL now claimed as visited
    Accepted,
    /// An in-scope URL the frontier already knows
    Duplicate(url::Url),
    /// Outside the scope or the path/extension rules
    Rejected(Rejection),
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: CrawlerConfig,
    filter: LinkFilter,
    frontier: Arc<Frontier>,
    sink: Arc<ResultSink>,
    renderer: Arc<dyn Renderer>,
    robots: Option<ParsedRobots>,
    user_agent: String,
    governor: Governor,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `renderer` - Backend that renders pages
    /// * `sink` - Where records, failures and links are collected
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SitewalkError)` - The crawl scope could not be parsed
    pub fn new(
        config: &Config,
        renderer: Arc<dyn Renderer>,
        sink: Arc<ResultSink>,
    ) -> Result<Self, SitewalkError> {
        let filter = LinkFilter::from_config(&config.crawler)?;
        let (min, max) = config.crawler.concurrency_bounds();

        Ok(Self {
            config: config.crawler.clone(),
            filter,
            frontier: Arc::new(Frontier::new()),
            sink,
            renderer,
            robots: None,
            user_agent: config.user_agent.header_value(),
            governor: Governor::new(min, max),
        })
    }

    /// The run's frontier
    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    /// The run's result sink
    pub fn sink(&self) -> &Arc<ResultSink> {
        &self.sink
    }

    /// Fills the frontier before the run starts
    ///
    /// Configured seeds are always enqueued first, at depth 0. Sitemap URLs
    /// follow, also at depth 0, after passing the link filter and (when
    /// enabled) robots.txt.
    ///
    /// # Returns
    ///
    /// The number of URLs that entered the frontier
    pub fn seed(&mut self, discovery: SeedDiscovery) -> usize {
        if self.config.respect_robots_txt {
            self.robots = discovery.robots;
        }

        let mut enqueued = 0;

        for seed in &self.config.seed_urls {
            match normalize_url(seed, self.filter.strip_query()) {
                Ok(url) => {
                    if self.frontier.try_enqueue(url, 0, RequestOrigin::Seed) {
                        enqueued += 1;
                    }
                }
                Err(e) => warn!("Skipping seed {}: {}", seed, e),
            }
        }

        for url in discovery.urls {
            let raw = url.to_string();
            match self.filter.check(url) {
                Ok(url) if !self.robots_allow(&url) => {
                    debug!("Sitemap URL {} disallowed by robots.txt", url);
                }
                Ok(url) => {
                    if self.frontier.try_enqueue(url, 0, RequestOrigin::Sitemap) {
                        enqueued += 1;
                    }
                }
                Err(rejection) => debug!("Skipping sitemap URL {}: {}", raw, rejection),
            }
        }

        info!("Frontier seeded with {} URLs", enqueued);
        enqueued
    }

    fn robots_allow(&self, url: &url::Url) -> bool {
        self.robots
            .as_ref()
            .map_or(true, |robots| is_allowed(robots, url, &self.user_agent))
    }

    /// Runs the main crawl loop
    ///
    /// The loop ends when the frontier is empty and no page is in flight,
    /// when the page limit is reached, or when `shutdown` turns true. The
    /// sink is flushed on every one of those paths before returning.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<CrawlStatistics, SitewalkError> {
        let started = Instant::now();

        let mut stats = self.crawl_loop(&mut shutdown).await;
        stats.elapsed = started.elapsed();
        stats.links_discovered = self.sink.link_count() as u64;
        stats.left_in_queue = self.frontier.counts().queued as u64;

        if stats.outcome == CrawlOutcome::Interrupted {
            info!("Interrupted! Saving collected results...");
        }
        self.sink.flush()?;

        info!(
            "Crawl {}: {} pages visited in {:?}",
            stats.outcome, stats.pages_visited, stats.elapsed
        );

        Ok(stats)
    }

    async fn crawl_loop(&mut self, shutdown: &mut watch::Receiver<bool>) -> CrawlStatistics {
        let context = Arc::new(CrawlContext {
            config: self.config.clone(),
            filter: self.filter.clone(),
            frontier: Arc::clone(&self.frontier),
            sink: Arc::clone(&self.sink),
            renderer: Arc::clone(&self.renderer),
            robots: self.robots.clone(),
            user_agent: self.user_agent.clone(),
            options: PipelineOptions {
                navigation_timeout: self.config.navigation_timeout(),
                stability_timeout: self.config.per_request_timeout(),
                min_paragraph_length: self.config.min_paragraph_length,
            },
        });

        let (min, max) = self.governor.bounds();
        info!(
            "Starting crawl of {} with {}-{} workers",
            self.filter.scope().origin(),
            min,
            max
        );

        let page_limit = self.config.page_limit();
        let mut stats = CrawlStatistics::new(CrawlOutcome::Completed);
        let mut workers: JoinSet<PageReport> = JoinSet::new();
        let mut dispatched: u64 = 0;
        let mut signals_open = true;
        let start_time = Instant::now();

        let outcome = loop {
            if *shutdown.borrow() {
                break CrawlOutcome::Interrupted;
            }

            while page_limit.map_or(true, |limit| dispatched < limit) {
                let Some(permit) = self.governor.try_acquire() else {
                    break;
                };
                let Some(request) = self.frontier.dequeue() else {
                    break;
                };

                dispatched += 1;
                let context = Arc::clone(&context);
                workers.spawn(async move {
                    let _permit = permit;
                    supervise(context, request).await
                });
            }

            if workers.is_empty() {
                break if self.frontier.has_queued() {
                    CrawlOutcome::LimitReached
                } else {
                    CrawlOutcome::Completed
                };
            }

            tokio::select! {
                biased;

                changed = shutdown.changed(), if signals_open => {
                    if changed.is_err() {
                        // Sender gone: nobody can interrupt this run any more
                        signals_open = false;
                    }
                }

                Some(joined) = workers.join_next() => {
                    match joined {
                        Ok(report) => self.absorb(report, &mut stats),
                        Err(e) => error!("Worker task failed: {}", e),
                    }

                    if stats.pages_visited > 0 && stats.pages_visited % 10 == 0 {
                        let counts = self.frontier.counts();
                        let rate = stats.pages_visited as f64 / start_time.elapsed().as_secs_f64();
                        info!(
                            "Progress: {} pages crawled, {} queued, {} in flight, {} workers, {:.2} pages/sec",
                            stats.pages_visited,
                            counts.queued,
                            counts.in_flight,
                            self.governor.target(),
                            rate
                        );
                    }
                }
            }
        };

        if outcome == CrawlOutcome::Interrupted {
            self.sink.seal();
            warn!("Abandoning {} in-flight pages", workers.len());
            workers.abort_all();
            while workers.join_next().await.is_some() {}
        }

        stats.outcome = outcome;
        stats
    }

    fn absorb(&mut self, report: PageReport, stats: &mut CrawlStatistics) {
        stats.pages_visited += 1;
        match report.kind {
            PageKind::Record => stats.records += 1,
            PageKind::Failure => stats.failures += 1,
            PageKind::Duplicate => stats.redirect_duplicates += 1,
        }
        if report.timed_out {
            stats.stability_timeouts += 1;
        }
        stats.links_enqueued += report.enqueued;

        self.governor
            .observe(report.signal, self.frontier.has_queued());
    }
}

/// Runs one page in its own task so that a panic is isolated to that page
async fn supervise(context: Arc<CrawlContext>, request: CrawlRequest) -> PageReport {
    let mut worker = AbortOnDrop(tokio::spawn(crawl_page(
        Arc::clone(&context),
        request.clone(),
    )));

    match (&mut worker.0).await {
        Ok(report) => report,
        Err(e) => {
            error!("Page task for {} panicked: {}", request.url, e);
            context
                .sink
                .record_failure(FailureRecord::new(&request, format!("worker panicked: {}", e)));
            context.frontier.mark_visited(&request.url);
            PageReport::failed()
        }
    }
}

async fn crawl_page(context: Arc<CrawlContext>, request: CrawlRequest) -> PageReport {
    let counts = context.frontier.counts();
    info!(
        "Crawling {} [depth {}, {} visited / {} known]",
        request.url,
        request.depth,
        counts.visited,
        counts.known()
    );

    let report = match process(context.renderer.as_ref(), &request, &context.options).await {
        Ok(page) => match context.landing(&request, &page.final_url) {
            Landing::Accepted => context.emit(&request, page),
            Landing::Duplicate(canonical) => {
                debug!(
                    "{} redirected to already known {}; no record",
                    request.url, canonical
                );
                PageReport {
                    signal: PageSignal::Healthy,
                    kind: PageKind::Duplicate,
                    timed_out: false,
                    enqueued: 0,
                }
            }
            Landing::Rejected(rejection) => {
                let e = SitewalkError::Navigation {
                    url: request.url.to_string(),
                    source: NavigationError::OutOfScope(page.final_url.to_string()),
                };
                error!("Failed to crawl {}: {} ({})", request.url, e, rejection);
                context.sink.record_failure(FailureRecord::new(&request, &e));
                PageReport::failed()
            }
        },
        Err(e) => {
            error!("Failed to crawl {}: {}", request.url, e);
            context.sink.record_failure(FailureRecord::new(&request, &e));
            PageReport::failed()
        }
    };

    context.frontier.mark_visited(&request.url);
    report
}

impl CrawlContext {
    /// Checks the post-redirect URL against the filter and the frontier
    ///
    /// A redirect onto a new in-scope URL claims that URL, so it is never
    /// fetched again under its own key.
    fn landing(&self, request: &CrawlRequest, final_url: &url::Url) -> Landing {
        match self.filter.check(final_url.clone()) {
            Err(rejection) => Landing::Rejected(rejection),
            Ok(canonical) if canonical == request.url => Landing::Accepted,
            Ok(canonical) if self.frontier.claim_visited(&canonical) => Landing::Accepted,
            Ok(canonical) => Landing::Duplicate(canonical),
        }
    }

    /// Routes a page's links and hands its record to the sink
    fn emit(&self, request: &CrawlRequest, page: PageOutput) -> PageReport {
        let (discovered, enqueued) = self.route_links(request, &page);
        let timed_out = page.stability.timed_out();

        self.sink.add_links(discovered.iter().cloned());
        self.sink.push(ExtractionRecord::new(
            request,
            &page.final_url,
            page.content,
            discovered,
            page.stability,
        ));

        PageReport {
            signal: if timed_out {
                PageSignal::Strained
            } else {
                PageSignal::Healthy
            },
            kind: PageKind::Record,
            timed_out,
            enqueued,
        }
    }

    /// Filters a page's links and enqueues those below the depth ceiling
    ///
    /// Returns the sorted accepted links and how many of them were new to
    /// the frontier.
    fn route_links(&self, request: &CrawlRequest, page: &PageOutput) -> (Vec<String>, u64) {
        let follow = request.depth < self.config.max_depth;
        let mut discovered = BTreeSet::new();
        let mut enqueued = 0;

        for raw in &page.links {
            let url = match accept(raw, &page.final_url, &self.filter) {
                Ok(url) => url,
                Err(rejection) => {
                    debug!("Rejected link {}: {}", raw, rejection);
                    continue;
                }
            };

            if let Some(robots) = &self.robots {
                if !is_allowed(robots, &url, &self.user_agent) {
                    debug!("Link {} disallowed by robots.txt", url);
                    continue;
                }
            }

            discovered.insert(url.to_string());
            if follow
                && self
                    .frontier
                    .try_enqueue(url, request.depth + 1, RequestOrigin::Discovered)
            {
                enqueued += 1;
            }
        }

        (discovered.into_iter().collect(), enqueued)
    }
}

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client
/// 2. Discover seeds from sitemaps and robots.txt
/// 3. Crawl the scope breadth-first within the depth ceiling with the
///    static [`HttpRenderer`]
/// 4. Flush results, also when interrupted
///
/// `shutdown` is honoured from the start, including during seed discovery.
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `shutdown` - Turns true when the run should stop early
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl finished or was interrupted; results were flushed
/// * `Err(SitewalkError)` - Crawl could not start or results could not be written
pub async fn run_crawl(
    config: Config,
    mut shutdown: watch::Receiver<bool>,
) -> Result<CrawlStatistics, SitewalkError> {
    let started = Instant::now();
    let client = build_http_client(&config.user_agent, config.crawler.navigation_timeout())?;
    let sink = Arc::new(ResultSink::from_config(&config.output));

    let discovery = tokio::select! {
        discovery = discover_seeds(&config.crawler, &client) => discovery?,
        _ = shutdown_requested(&mut shutdown) => {
            warn!("Interrupted during seed discovery");
            sink.seal();
            sink.flush()?;
            let mut stats = CrawlStatistics::new(CrawlOutcome::Interrupted);
            stats.elapsed = started.elapsed();
            return Ok(stats);
        }
    };

    let renderer: Arc<dyn Renderer> = Arc::new(HttpRenderer::new(client));
    let mut coordinator = Coordinator::new(&config, renderer, sink)?;
    coordinator.seed(discovery);
    coordinator.run(shutdown).await
}

/// Resolves once `shutdown` reads true; never resolves if the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
