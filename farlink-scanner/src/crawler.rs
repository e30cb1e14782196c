use crate::error::{Result, ScanError};
use crate::extract::extract_external_links;
use crate::fetch::{DEFAULT_TIMEOUT_SECS, Fetcher, HttpFetcher, PageResult};
use crate::frontier::Frontier;
use crate::html::anchor_hrefs;
use crate::link::Link;
use crate::result::{PageOutcome, PageReport, TraversalOutcome};
use crate::sink::LinkSink;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Things the crawler reports while it runs. Purely informational.
#[derive(Debug, Clone, PartialEq)]
pub enum TraversalEvent {
    /// Depth was 0, nothing is fetched.
    DepthZero { start: Link },
    Visiting { round: usize, url: Link },
    FetchFailed { url: Link, outcome: PageOutcome },
    LinksDiscovered { url: Link, found: usize, queued: usize },
    /// A page's links went to the sink. `existed` tells whether the sink's
    /// target already held data.
    SinkWritten { url: Link, existed: bool, written: usize },
    Cancelled { rounds: usize },
    Finished { visited: usize, rounds: usize },
}

pub type EventCallback = Arc<dyn Fn(TraversalEvent) + Send + Sync>;

/// Depth-bounded traversal over external links.
///
/// Each round takes up to `workers` URLs off the frontier, fetches them
/// concurrently, and merges the external links they contain back into the
/// frontier. With one worker (the default) a round is exactly one fetch.
/// Links found in a round are never fetched before the next round.
pub struct Crawler<F = HttpFetcher> {
    fetcher: F,
    workers: usize,
    event_callback: Option<EventCallback>,
}

impl Crawler<HttpFetcher> {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let fetcher = HttpFetcher::new(Duration::from_secs(timeout_secs))?;
        Ok(Self::with_fetcher(fetcher))
    }
}

impl<F: Fetcher> Crawler<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            workers: 1,
            event_callback: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs a traversal and returns every URL a fetch was attempted for.
    ///
    /// Fetch failures never surface here; they are reported through events
    /// and logs. Errors are limited to bad arguments, which are checked
    /// before any request, and failures of the sink itself.
    pub async fn traverse(
        &self,
        start_url: &str,
        depth: i64,
        sink: Option<&mut dyn LinkSink>,
    ) -> Result<HashSet<Link>> {
        let outcome = self
            .run(start_url, depth, sink, CancellationToken::new())
            .await?;
        Ok(outcome.visited)
    }

    pub async fn traverse_with_cancellation(
        &self,
        start_url: &str,
        depth: i64,
        sink: Option<&mut dyn LinkSink>,
        cancel_token: CancellationToken,
    ) -> Result<HashSet<Link>> {
        let outcome = self.run(start_url, depth, sink, cancel_token).await?;
        Ok(outcome.visited)
    }

    /// Like [`traverse`](Self::traverse) but returns the per-page reports too.
    pub async fn run(
        &self,
        start_url: &str,
        depth: i64,
        mut sink: Option<&mut dyn LinkSink>,
        cancel_token: CancellationToken,
    ) -> Result<TraversalOutcome> {
        let depth = validate_depth(depth)?;
        if self.workers == 0 {
            return Err(ScanError::InvalidArgument(
                "worker count must be at least 1".to_string(),
            ));
        }
        let start = Link::parse(start_url)?;

        let mut outcome = TraversalOutcome::default();

        if depth == 0 {
            info!("Depth is 0, returning only the start URL {}", start);
            self.emit(TraversalEvent::DepthZero {
                start: start.clone(),
            });
            outcome.visited.insert(start);
            return Ok(outcome);
        }

        info!(
            "Starting traversal of {} (depth {}, {} workers)",
            start, depth, self.workers
        );

        let mut frontier = Frontier::new(start);

        while frontier.has_pending() && outcome.rounds < depth {
            if cancel_token.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let round = outcome.rounds + 1;
            let batch = self.next_batch(&mut frontier);
            if batch.is_empty() {
                break;
            }

            for url in &batch {
                info!("[Round {}] Visiting {}", round, url);
                self.emit(TraversalEvent::Visiting {
                    round,
                    url: url.clone(),
                });
            }

            let fetches = join_all(batch.iter().map(|url| self.fetch_page(url, round)));
            let reports = tokio::select! {
                _ = cancel_token.cancelled() => {
                    outcome.cancelled = true;
                    break;
                }
                reports = fetches => reports,
            };

            for report in reports {
                let queued = frontier.merge(report.links_found.iter());

                if report.outcome.is_fetched() {
                    debug!(
                        "{}: {} external links, {} new",
                        report.url,
                        report.links_found.len(),
                        queued
                    );
                    self.emit(TraversalEvent::LinksDiscovered {
                        url: report.url.clone(),
                        found: report.links_found.len(),
                        queued,
                    });

                    if let Some(sink) = sink.as_deref_mut() {
                        let write = sink.write_batch(&report.links_found)?;
                        self.emit(TraversalEvent::SinkWritten {
                            url: report.url.clone(),
                            existed: write.existed,
                            written: write.written,
                        });
                    }
                } else {
                    self.emit(TraversalEvent::FetchFailed {
                        url: report.url.clone(),
                        outcome: report.outcome.clone(),
                    });
                }

                outcome.pages.push(report);
            }

            outcome.rounds = round;
        }

        if outcome.cancelled {
            warn!("Traversal cancelled after {} rounds", outcome.rounds);
            self.emit(TraversalEvent::Cancelled {
                rounds: outcome.rounds,
            });
        }

        outcome.visited = frontier.into_visited();
        info!(
            "Traversal complete. Visited {} URLs in {} rounds",
            outcome.visited.len(),
            outcome.rounds
        );
        self.emit(TraversalEvent::Finished {
            visited: outcome.visited.len(),
            rounds: outcome.rounds,
        });

        Ok(outcome)
    }

    /// Takes up to `workers` unvisited links off the frontier and records
    /// them as visited. Already visited links are dropped without using up
    /// a slot.
    fn next_batch(&self, frontier: &mut Frontier) -> Vec<Link> {
        let mut batch = Vec::with_capacity(self.workers);
        while batch.len() < self.workers {
            let Some(url) = frontier.pop() else {
                break;
            };
            if frontier.is_visited(&url) {
                debug!("Skipping already visited {}", url);
                continue;
            }
            frontier.mark_visited(url.clone());
            batch.push(url);
        }
        batch
    }

    async fn fetch_page(&self, url: &Link, round: usize) -> PageReport {
        let started = Instant::now();
        let result = self.fetcher.fetch(url).await;

        let mut report = PageReport::new(url.clone(), round, PageOutcome::from(&result));
        report.response_time = started.elapsed();

        match result {
            PageResult::Ok(body) => {
                let mut links: Vec<Link> = extract_external_links(url, anchor_hrefs(&body))
                    .into_iter()
                    .collect();
                links.sort();
                report.links_found = links;
            }
            PageResult::Timeout => warn!("Timed out fetching {}, skipping", url),
            PageResult::RequestFailed(detail) => warn!("Request to {} failed: {}", url, detail),
        }

        report
    }

    fn emit(&self, event: TraversalEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}

fn validate_depth(depth: i64) -> Result<usize> {
    usize::try_from(depth).map_err(|_| {
        ScanError::InvalidArgument(format!("depth must be 0 or greater, got {}", depth))
    })
}
