// Tests for the frontier traversal engine, driven by an in-memory fetcher

use async_trait::async_trait;
use farlink_scanner::{
    Crawler, EventCallback, Fetcher, Link, LinkSink, MemorySink, PageOutcome, PageResult,
    ScanError, SinkWrite, TraversalEvent,
};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct StaticFetcher {
    pages: HashMap<String, PageResult>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, url: &str, hrefs: &[&str]) -> Self {
        let mut html = String::from("<html><body>");
        for href in hrefs {
            html.push_str(&format!(r#"<a href="{}">link</a>"#, href));
        }
        html.push_str("</body></html>");
        self.pages.insert(url.to_string(), PageResult::Ok(html));
        self
    }

    fn result(mut self, url: &str, result: PageResult) -> Self {
        self.pages.insert(url.to_string(), result);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &Link) -> PageResult {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| PageResult::RequestFailed("HTTP 404 Not Found".to_string()))
    }
}

/// Never answers for URLs in `stalled`.
struct StallingFetcher {
    inner: StaticFetcher,
    stalled: Vec<String>,
}

#[async_trait]
impl Fetcher for StallingFetcher {
    async fn fetch(&self, url: &Link) -> PageResult {
        if self.stalled.iter().any(|s| s == url.as_str()) {
            std::future::pending::<()>().await;
        }
        self.inner.fetch(url).await
    }
}

struct BrokenSink;

impl LinkSink for BrokenSink {
    fn write_batch(&mut self, _links: &[Link]) -> io::Result<SinkWrite> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
}

fn recorder() -> (EventCallback, Arc<Mutex<Vec<TraversalEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let callback: EventCallback = Arc::new(move |event| {
        events_clone.lock().unwrap().push(event);
    });
    (callback, events)
}

fn link(s: &str) -> Link {
    Link::parse(s).unwrap()
}

fn sorted(visited: &std::collections::HashSet<Link>) -> Vec<String> {
    let mut out: Vec<String> = visited.iter().map(|l| l.to_string()).collect();
    out.sort();
    out
}

const A: &str = "https://a.example/";
const B: &str = "https://b.example/";
const C: &str = "https://c.example/";
const D: &str = "https://d.example/";
const E: &str = "https://e.example/";
const F: &str = "https://f.example/";

// ============================================================================
// Depth handling
// ============================================================================

#[tokio::test]
async fn test_depth_zero_returns_start_without_fetching() {
    let crawler = Crawler::with_fetcher(StaticFetcher::new().page(A, &[B]));
    let mut sink = MemorySink::new();

    let visited = crawler.traverse(A, 0, Some(&mut sink)).await.unwrap();

    assert_eq!(sorted(&visited), vec![A]);
    assert!(crawler.fetcher().calls().is_empty());
    assert!(sink.batches.is_empty());
}

#[tokio::test]
async fn test_negative_depth_fails_before_fetching() {
    let crawler = Crawler::with_fetcher(StaticFetcher::new().page(A, &[B]));

    let err = crawler.traverse(A, -3, None).await.unwrap_err();

    assert!(matches!(err, ScanError::InvalidArgument(_)));
    assert!(crawler.fetcher().calls().is_empty());
}

#[tokio::test]
async fn test_depth_bounds_number_of_fetches() {
    let fetcher = StaticFetcher::new()
        .page(A, &[B])
        .page(B, &[C])
        .page(C, &[D])
        .page(D, &[]);
    let crawler = Crawler::with_fetcher(fetcher);

    let visited = crawler.traverse(A, 2, None).await.unwrap();

    assert_eq!(sorted(&visited), vec![A, B]);
    assert_eq!(crawler.fetcher().calls(), vec![A, B]);
}

#[tokio::test]
async fn test_round_budget_with_wide_page() {
    let fetcher = StaticFetcher::new().page(A, &[B, C, D, E, F]);
    let crawler = Crawler::with_fetcher(fetcher);

    let outcome = crawler
        .run(A, 3, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 3);
    assert_eq!(outcome.visited.len(), 3);
    assert_eq!(crawler.fetcher().calls().len(), 3);
}

#[tokio::test]
async fn test_stops_when_frontier_empties() {
    let crawler = Crawler::with_fetcher(StaticFetcher::new().page(A, &[B]).page(B, &[]));

    let outcome = crawler
        .run(A, 10, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 2);
    assert_eq!(sorted(&outcome.visited), vec![A, B]);
}

// ============================================================================
// Order and deduplication
// ============================================================================

#[tokio::test]
async fn test_pending_links_are_fetched_in_discovery_order() {
    let fetcher = StaticFetcher::new()
        .page(A, &[C, B])
        .page(B, &[D])
        .page(C, &[])
        .page(D, &[]);
    let crawler = Crawler::with_fetcher(fetcher);

    crawler.traverse(A, 4, None).await.unwrap();

    // Links of one page are queued sorted, pages are drained first-in first-out.
    assert_eq!(crawler.fetcher().calls(), vec![A, B, C, D]);
}

#[tokio::test]
async fn test_back_links_are_not_fetched_twice() {
    let fetcher = StaticFetcher::new()
        .page(A, &[B, C])
        .page(B, &[A, C])
        .page(C, &[A, B]);
    let crawler = Crawler::with_fetcher(fetcher);

    let outcome = crawler
        .run(A, 10, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(crawler.fetcher().calls(), vec![A, B, C]);
    assert_eq!(outcome.rounds, 3);
    assert_eq!(outcome.visited.len(), 3);
}

#[tokio::test]
async fn test_same_host_links_never_enter_frontier() {
    let fetcher = StaticFetcher::new()
        .page(A, &["/about", "https://a.example/contact", B])
        .page(B, &["/b-local", "https://b.example/deep"]);
    let crawler = Crawler::with_fetcher(fetcher);

    let visited = crawler.traverse(A, 10, None).await.unwrap();

    assert_eq!(sorted(&visited), vec![A, B]);
    for call in crawler.fetcher().calls() {
        assert!(call == A || call == B, "unexpected fetch of {}", call);
    }
}

#[tokio::test]
async fn test_visited_is_bounded_by_rounds() {
    let fetcher = StaticFetcher::new()
        .page(A, &[B, C, D])
        .page(B, &[E, F])
        .page(C, &[A]);
    let crawler = Crawler::with_fetcher(fetcher);

    let outcome = crawler
        .run(A, 4, None, CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.visited.len() <= outcome.rounds + 1);
    let calls = crawler.fetcher().calls();
    for url in &outcome.visited {
        assert!(calls.contains(&url.to_string()));
    }
}

// ============================================================================
// Failure absorption
// ============================================================================

#[tokio::test]
async fn test_request_failure_on_second_page() {
    let fetcher = StaticFetcher::new()
        .page(A, &[B])
        .result(B, PageResult::RequestFailed("HTTP 500 Internal Server Error".to_string()));
    let (callback, events) = recorder();
    let crawler = Crawler::with_fetcher(fetcher).with_event_callback(callback);

    let visited = crawler.traverse(A, 2, None).await.unwrap();

    assert_eq!(sorted(&visited), vec![A, B]);
    let failures: Vec<_> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            TraversalEvent::FetchFailed { url, outcome } => Some((url.clone(), outcome.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        failures,
        vec![(
            link(B),
            PageOutcome::Failed("HTTP 500 Internal Server Error".to_string())
        )]
    );
}

#[tokio::test]
async fn test_timeout_counts_as_a_round() {
    let fetcher = StaticFetcher::new()
        .result(A, PageResult::Timeout)
        .page(B, &[]);
    let crawler = Crawler::with_fetcher(fetcher);

    let outcome = crawler
        .run(A, 5, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 1);
    assert_eq!(sorted(&outcome.visited), vec![A]);
    assert_eq!(outcome.pages[0].outcome, PageOutcome::Timeout);
    assert_eq!(outcome.failures().count(), 1);
}

#[tokio::test]
async fn test_failed_pages_do_not_touch_sink() {
    let fetcher = StaticFetcher::new()
        .page(A, &[B, C])
        .result(B, PageResult::Timeout)
        .page(C, &[D]);
    let crawler = Crawler::with_fetcher(fetcher);
    let mut sink = MemorySink::new();

    crawler.traverse(A, 3, Some(&mut sink)).await.unwrap();

    assert_eq!(sink.batches, vec![vec![link(B), link(C)], vec![link(D)]]);
}

#[tokio::test]
async fn test_sink_error_is_reported() {
    let crawler = Crawler::with_fetcher(StaticFetcher::new().page(A, &[B]));
    let mut sink = BrokenSink;

    let err = crawler.traverse(A, 1, Some(&mut sink)).await.unwrap_err();

    assert!(matches!(err, ScanError::IoError(_)));
}

// ============================================================================
// Sink reporting
// ============================================================================

#[tokio::test]
async fn test_sink_gets_full_set_not_only_unseen() {
    let fetcher = StaticFetcher::new()
        .page(A, &[B, C])
        .page(B, &[A, C, D]);
    let (callback, events) = recorder();
    let crawler = Crawler::with_fetcher(fetcher).with_event_callback(callback);
    let mut sink = MemorySink::new();

    crawler.traverse(A, 2, Some(&mut sink)).await.unwrap();

    assert_eq!(
        sink.batches,
        vec![
            vec![link(B), link(C)],
            vec![link(A), link(C), link(D)],
        ]
    );

    let existed: Vec<bool> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            TraversalEvent::SinkWritten { existed, .. } => Some(*existed),
            _ => None,
        })
        .collect();
    assert_eq!(existed, vec![false, true]);
}

// ============================================================================
// Workers and cancellation
// ============================================================================

#[tokio::test]
async fn test_workers_fetch_a_round_together() {
    let fetcher = StaticFetcher::new()
        .page(A, &[B, C, D])
        .page(B, &[E])
        .page(C, &[])
        .page(D, &[F]);
    let crawler = Crawler::with_fetcher(fetcher).with_workers(3);
    let mut sink = MemorySink::new();

    let outcome = crawler
        .run(A, 2, Some(&mut sink), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 2);
    assert_eq!(sorted(&outcome.visited), vec![A, B, C, D]);
    let rounds: Vec<usize> = outcome.pages.iter().map(|p| p.round).collect();
    assert_eq!(rounds, vec![1, 2, 2, 2]);

    // Links found in round 2 wait for round 3, which the budget does not allow.
    let calls = crawler.fetcher().calls();
    assert!(!calls.contains(&E.to_string()));
    assert!(!calls.contains(&F.to_string()));

    // One batch per page, in the order the pages were taken off the frontier.
    assert_eq!(
        sink.batches,
        vec![
            vec![link(B), link(C), link(D)],
            vec![link(E)],
            vec![],
            vec![link(F)],
        ]
    );
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let crawler = Crawler::with_fetcher(StaticFetcher::new().page(A, &[B]));
    let token = CancellationToken::new();
    token.cancel();

    let outcome = crawler.run(A, 3, None, token).await.unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.rounds, 0);
    assert!(outcome.visited.is_empty());
    assert!(crawler.fetcher().calls().is_empty());
}

#[tokio::test]
async fn test_cancellation_interrupts_in_flight_fetch() {
    let fetcher = StallingFetcher {
        inner: StaticFetcher::new().page(A, &[B]).page(C, &[]),
        stalled: vec![B.to_string()],
    };
    let crawler = Crawler::with_fetcher(fetcher);
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let visited = crawler
        .traverse_with_cancellation(A, 5, None, token)
        .await
        .unwrap();

    assert_eq!(sorted(&visited), vec![A, B]);
}
