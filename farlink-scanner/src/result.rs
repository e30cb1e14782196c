use crate::fetch::PageResult;
use crate::link::Link;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PageOutcome {
    Fetched,
    Timeout,
    Failed(String),
}

impl PageOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, PageOutcome::Fetched)
    }
}

impl From<&PageResult> for PageOutcome {
    fn from(result: &PageResult) -> Self {
        match result {
            PageResult::Ok(_) => PageOutcome::Fetched,
            PageResult::Timeout => PageOutcome::Timeout,
            PageResult::RequestFailed(detail) => PageOutcome::Failed(detail.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub url: Link,
    pub round: usize,
    pub outcome: PageOutcome,
    /// External links found on the page, sorted.
    pub links_found: Vec<Link>,
    pub response_time: Duration,
}

impl PageReport {
    pub fn new(url: Link, round: usize, outcome: PageOutcome) -> Self {
        Self {
            url,
            round,
            outcome,
            links_found: Vec::new(),
            response_time: Duration::from_secs(0),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TraversalOutcome {
    pub visited: HashSet<Link>,
    pub pages: Vec<PageReport>,
    pub rounds: usize,
    pub cancelled: bool,
}

impl TraversalOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|page| !page.outcome.is_fetched())
    }

    pub fn total_links(&self) -> usize {
        self.pages.iter().map(|page| page.links_found.len()).sum()
    }
}
