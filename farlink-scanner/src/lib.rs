pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod html;
pub mod link;
pub mod result;
pub mod sink;

pub use crawler::{Crawler, EventCallback, TraversalEvent};
pub use error::ScanError;
pub use extract::extract_external_links;
pub use fetch::{DEFAULT_TIMEOUT_SECS, Fetcher, HttpFetcher, PageResult};
pub use link::Link;
pub use result::{PageOutcome, PageReport, TraversalOutcome};
pub use sink::{LinkSink, MemorySink, SinkWrite};
