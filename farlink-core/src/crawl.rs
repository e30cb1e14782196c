use crate::sink::FileSink;
use farlink_scanner::{
    Crawler, DEFAULT_TIMEOUT_SECS, EventCallback, LinkSink, PageOutcome, ScanError,
    TraversalEvent, TraversalOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Which output the user asked for, before a file name is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChoice {
    /// Print the visited set once the crawl is over
    Terminal,
    /// Stream each page's links to a file while crawling
    File,
}

impl OutputChoice {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "t" | "terminal" => Some(OutputChoice::Terminal),
            "f" | "file" => Some(OutputChoice::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Terminal,
    File(PathBuf),
}

impl OutputMode {
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            OutputMode::Terminal => None,
            OutputMode::File(path) => Some(path),
        }
    }
}

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub start_url: String,
    pub depth: i64,
    pub output_mode: OutputMode,
    pub workers: usize,
    pub timeout_secs: u64,
    pub show_progress: bool,
}

impl CrawlOptions {
    pub fn new(start_url: impl Into<String>, depth: i64, output_mode: OutputMode) -> Self {
        Self {
            start_url: start_url.into(),
            depth,
            output_mode,
            workers: 1,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_progress: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Turns a traversal event into the line shown to the user, if any.
pub fn describe_event(event: &TraversalEvent, output_file: Option<&Path>) -> Option<String> {
    match event {
        TraversalEvent::DepthZero { start } => Some(format!(
            "Depth is 0, returning only the start URL: {}",
            start
        )),
        TraversalEvent::Visiting { url, .. } => Some(format!("Processing: {}", url)),
        TraversalEvent::FetchFailed { url, outcome } => match outcome {
            PageOutcome::Timeout => Some(format!("[!] Timed out requesting {}. Skipping.", url)),
            PageOutcome::Failed(detail) => {
                Some(format!("[!] Request to {} failed: {}", url, detail))
            }
            PageOutcome::Fetched => None,
        },
        TraversalEvent::LinksDiscovered { .. } => None,
        TraversalEvent::SinkWritten { existed, .. } => {
            let target = output_file
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "output".to_string());
            if *existed {
                Some(format!(
                    "File {} exists. New results will be appended.",
                    target
                ))
            } else {
                Some(format!("Creating new file: {}", target))
            }
        }
        TraversalEvent::Cancelled { rounds } => {
            Some(format!("[!] Crawl cancelled after {} rounds", rounds))
        }
        TraversalEvent::Finished { .. } => None,
    }
}

/// Execute a crawl with the given options
/// Returns the traversal outcome
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    cancel_token: CancellationToken,
) -> Result<TraversalOutcome, ScanError> {
    let CrawlOptions {
        start_url,
        depth,
        output_mode,
        workers,
        timeout_secs,
        show_progress,
    } = options;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let output_file = output_mode.file_path().map(Path::to_path_buf);
    let pb_clone = progress_bar.clone();
    let event_callback: EventCallback = Arc::new(move |event: TraversalEvent| {
        if let Some(ref pb) = pb_clone
            && let TraversalEvent::Visiting { round, ref url } = event
        {
            pb.set_message(format!("Round {}: {}", round, url));
        }

        let Some(message) = describe_event(&event, output_file.as_deref()) else {
            return;
        };
        if let Some(ref callback) = progress_callback {
            match pb_clone {
                Some(ref pb) => pb.suspend(|| callback(message)),
                None => callback(message),
            }
        }
    });

    let crawler = Crawler::with_timeout(timeout_secs)?
        .with_workers(workers)
        .with_event_callback(event_callback);

    let mut file_sink = output_mode.file_path().map(FileSink::new);
    if let Some(ref sink) = file_sink {
        info!("Discovered links will be appended to {}", sink.path().display());
    }
    let sink = file_sink.as_mut().map(|s| s as &mut dyn LinkSink);

    let result = crawler.run(&start_url, depth, sink, cancel_token).await;

    if let Some(ref pb) = progress_bar {
        match result {
            Ok(ref outcome) => pb.finish_with_message(format!(
                "Crawl complete! {} URLs visited in {} rounds",
                outcome.visited.len(),
                outcome.rounds
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    result
}
