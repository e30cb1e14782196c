pub mod commands;
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{CrawlArgs, handle_crawl, parse_depth, prompt, resolve_crawl_options};

// Re-export crawl functionality from farlink-core
pub use farlink_core::crawl::{CrawlOptions, OutputChoice, OutputMode};
pub use farlink_core::report::ReportFormat;
