use colored::Colorize;
use farlink::commands::command_argument_builder;
use farlink::handlers::{CrawlArgs, handle_crawl, init_tracing};
use farlink_core::print_banner;

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    let quiet = chosen_command.get_flag("quiet");
    init_tracing(chosen_command.get_count("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("crawl", sub_matches)) => handle_crawl(CrawlArgs::from_matches(sub_matches), quiet).await,
        // No subcommand: ask for everything, like the interactive tool always did
        None => handle_crawl(CrawlArgs::default(), quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
