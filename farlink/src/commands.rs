use clap::{arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("farlink")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("farlink")
        .about("Follows a page's links to other sites, round by round. Run without a subcommand to be prompted for everything.")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .required(false)
                .action(clap::ArgAction::Count)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Fetch the start page, collect links that lead to other hosts and keep \
                following them for DEPTH rounds. Missing options are prompted for.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The URL to start from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Number of fetch rounds (0 = only report the start URL)")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true),
                )
                .arg(
                    arg!(-m --"mode" <MODE>)
                        .required(false)
                        .help("T = print visited links when done, F = append discovered links to a file")
                        .value_parser(["t", "f", "terminal", "file"])
                        .ignore_case(true),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("File to append discovered links to (implies --mode F, not allowed with --mode T)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Terminal report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("How many pending URLs to fetch concurrently in one round")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5"),
                ),
        )
}
