use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use farlink_core::crawl::{
    CrawlOptions, CrawlProgressCallback, OutputChoice, OutputMode, execute_crawl,
};
use farlink_core::report::{ReportFormat, render_report};
use farlink_scanner::DEFAULT_TIMEOUT_SECS;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug};
use url::Url;

/// Crawl settings as given on the command line. Anything left as `None` is
/// asked for interactively.
#[derive(Debug, Clone)]
pub struct CrawlArgs {
    pub url: Option<String>,
    pub depth: Option<i64>,
    pub choice: Option<OutputChoice>,
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
    pub threads: usize,
    pub timeout_secs: u64,
}

impl Default for CrawlArgs {
    fn default() -> Self {
        Self {
            url: None,
            depth: None,
            choice: None,
            output: None,
            format: ReportFormat::Text,
            threads: 1,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CrawlArgs {
    pub fn from_matches(sub_matches: &ArgMatches) -> Self {
        let format = sub_matches
            .get_one::<String>("format")
            .and_then(|f| ReportFormat::parse(f))
            .unwrap_or(ReportFormat::Text);

        Self {
            url: sub_matches
                .get_one::<Url>("url")
                .map(|u| u.as_str().to_string()),
            depth: sub_matches.get_one::<i64>("depth").copied(),
            choice: sub_matches
                .get_one::<String>("mode")
                .and_then(|m| OutputChoice::parse(m)),
            output: sub_matches.get_one::<PathBuf>("output").cloned(),
            format,
            threads: *sub_matches.get_one::<usize>("threads").unwrap_or(&1),
            timeout_secs: *sub_matches
                .get_one::<u64>("timeout")
                .unwrap_or(&DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Maps the `-v` count to a log level. Warnings are always shown.
pub fn verbosity_level(count: u8) -> Level {
    match count {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_tracing(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_max_level(verbosity_level(verbosity))
        .with_writer(io::stderr)
        .init();
}

/// Print `msg` and read one trimmed line of input.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, msg: &str) -> io::Result<String> {
    write!(output, "{} ", msg.bright_cyan().bold())?;
    output.flush()?;

    let mut response = String::new();
    if input.read_line(&mut response)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }
    Ok(response.trim().to_string())
}

pub fn parse_depth(s: &str) -> Result<i64, String> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| format!("Depth must be a whole number, got '{}'", s.trim()))
}

/// Fill the gaps in `args` by prompting, and build the crawl options.
pub fn resolve_crawl_options<R: BufRead, W: Write>(
    args: CrawlArgs,
    input: &mut R,
    output: &mut W,
) -> Result<(CrawlOptions, ReportFormat)> {
    let start_url = match args.url {
        Some(url) => url,
        None => prompt(input, output, "Enter URL to parse:")?,
    };
    if start_url.is_empty() {
        bail!("No start URL given");
    }

    let depth = match args.depth {
        Some(depth) => depth,
        None => {
            let answer = prompt(input, output, "Enter depth (0 - only the start link):")?;
            parse_depth(&answer).map_err(|e| anyhow!(e))?
        }
    };

    let choice = match (args.choice, args.output.is_some()) {
        (Some(OutputChoice::Terminal), true) => {
            bail!("An output file cannot be used with terminal mode (-m T)")
        }
        (Some(choice), _) => choice,
        (None, true) => OutputChoice::File,
        (None, false) => {
            let answer = prompt(input, output, "Print to terminal (T) or save to file (F)?")?;
            OutputChoice::parse(&answer)
                .ok_or_else(|| anyhow!("Expected T or F, got '{}'", answer))?
        }
    };

    let output_mode = match choice {
        OutputChoice::Terminal => OutputMode::Terminal,
        OutputChoice::File => {
            let raw = match args.output {
                Some(path) => path.to_string_lossy().into_owned(),
                None => prompt(input, output, "Enter a file name to save results:")?,
            };
            if raw.is_empty() {
                bail!("No output file given");
            }
            OutputMode::File(PathBuf::from(shellexpand::tilde(&raw).as_ref()))
        }
    };

    let mut options = CrawlOptions::new(start_url, depth, output_mode);
    options.workers = args.threads;
    options.timeout_secs = args.timeout_secs;

    Ok((options, args.format))
}

fn print_message(msg: &str) {
    if let Some(rest) = msg.strip_prefix("[!] ") {
        println!("{} {}", "⚠".yellow().bold(), rest.yellow());
    } else {
        println!("{} {}", "→".blue(), msg);
    }
}

pub async fn handle_crawl(args: CrawlArgs, quiet: bool) -> Result<()> {
    let (mut options, format) = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut stdout = io::stdout();
        resolve_crawl_options(args, &mut input, &mut stdout)?
    };
    options.show_progress = !quiet;
    debug!("Crawl options: {:?}", options);

    let output_mode = options.output_mode.clone();

    if !quiet {
        println!("\n🕷️  Crawling {}", options.start_url.bright_white());
        println!("Depth: {}", options.depth);
        println!("Workers: {}", options.workers);
        match output_mode {
            OutputMode::Terminal => println!("Output: terminal\n"),
            OutputMode::File(ref path) => println!("Output: {}\n", path.display()),
        }
    }

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| print_message(&msg)))
    };

    let outcome = execute_crawl(options, progress_callback, cancel_token)
        .await
        .context("Crawl failed")?;

    match output_mode {
        OutputMode::Terminal => {
            let report = render_report(&outcome, format)?;
            print!("\n{}", report);
        }
        OutputMode::File(ref path) => {
            if !quiet {
                println!(
                    "\n{} Crawl complete! {} URLs visited, links saved to {}",
                    "✓".green().bold(),
                    outcome.visited.len(),
                    path.display().to_string().bright_white()
                );
            }
        }
    }

    Ok(())
}
