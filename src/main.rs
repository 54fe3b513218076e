// src/main.rs
// =============================================================================
// This is the entry point of the pathcrawl CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr only; stdout is for results)
// 3. Gather targets from the arguments and --infile (piped stdin if neither)
// 4. Run the crawl while a printer task writes results as they arrive
// 5. Exit with proper code (0 = success, 2 = error)
// =============================================================================

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{BufRead, IsTerminal, Write};
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use cli::Cli;
use pathcrawl::{CrawlResult, Crawler};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.silence)?;

    let mut targets = cli.targets.clone();
    if let Some(path) = &cli.infile {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        targets.extend(read_targets(std::io::BufReader::new(file))?);
    }
    if should_read_stdin(&targets, std::io::stdin().is_terminal()) {
        let piped = tokio::task::spawn_blocking(|| read_targets(std::io::stdin().lock())).await??;
        targets.extend(piped);
    }
    if targets.is_empty() {
        bail!("no targets given (pass hosts/URLs, --infile, or pipe them on stdin)");
    }

    let json = cli.json;
    let (crawler, results) = Crawler::new(cli.into_options())?;

    let printer = tokio::spawn(print_results(results, json));
    let summary = crawler.run(&targets).await;
    printer.await??;

    tracing::info!(
        "Done: {} URLs fetched from {} seeds",
        summary.fetched,
        summary.seeds
    );
    Ok(0)
}

// Maps -v/-vv/--silence onto a max level; errors are always shown otherwise
fn init_logging(verbose: u8, silence: bool) -> Result<()> {
    let level = if silence {
        LevelFilter::OFF
    } else {
        match verbose {
            0 => LevelFilter::ERROR,
            1 => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

// stdin is only a fallback: an open but silent pipe (cron, CI) would block
// forever, so it is never read when targets came from elsewhere
fn should_read_stdin(targets: &[String], stdin_is_terminal: bool) -> bool {
    targets.is_empty() && !stdin_is_terminal
}

// One target per line; blank lines and #comments are skipped
fn read_targets(reader: impl BufRead) -> Result<Vec<String>> {
    let mut targets = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            targets.push(line.to_string());
        }
    }
    Ok(targets)
}

// Prints results as they arrive until the crawl closes the channel
async fn print_results(mut results: mpsc::UnboundedReceiver<CrawlResult>, json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    while let Some(result) = results.recv().await {
        let mut out = stdout.lock();
        if json {
            writeln!(out, "{}", serde_json::to_string(&result)?)?;
        } else {
            writeln!(out, "{}", format_line(&result))?;
        }
    }
    Ok(())
}

fn format_line(result: &CrawlResult) -> String {
    match &result.error {
        Some(e) => format!("{} {} [{}]", result.status, result.url, e),
        None => format!("{} {}", result.status, result.url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_targets_skips_blanks_and_comments() {
        let input = "example.com\n\n# staging\n  https://example.org/start  \n";
        let targets = read_targets(input.as_bytes()).unwrap();
        assert_eq!(targets, vec!["example.com", "https://example.org/start"]);
    }

    #[test]
    fn test_stdin_ignored_when_targets_given() {
        let given = vec!["example.com".to_string()];
        assert!(!should_read_stdin(&given, false));
        assert!(!should_read_stdin(&[], true));
        assert!(should_read_stdin(&[], false));
    }

    #[test]
    fn test_format_line() {
        let url = url::Url::parse("http://example.com/a").unwrap();
        assert_eq!(
            format_line(&CrawlResult::response(&url, 200)),
            "200 http://example.com/a"
        );
    }
}
